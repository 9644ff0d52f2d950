use crate::jvm::model::{ClassNode, FieldNode, MethodNode};
use crate::jvm::{
    render_modifiers, AccessTarget, BinaryName, FieldType, MethodDescriptor, Name,
    ParseDescriptor, SourceName,
};
use crate::source::{resolve_labels, Error, SourceIndex, Surrogate, Token};
use crate::util::Width;

/// Render a class to text, indexing every identifier that refers to a class, field, or method
pub fn render_class(class: &ClassNode) -> Result<SourceIndex, Error> {
    log::debug!(
        "Rendering class {} ({} fields, {} methods)",
        class.name,
        class.fields.len(),
        class.methods.len()
    );

    let mut renderer = Renderer::new();
    renderer.package(&class.name);
    renderer.header(class)?;
    for field in &class.fields {
        renderer.field(&class.name, field)?;
    }
    renderer.text.push('\n');
    for method in &class.methods {
        renderer.method(&class.name, method)?;
    }
    renderer.text.push_str("}\n");

    SourceIndex::new(renderer.text, renderer.tokens)
}

/// Text buffer along with the tokens registered so far
///
/// Tokens are always registered over text that has just been pushed, so the write position is
/// the length of the buffer.
struct Renderer {
    text: String,
    tokens: Vec<Token>,
}

impl Renderer {
    fn new() -> Renderer {
        Renderer {
            text: String::new(),
            tokens: vec![],
        }
    }

    fn package(&mut self, name: &BinaryName) {
        if let Some(package) = name.package() {
            self.text.push_str("package ");
            self.text.push_str(&package);
            self.text.push_str(";\n\n");
        }
    }

    fn header(&mut self, class: &ClassNode) -> Result<(), Error> {
        self.modifiers(class.access_flags.bits(), AccessTarget::Class);
        self.text.push_str("class ");
        self.class_name(class.name.simple_name(), &class.name)?;

        if let Some(super_name) = class.super_name.as_ref().filter(|name| **name != BinaryName::OBJECT) {
            self.text.push_str(" extends ");
            self.class_name(&super_name.abbreviated(), super_name)?;
        }

        for (i, interface) in class.interfaces.iter().enumerate() {
            self.text.push_str(if i == 0 { " implements " } else { ", " });
            self.class_name(&interface.abbreviated(), interface)?;
        }

        self.text.push_str(" {");
        Ok(())
    }

    fn field(&mut self, owner: &BinaryName, field: &FieldNode) -> Result<(), Error> {
        let field_type = FieldType::<BinaryName>::parse(&field.descriptor)?;

        self.text.push_str("\n\t");
        self.modifiers(field.access_flags.bits(), AccessTarget::Field);
        self.field_type(&field_type.abbreviated_source_name(), &field_type)?;
        self.text.push(' ');
        self.declaration(owner, field.name.as_str(), &field.descriptor)?;
        self.text.push(';');
        Ok(())
    }

    fn method(&mut self, owner: &BinaryName, method: &MethodNode) -> Result<(), Error> {
        log::debug!("Rendering method {}{}", method.name, method.descriptor);
        let descriptor = MethodDescriptor::<BinaryName>::parse(&method.descriptor)?;

        self.text.push_str("\n\t");
        if !method.is_static_initializer() {
            self.modifiers(method.access_flags.bits(), AccessTarget::Method);
            match &descriptor.return_type {
                None => self.text.push_str("void"),
                Some(return_type) => self.field_type(&return_type.source_name(), return_type)?,
            }
            self.text.push(' ');

            // Constructors can't be renamed, so they don't get a token
            if method.is_constructor() {
                self.text.push_str(method.name.as_str());
            } else {
                self.declaration(owner, method.name.as_str(), &method.descriptor)?;
            }

            self.text.push('(');
            let mut local = if method.is_static() { 0 } else { 1 };
            for (i, parameter) in descriptor.parameters.iter().enumerate() {
                if i > 0 {
                    self.text.push(',');
                }
                self.field_type(&parameter.source_name(), parameter)?;
                self.text.push_str(" local");
                self.text.push_str(&local.to_string());
                local += parameter.width();
            }
            self.text.push(')');

            if method.is_abstract() {
                self.text.push_str(";\n");
                return Ok(());
            }
            self.text.push(' ');
        }

        self.body(method)
    }

    fn body(&mut self, method: &MethodNode) -> Result<(), Error> {
        let surrogates = method
            .instructions
            .iter()
            .enumerate()
            .filter(|(_, insn)| !insn.is_pseudo() || insn.label_id().is_some())
            .map(|(source, insn)| Surrogate::of(source, insn))
            .collect();
        let body = resolve_labels(surrogates)?;

        self.text.push_str("{\n");
        for surrogate in &body {
            if !surrogate.is_label() {
                self.text.push('\t');
            }
            self.instruction(|out, tokens, start| surrogate.write(out, tokens, start, &body))?;
            self.text.push('\n');
        }
        self.text.push_str("\t}\n");
        Ok(())
    }

    /// Write out one instruction, checking that it ends where it claims to
    fn instruction<W>(&mut self, write: W) -> Result<(), Error>
    where
        W: FnOnce(&mut String, &mut Vec<Token>, usize) -> Result<usize, Error>,
    {
        let start = self.text.len();
        let end = write(&mut self.text, &mut self.tokens, start)?;
        if end != self.text.len() {
            return Err(Error::CursorDrift {
                expected: end,
                actual: self.text.len(),
            });
        }
        Ok(())
    }

    /// Modifiers followed by a space, or nothing at all if there are none
    fn modifiers(&mut self, access: u16, target: AccessTarget) {
        let modifiers = render_modifiers(u32::from(access), target);
        if !modifiers.is_empty() {
            self.text.push_str(&modifiers);
            self.text.push(' ');
        }
    }

    /// Write out the spelling of a class, registering a token for it
    fn class_name(&mut self, shown: &str, class: &BinaryName) -> Result<(), Error> {
        let start = self.text.len();
        self.text.push_str(shown);
        self.tokens.push(Token::class(start, self.text.len(), class.as_str())?);
        Ok(())
    }

    /// Write out the spelling of a type, with a token over the class name (brackets excluded)
    fn field_type(&mut self, shown: &str, field_type: &FieldType<BinaryName>) -> Result<(), Error> {
        match field_type.element_class() {
            None => self.text.push_str(shown),
            Some(class) => {
                let brackets = 2 * field_type.dimensions();
                let class_end = shown.len().saturating_sub(brackets);
                self.class_name(&shown[..class_end], class)?;
                self.text.push_str(&shown[class_end..]);
            }
        }
        Ok(())
    }

    /// Write out the name of a field or method being declared, registering a token for it
    fn declaration(&mut self, owner: &BinaryName, name: &str, descriptor: &str) -> Result<(), Error> {
        let start = self.text.len();
        self.text.push_str(name);
        self.tokens.push(Token::member(start, self.text.len(), owner.as_str(), name, descriptor)?);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::model::{Insn, LabelId};
    use crate::jvm::opcodes::*;
    use crate::jvm::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags, UnqualifiedName};
    use crate::source::Entry;

    fn binary(name: &str) -> BinaryName {
        BinaryName::from_string(name.to_owned()).unwrap()
    }

    fn unqualified(name: &str) -> UnqualifiedName {
        UnqualifiedName::from_string(name.to_owned()).unwrap()
    }

    fn method(access: MethodAccessFlags, name: UnqualifiedName, descriptor: &str, body: Vec<Insn>) -> MethodNode {
        let mut method = MethodNode::new(access, name, descriptor);
        method.instructions = body;
        method
    }

    fn token_texts(index: &SourceIndex) -> Vec<&str> {
        index.tokens().map(|(token, _)| index.token_text(token)).collect()
    }

    #[test]
    fn declarations() {
        let mut class = ClassNode::new(
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            binary("a/B"),
            Some(BinaryName::OBJECT),
        );
        class.fields.push(FieldNode::new(
            FieldAccessFlags::PRIVATE | FieldAccessFlags::STATIC | FieldAccessFlags::FINAL,
            unqualified("NAMES"),
            "[Ljava/lang/String;",
        ));
        class.methods.push(method(
            MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
            unqualified("m"),
            "(JI[Ljava/lang/Object;)Ljava/util/List;",
            vec![Insn::zero(ACONST_NULL), Insn::zero(ARETURN)],
        ));

        let index = render_class(&class).unwrap();
        assert_eq!(
            index.text(),
            "package a;\n\npublic class B {\n\tprivate static final String[] NAMES;\n\n\tpublic static java.util.List m(long local0,int local2,java.lang.Object[] local3) {\n\tACONST_NULL\n\tARETURN\n\t}\n}\n"
        );
        assert_eq!(
            token_texts(&index),
            vec!["B", "String", "NAMES", "java.util.List", "m", "java.lang.Object"]
        );

        let entries: Vec<&Entry> = index.tokens().map(|(_, entry)| entry).collect();
        assert_eq!(entries[1], &Entry::Class(String::from("java/lang/String")));
        assert_eq!(
            entries[2],
            &Entry::Field {
                owner: String::from("a/B"),
                name: String::from("NAMES"),
                descriptor: String::from("[Ljava/lang/String;"),
            }
        );
        assert_eq!(
            entries[4],
            &Entry::Method {
                owner: String::from("a/B"),
                name: String::from("m"),
                descriptor: String::from("(JI[Ljava/lang/Object;)Ljava/util/List;"),
            }
        );
    }

    #[test]
    fn body_drops_pseudo_instructions() {
        let mut class = ClassNode::new(ClassAccessFlags::empty(), binary("B"), Some(BinaryName::OBJECT));
        class.methods.push(method(
            MethodAccessFlags::empty(),
            unqualified("run"),
            "(I)V",
            vec![
                Insn::label(LabelId(0)),
                Insn::line_number(10, LabelId(0)),
                Insn::label(LabelId(1)),
                Insn::var(ILOAD, 1),
                Insn::jump(IFEQ, LabelId(2)),
                Insn::iinc(1, 1),
                Insn::label(LabelId(2)),
                Insn::frame(),
                Insn::zero(RETURN),
            ],
        ));

        let index = render_class(&class).unwrap();
        assert_eq!(
            index.text(),
            "class B {\n\n\tvoid run(int local1) {\n\tILOAD 1\n\tIFEQ label0\n\tIINC 1 +1\nlabel0:\n\tRETURN\n\t}\n}\n"
        );
        assert_eq!(token_texts(&index), vec!["B", "run"]);
    }

    #[test]
    fn special_methods() {
        let mut class = ClassNode::new(ClassAccessFlags::empty(), binary("B"), Some(BinaryName::OBJECT));
        class.methods.push(method(
            MethodAccessFlags::STATIC,
            UnqualifiedName::CLINIT,
            "()V",
            vec![Insn::zero(RETURN)],
        ));
        class.methods.push(method(
            MethodAccessFlags::empty(),
            UnqualifiedName::INIT,
            "()V",
            vec![
                Insn::var(ALOAD, 0),
                Insn::method(INVOKESPECIAL, "java/lang/Object", "<init>", "()V"),
                Insn::zero(RETURN),
            ],
        ));
        class.methods.push(method(
            MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
            unqualified("get"),
            "()I",
            vec![],
        ));

        let index = render_class(&class).unwrap();
        assert_eq!(
            index.text(),
            "class B {\n\n\t{\n\tRETURN\n\t}\n\n\tvoid <init>() {\n\tALOAD 0\n\tINVOKESPECIAL java/lang/Object.<init> ()V\n\tRETURN\n\t}\n\n\tpublic abstract int get();\n}\n"
        );
        assert_eq!(token_texts(&index), vec!["B", "java/lang/Object", "get"]);
    }

    #[test]
    fn supertypes() {
        let mut class = ClassNode::new(ClassAccessFlags::empty(), binary("a/B"), Some(binary("java/lang/Thread")));
        class.interfaces.push(binary("java/lang/Runnable"));
        class.interfaces.push(binary("a/c/D"));

        let index = render_class(&class).unwrap();
        assert_eq!(
            index.text(),
            "package a;\n\nclass B extends Thread implements Runnable, a.c.D {\n}\n"
        );
        assert_eq!(token_texts(&index), vec!["B", "Thread", "Runnable", "a.c.D"]);
        assert_eq!(index.entry_at(28), Some(&Entry::Class(String::from("java/lang/Thread"))));
    }

    #[test]
    fn instruction_length_must_match() {
        let mut renderer = Renderer::new();
        renderer.text.push_str("\t");

        let surrogate = Surrogate::of(0, &Insn::zero(NOP));
        renderer
            .instruction(|out, tokens, start| surrogate.write(out, tokens, start, &[]))
            .unwrap();
        assert_eq!(renderer.text, "\tNOP");

        // Claims one more character than it writes
        let result = renderer.instruction(|out, _, start| {
            out.push_str("NOP");
            Ok(start + 4)
        });
        assert!(matches!(result, Err(Error::CursorDrift { expected: 8, actual: 7 })));
    }

    #[test]
    fn broken_classes() {
        let mut class = ClassNode::new(ClassAccessFlags::empty(), binary("B"), None);
        class.methods.push(method(
            MethodAccessFlags::empty(),
            unqualified("loop"),
            "()V",
            vec![Insn::jump(GOTO, LabelId(5))],
        ));
        assert!(matches!(
            render_class(&class),
            Err(Error::UnresolvedJumpTarget(LabelId(5)))
        ));

        let mut class = ClassNode::new(ClassAccessFlags::empty(), binary("B"), None);
        class.fields.push(FieldNode::new(FieldAccessFlags::empty(), unqualified("x"), "Q"));
        assert!(matches!(render_class(&class), Err(Error::Jvm(_))));
    }
}
