use crate::jvm::class_file::{decode_code, find_attribute, ClassFile, Code, ConstantIndex, ConstantPool, Deserialize, Member};
use crate::jvm::model::{ClassNode, FieldNode, MethodNode};
use crate::jvm::{
    BinaryName, ClassAccessFlags, ClassFormatError, Error, FieldAccessFlags, MethodAccessFlags, Name, UnqualifiedName,
};
use std::io::Cursor;

/// Decode the bytes of a `.class` file into the structural model
pub fn read_class(bytes: &[u8]) -> Result<ClassNode, Error> {
    let class_file = ClassFile::deserialize(&mut Cursor::new(bytes))?;
    let constants = &class_file.constants;

    let name = binary_name(constants, class_file.this_class)?;
    log::trace!(
        "reading class {} (version {}.{}, {} constants)",
        name,
        class_file.version.major,
        class_file.version.minor,
        constants.len()
    );

    let super_name = if class_file.super_class.0 == 0 {
        None
    } else {
        Some(binary_name(constants, class_file.super_class)?)
    };

    let mut class = ClassNode::new(
        ClassAccessFlags::from_bits_truncate(class_file.access_flags),
        name,
        super_name,
    );
    for interface in &class_file.interfaces {
        class.interfaces.push(binary_name(constants, *interface)?);
    }
    for field in &class_file.fields {
        class.fields.push(read_field(field, constants)?);
    }
    for method in &class_file.methods {
        class.methods.push(read_method(method, constants)?);
    }

    Ok(class)
}

fn binary_name(constants: &ConstantPool, index: ConstantIndex) -> Result<BinaryName, Error> {
    let name = constants.class_name(index)?;
    BinaryName::from_string(name.to_owned()).map_err(|msg| Error::ClassFormat(ClassFormatError::InvalidName(msg)))
}

fn unqualified_name(constants: &ConstantPool, index: ConstantIndex) -> Result<UnqualifiedName, Error> {
    let name = constants.utf8(index)?;
    match name {
        "<init>" => Ok(UnqualifiedName::INIT),
        "<clinit>" => Ok(UnqualifiedName::CLINIT),
        _ => UnqualifiedName::from_string(name.to_owned())
            .map_err(|msg| Error::ClassFormat(ClassFormatError::InvalidName(msg))),
    }
}

fn read_field(field: &Member, constants: &ConstantPool) -> Result<FieldNode, Error> {
    Ok(FieldNode::new(
        FieldAccessFlags::from_bits_truncate(field.access_flags),
        unqualified_name(constants, field.name_index)?,
        constants.utf8(field.descriptor_index)?,
    ))
}

fn read_method(method: &Member, constants: &ConstantPool) -> Result<MethodNode, Error> {
    let mut node = MethodNode::new(
        MethodAccessFlags::from_bits_truncate(method.access_flags),
        unqualified_name(constants, method.name_index)?,
        constants.utf8(method.descriptor_index)?,
    );
    if let Some(code) = find_attribute::<Code>(&method.attributes, constants)? {
        log::trace!(
            "decoding {}{} (max stack {}, max locals {})",
            node.name,
            node.descriptor,
            code.max_stack,
            code.max_locals
        );
        node.instructions = decode_code(&code, constants)?;
    }
    Ok(node)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::model::{Insn, LabelId};
    use crate::jvm::opcodes::*;
    use byteorder::{BigEndian, WriteBytesExt};

    fn utf8(out: &mut Vec<u8>, string: &str) {
        out.write_u8(1).unwrap();
        out.write_u16::<BigEndian>(string.len() as u16).unwrap();
        out.extend_from_slice(string.as_bytes());
    }

    fn class_ref(out: &mut Vec<u8>, name_index: u16) {
        out.write_u8(7).unwrap();
        out.write_u16::<BigEndian>(name_index).unwrap();
    }

    /// `class a/B { private int x; public int m(int) }` with `m` branching on its argument
    fn sample_class() -> Vec<u8> {
        let mut out = vec![];
        out.write_u32::<BigEndian>(0xCAFE_BABE).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();
        out.write_u16::<BigEndian>(52).unwrap();

        // Constants
        out.write_u16::<BigEndian>(13).unwrap();
        utf8(&mut out, "a/B"); // 1
        class_ref(&mut out, 1); // 2
        utf8(&mut out, "java/lang/Object"); // 3
        class_ref(&mut out, 3); // 4
        utf8(&mut out, "x"); // 5
        utf8(&mut out, "I"); // 6
        utf8(&mut out, "m"); // 7
        utf8(&mut out, "(I)I"); // 8
        utf8(&mut out, "Code"); // 9
        utf8(&mut out, "LineNumberTable"); // 10
        out.write_u8(5).unwrap(); // 11 (and unusable 12)
        out.write_i64::<BigEndian>(1).unwrap();

        out.write_u16::<BigEndian>(0x0021).unwrap();
        out.write_u16::<BigEndian>(2).unwrap();
        out.write_u16::<BigEndian>(4).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();

        // Fields
        out.write_u16::<BigEndian>(1).unwrap();
        out.write_u16::<BigEndian>(0x0002).unwrap();
        out.write_u16::<BigEndian>(5).unwrap();
        out.write_u16::<BigEndian>(6).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();

        // Body of `m`
        let mut code = vec![];
        code.write_u16::<BigEndian>(1).unwrap();
        code.write_u16::<BigEndian>(2).unwrap();
        let bytecode = [
            0x1b, // iload_1
            0x99, 0x00, 0x05, // ifeq +5
            0x04, // iconst_1
            0xac, // ireturn
            0x03, // iconst_0
            0xac, // ireturn
        ];
        code.write_u32::<BigEndian>(bytecode.len() as u32).unwrap();
        code.extend_from_slice(&bytecode);
        code.write_u16::<BigEndian>(0).unwrap();
        code.write_u16::<BigEndian>(1).unwrap();
        code.write_u16::<BigEndian>(10).unwrap();
        code.write_u32::<BigEndian>(6).unwrap();
        code.write_u16::<BigEndian>(1).unwrap();
        code.write_u16::<BigEndian>(0).unwrap();
        code.write_u16::<BigEndian>(3).unwrap();

        // Methods
        out.write_u16::<BigEndian>(1).unwrap();
        out.write_u16::<BigEndian>(0x0001).unwrap();
        out.write_u16::<BigEndian>(7).unwrap();
        out.write_u16::<BigEndian>(8).unwrap();
        out.write_u16::<BigEndian>(1).unwrap();
        out.write_u16::<BigEndian>(9).unwrap();
        out.write_u32::<BigEndian>(code.len() as u32).unwrap();
        out.extend_from_slice(&code);

        // Class attributes
        out.write_u16::<BigEndian>(0).unwrap();
        out
    }

    #[test]
    fn hand_assembled_class() {
        let class = read_class(&sample_class()).unwrap();

        assert_eq!(class.name.as_str(), "a/B");
        assert_eq!(class.super_name, Some(BinaryName::OBJECT));
        assert_eq!(class.access_flags, ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER);
        assert!(class.interfaces.is_empty());

        assert_eq!(class.fields.len(), 1);
        assert_eq!(class.fields[0].name.as_str(), "x");
        assert_eq!(class.fields[0].descriptor, "I");
        assert_eq!(class.fields[0].access_flags, FieldAccessFlags::PRIVATE);

        assert_eq!(class.methods.len(), 1);
        let method = &class.methods[0];
        assert_eq!(method.name.as_str(), "m");
        assert_eq!(method.descriptor, "(I)I");
        assert_eq!(
            method.instructions,
            vec![
                Insn::label(LabelId(0)),
                Insn::line_number(3, LabelId(0)),
                Insn::var(ILOAD, 1),
                Insn::jump(IFEQ, LabelId(1)),
                Insn::zero(ICONST_1),
                Insn::zero(IRETURN),
                Insn::label(LabelId(1)),
                Insn::zero(ICONST_0),
                Insn::zero(IRETURN),
            ]
        );
    }

    #[test]
    fn bad_magic() {
        let mut bytes = sample_class();
        bytes[0] = 0xCB;
        assert!(matches!(
            read_class(&bytes),
            Err(Error::ClassFormat(ClassFormatError::InvalidMagic(0xCBFE_BABE)))
        ));
    }

    #[test]
    fn truncated() {
        let bytes = sample_class();
        assert!(matches!(
            read_class(&bytes[..bytes.len() - 3]),
            Err(Error::ClassFormat(ClassFormatError::UnexpectedEof))
        ));
    }

    #[test]
    fn constant_type_mismatch() {
        let mut bytes = sample_class();

        // Point `this_class` at the `Utf8` constant instead of the `Class`
        let this_class = bytes
            .windows(6)
            .position(|window| window == [0x00, 0x21, 0x00, 0x02, 0x00, 0x04])
            .unwrap();
        bytes[this_class + 3] = 1;
        assert!(matches!(
            read_class(&bytes),
            Err(Error::ClassFormat(ClassFormatError::ConstantTypeMismatch { index: 1, .. }))
        ));
    }
}
