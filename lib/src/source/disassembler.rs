use crate::jvm::model::ClassNode;
use crate::jvm::ClassProvider;
use crate::source::{render_class, Entry, Error, SourceIndex};
use std::fmt;
use std::sync::Arc;

/// Collaborator that knows more about entries than the class files do (eg. mapped names and
/// their documentation)
///
/// It is only carried along with a [`Source`] so that it can later be used to annotate the
/// rendered text.
pub trait EntryRemapper {
    /// Documentation attached to an entry, if any
    fn documentation(&self, entry: &Entry) -> Option<String>;
}

/// Disassembler producing tokenized text for classes fetched from a provider
pub struct TokenizingDisassembler<P: ClassProvider> {
    provider: P,
}

impl<P: ClassProvider> TokenizingDisassembler<P> {
    pub fn new(provider: P) -> TokenizingDisassembler<P> {
        TokenizingDisassembler { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Look up a class by its internal name (eg. `java/lang/String`)
    pub fn source(
        &self,
        class_name: &str,
        remapper: Option<Arc<dyn EntryRemapper>>,
    ) -> Result<Source, Error> {
        let class = self
            .provider
            .get(class_name)?
            .ok_or_else(|| Error::ClassNotFound(class_name.to_owned()))?;
        log::debug!("Found class {}", class_name);
        Ok(Source { class, remapper })
    }
}

/// Class ready to be rendered
///
/// Rendering happens anew on every call to [`Source::index`], so a `Source` is cheap to keep
/// around.
#[derive(Clone)]
pub struct Source {
    class: Arc<ClassNode>,
    remapper: Option<Arc<dyn EntryRemapper>>,
}

impl Source {
    /// Render the class, along with the index of its tokens
    pub fn index(&self) -> Result<SourceIndex, Error> {
        render_class(&self.class)
    }

    /// Render the class to plain text
    pub fn as_string(&self) -> Result<String, Error> {
        self.index().map(SourceIndex::into_text)
    }

    pub fn with_remapper(self, remapper: Arc<dyn EntryRemapper>) -> Source {
        Source {
            remapper: Some(remapper),
            ..self
        }
    }

    pub fn class(&self) -> &ClassNode {
        &self.class
    }

    pub fn remapper(&self) -> Option<&dyn EntryRemapper> {
        self.remapper.as_deref()
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("class", &self.class.name)
            .field("remapper", &self.remapper.is_some())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{BinaryName, ClassAccessFlags, MemoryClassProvider, Name};

    struct Docs;

    impl EntryRemapper for Docs {
        fn documentation(&self, entry: &Entry) -> Option<String> {
            Some(format!("docs for {}", entry))
        }
    }

    fn provider() -> MemoryClassProvider {
        let name = BinaryName::from_string(String::from("a/B")).unwrap();
        vec![ClassNode::new(ClassAccessFlags::empty(), name, Some(BinaryName::OBJECT))]
            .into_iter()
            .collect()
    }

    #[test]
    fn lookup() {
        let disassembler = TokenizingDisassembler::new(provider());
        assert!(disassembler.provider().get("a/B").unwrap().is_some());

        let source = disassembler.source("a/B", None).unwrap();
        assert_eq!(source.class().name.as_str(), "a/B");
        assert_eq!(source.as_string().unwrap(), "package a;\n\nclass B {\n}\n");
        assert!(source.remapper().is_none());

        assert!(matches!(
            disassembler.source("a/C", None),
            Err(Error::ClassNotFound(name)) if name == "a/C"
        ));
    }

    #[test]
    fn remapper_is_carried_along() {
        let disassembler = TokenizingDisassembler::new(provider());
        let source = disassembler.source("a/B", None).unwrap().with_remapper(Arc::new(Docs));

        let entry = Entry::Class(String::from("a/B"));
        let remapper = source.remapper().unwrap();
        assert_eq!(remapper.documentation(&entry).as_deref(), Some("docs for class a/B"));

        // Rendering doesn't depend on the remapper
        assert_eq!(source.index().unwrap().token_count(), 1);
    }
}
