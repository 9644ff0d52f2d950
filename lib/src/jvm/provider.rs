use crate::jvm::class_file::read_class;
use crate::jvm::model::ClassNode;
use crate::jvm::Error;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source of class models, looked up by internal name (eg. `java/lang/String`)
pub trait ClassProvider {
    /// Fetch a class, or `None` if the provider doesn't know about it
    fn get(&self, name: &str) -> Result<Option<Arc<ClassNode>>, Error>;
}

impl<P: ClassProvider + ?Sized> ClassProvider for &P {
    fn get(&self, name: &str) -> Result<Option<Arc<ClassNode>>, Error> {
        (**self).get(name)
    }
}

/// Provider over classes already in memory
#[derive(Default)]
pub struct MemoryClassProvider {
    classes: HashMap<String, Arc<ClassNode>>,
}

impl MemoryClassProvider {
    pub fn new() -> MemoryClassProvider {
        MemoryClassProvider::default()
    }

    /// Add a class, replacing any previous class with the same name
    pub fn insert(&mut self, class: ClassNode) -> Arc<ClassNode> {
        let class = Arc::new(class);
        self.classes.insert(class.name.as_ref().to_owned(), class.clone());
        class
    }
}

impl FromIterator<ClassNode> for MemoryClassProvider {
    fn from_iter<I: IntoIterator<Item = ClassNode>>(iter: I) -> Self {
        let mut provider = MemoryClassProvider::new();
        for class in iter {
            provider.insert(class);
        }
        provider
    }
}

impl ClassProvider for MemoryClassProvider {
    fn get(&self, name: &str) -> Result<Option<Arc<ClassNode>>, Error> {
        Ok(self.classes.get(name).cloned())
    }
}

/// Provider reading `.class` files out of a directory laid out by package
///
/// Class `a/b/C` is read from `<root>/a/b/C.class`. Classes are decoded afresh on every lookup.
pub struct DirectoryClassProvider {
    root: PathBuf,
}

impl DirectoryClassProvider {
    pub fn new(root: impl Into<PathBuf>) -> DirectoryClassProvider {
        DirectoryClassProvider { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn class_path(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in name.split('/') {
            path.push(segment);
        }
        path.set_extension("class");
        path
    }
}

impl ClassProvider for DirectoryClassProvider {
    fn get(&self, name: &str) -> Result<Option<Arc<ClassNode>>, Error> {
        let path = self.class_path(name);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("no class file at {}", path.display());
                return Ok(None);
            }
            Err(err) => return Err(Error::IoError(err)),
        };
        log::debug!("reading {} ({} bytes)", path.display(), bytes.len());
        read_class(&bytes).map(|class| Some(Arc::new(class)))
    }
}
