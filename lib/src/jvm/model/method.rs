use crate::jvm::model::Insn;
use crate::jvm::{MethodAccessFlags, UnqualifiedName};

/// Method declared by a class
#[derive(Clone, Debug)]
pub struct MethodNode {
    pub access_flags: MethodAccessFlags,
    pub name: UnqualifiedName,

    /// Method descriptor (eg. `(ILjava/lang/String;)V`)
    pub descriptor: String,

    /// Instructions of the method body (empty for `abstract` and `native` methods)
    pub instructions: Vec<Insn>,
}

impl MethodNode {
    /// Create a method with an empty body
    pub fn new(access_flags: MethodAccessFlags, name: UnqualifiedName, descriptor: impl Into<String>) -> MethodNode {
        MethodNode {
            access_flags,
            name,
            descriptor: descriptor.into(),
            instructions: vec![],
        }
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::ABSTRACT)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == UnqualifiedName::INIT
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == UnqualifiedName::CLINIT
    }
}
