use crate::jvm::model::{FieldNode, MethodNode};
use crate::jvm::{BinaryName, ClassAccessFlags};

/// Class or interface, with its members in declaration order
#[derive(Clone, Debug)]
pub struct ClassNode {
    pub access_flags: ClassAccessFlags,
    pub name: BinaryName,

    /// Super class (only `java/lang/Object` and modules have none)
    pub super_name: Option<BinaryName>,

    pub interfaces: Vec<BinaryName>,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
}

impl ClassNode {
    /// Create a class with no interfaces or members
    pub fn new(access_flags: ClassAccessFlags, name: BinaryName, super_name: Option<BinaryName>) -> ClassNode {
        ClassNode {
            access_flags,
            name,
            super_name,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
        }
    }
}
