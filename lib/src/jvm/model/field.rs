use crate::jvm::{FieldAccessFlags, UnqualifiedName};

/// Field declared by a class
#[derive(Clone, Debug)]
pub struct FieldNode {
    pub access_flags: FieldAccessFlags,
    pub name: UnqualifiedName,

    /// Field descriptor (eg. `I` or `[Ljava/lang/String;`)
    pub descriptor: String,
}

impl FieldNode {
    pub fn new(access_flags: FieldAccessFlags, name: UnqualifiedName, descriptor: impl Into<String>) -> FieldNode {
        FieldNode {
            access_flags,
            name,
            descriptor: descriptor.into(),
        }
    }
}
