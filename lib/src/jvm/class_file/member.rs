use crate::jvm::class_file::{Attribute, ConstantIndex, Deserialize};
use crate::jvm::Error;
use byteorder::ReadBytesExt;

/// Field or method declared by a class or interface
///
/// Both share the same layout in the class file, only the meaning of the access flags differs.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.5
/// [1]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.6
#[derive(Debug)]
pub struct Member {
    pub access_flags: u16,
    pub name_index: ConstantIndex,
    pub descriptor_index: ConstantIndex,
    pub attributes: Vec<Attribute>,
}

impl Deserialize for Member {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(Member {
            access_flags: u16::deserialize(reader)?,
            name_index: ConstantIndex::deserialize(reader)?,
            descriptor_index: ConstantIndex::deserialize(reader)?,
            attributes: Vec::<Attribute>::deserialize(reader)?,
        })
    }
}
