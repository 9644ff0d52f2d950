use crate::jvm::class_file::{Attribute, ConstantIndex, ConstantPool, Deserialize, Member};
use crate::jvm::{ClassFormatError, Error};
use byteorder::ReadBytesExt;

/// Representation of the [`class` file format of the JVM][0]
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html
#[derive(Debug)]
pub struct ClassFile {
    pub version: Version,
    pub constants: ConstantPool,
    pub access_flags: u16,
    pub this_class: ConstantIndex,

    /// Zero when there is no super class
    pub super_class: ConstantIndex,

    pub interfaces: Vec<ConstantIndex>,
    pub fields: Vec<Member>,
    pub methods: Vec<Member>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Magic header bytes that go at the front of the serialized class file
    pub const MAGIC: u32 = 0xCAFE_BABE;
}

impl Deserialize for ClassFile {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let magic = u32::deserialize(reader)?;
        if magic != ClassFile::MAGIC {
            return Err(Error::ClassFormat(ClassFormatError::InvalidMagic(magic)));
        }
        Ok(ClassFile {
            version: Version::deserialize(reader)?,
            constants: ConstantPool::deserialize(reader)?,
            access_flags: u16::deserialize(reader)?,
            this_class: ConstantIndex::deserialize(reader)?,
            super_class: ConstantIndex::deserialize(reader)?,
            interfaces: Vec::<ConstantIndex>::deserialize(reader)?,
            fields: Vec::<Member>::deserialize(reader)?,
            methods: Vec::<Member>::deserialize(reader)?,
            attributes: Vec::<Attribute>::deserialize(reader)?,
        })
    }
}

/// Class file version
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Deserialize for Version {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let minor = u16::deserialize(reader)?;
        let major = u16::deserialize(reader)?;
        Ok(Version { major, minor })
    }
}
