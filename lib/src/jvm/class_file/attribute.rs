use crate::jvm::class_file::{read_bytes, ConstantIndex, ConstantPool, Deserialize};
use crate::jvm::Error;
use byteorder::ReadBytesExt;
use std::io::Cursor;

/// Attributes (used in classes, fields, methods, and even on some attributes)
///
/// Only the contents of the attributes needed to rebuild method bodies are decoded, the rest are
/// kept as opaque bytes.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug)]
pub struct Attribute {
    pub name_index: ConstantIndex,
    pub info: Vec<u8>,
}

impl Deserialize for Attribute {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let name_index = ConstantIndex::deserialize(reader)?;

        // Attribute info length is 4 bytes
        let len = u32::deserialize(reader)?;
        let info = read_bytes(reader, len as usize)?;

        Ok(Attribute { name_index, info })
    }
}

impl Attribute {
    /// Name of the attribute, looked up in the constant pool
    pub fn name<'p>(&self, constants: &'p ConstantPool) -> Result<&'p str, Error> {
        constants.utf8(self.name_index)
    }

    /// Decode the attribute contents as `A`
    pub fn decode<A: AttributeLike>(&self) -> Result<A, Error> {
        A::deserialize(&mut Cursor::new(&self.info))
    }
}

/// Attributes are all stored in the same way (see `Attribute`), but internally
/// they represent very different things. This trait is implemented by things
/// which can be decoded out of attributes.
pub trait AttributeLike: Deserialize {
    /// Name of the attribute
    const NAME: &'static str;
}

/// Find the first attribute with the given name and decode it
pub fn find_attribute<A: AttributeLike>(
    attributes: &[Attribute],
    constants: &ConstantPool,
) -> Result<Option<A>, Error> {
    for attribute in attributes {
        if attribute.name(constants)? == A::NAME {
            return attribute.decode().map(Some);
        }
    }
    Ok(None)
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
#[derive(Debug)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code_array: Vec<u8>,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

impl Deserialize for Code {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let max_stack = u16::deserialize(reader)?;
        let max_locals = u16::deserialize(reader)?;
        let code_length = u32::deserialize(reader)?;
        let code_array = read_bytes(reader, code_length as usize)?;
        let exception_table = Vec::<ExceptionHandler>::deserialize(reader)?;
        let attributes = Vec::<Attribute>::deserialize(reader)?;
        Ok(Code {
            max_stack,
            max_locals,
            code_array,
            exception_table,
            attributes,
        })
    }
}

impl AttributeLike for Code {
    const NAME: &'static str = "Code";
}

#[derive(Debug, Clone, Copy)]
pub struct ExceptionHandler {
    /// Start of exception handler range (inclusive)
    pub start_pc: u16,

    /// End of exception handler range (exclusive)
    pub end_pc: u16,

    /// Start of the exception handler
    pub handler_pc: u16,

    /// Class of exceptions caught (0 for `finally` blocks)
    pub catch_type: ConstantIndex,
}

impl Deserialize for ExceptionHandler {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(ExceptionHandler {
            start_pc: u16::deserialize(reader)?,
            end_pc: u16::deserialize(reader)?,
            handler_pc: u16::deserialize(reader)?,
            catch_type: ConstantIndex::deserialize(reader)?,
        })
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.12
#[derive(Debug)]
pub struct LineNumberTable(pub Vec<LineNumber>);

#[derive(Debug, Clone, Copy)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}

impl Deserialize for LineNumber {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(LineNumber {
            start_pc: u16::deserialize(reader)?,
            line_number: u16::deserialize(reader)?,
        })
    }
}

impl Deserialize for LineNumberTable {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Vec::<LineNumber>::deserialize(reader).map(LineNumberTable)
    }
}

impl AttributeLike for LineNumberTable {
    const NAME: &'static str = "LineNumberTable";
}
