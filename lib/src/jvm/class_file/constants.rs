use crate::jvm::class_file::{read_bytes, Deserialize};
use crate::jvm::model::LdcConstant;
use crate::jvm::{ClassFormatError, Error};
use crate::util::Width;
use byteorder::ReadBytesExt;

/// Index into the constant pool
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ConstantIndex(pub u16);

impl Deserialize for ConstantIndex {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        u16::deserialize(reader).map(ConstantIndex)
    }
}

/// Constants as in the constant pool
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Class or an interface (or an array type)
    Class(ConstantIndex),

    FieldRef {
        class: ConstantIndex,
        name_and_type: ConstantIndex,
    },

    /// Method (this combines `Methodref` and `InterfaceMethodref`)
    MethodRef {
        class: ConstantIndex,
        name_and_type: ConstantIndex,
        is_interface: bool,
    },

    /// Constant object of type `java.lang.String`
    String(ConstantIndex),

    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),

    NameAndType {
        name: ConstantIndex,
        descriptor: ConstantIndex,
    },

    /// Constant string value, already decoded from modified UTF-8
    Utf8(String),

    MethodHandle {
        handle_kind: HandleKind,

        /// `FieldRef` for the field handle kinds, `MethodRef` for the rest
        member: ConstantIndex,
    },

    MethodType {
        descriptor: ConstantIndex,
    },

    /// Dynamically-computed constant
    Dynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        name_and_type: ConstantIndex,
    },

    /// Dynamically-computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        name_and_type: ConstantIndex,
    },

    Module(ConstantIndex),
    Package(ConstantIndex),
}

impl Constant {
    /// Read one constant, starting with its tag
    ///
    /// The index is only used for error reporting.
    fn read<R: ReadBytesExt>(reader: &mut R, index: u16) -> Result<Constant, Error> {
        let tag = u8::deserialize(reader)?;
        Ok(match tag {
            1 => {
                let len = u16::deserialize(reader)?;
                let bytes = read_bytes(reader, len as usize)?;
                let string = decode_modified_utf8(&bytes).ok_or(ClassFormatError::InvalidUtf8(index))?;
                Constant::Utf8(string)
            }
            3 => Constant::Integer(i32::deserialize(reader)?),
            4 => Constant::Float(f32::deserialize(reader)?),
            5 => Constant::Long(i64::deserialize(reader)?),
            6 => Constant::Double(f64::deserialize(reader)?),
            7 => Constant::Class(ConstantIndex::deserialize(reader)?),
            8 => Constant::String(ConstantIndex::deserialize(reader)?),
            9 => Constant::FieldRef {
                class: ConstantIndex::deserialize(reader)?,
                name_and_type: ConstantIndex::deserialize(reader)?,
            },
            10 | 11 => Constant::MethodRef {
                class: ConstantIndex::deserialize(reader)?,
                name_and_type: ConstantIndex::deserialize(reader)?,
                is_interface: tag == 11,
            },
            12 => Constant::NameAndType {
                name: ConstantIndex::deserialize(reader)?,
                descriptor: ConstantIndex::deserialize(reader)?,
            },
            15 => {
                let kind = u8::deserialize(reader)?;
                let handle_kind = HandleKind::from_byte(kind).ok_or(ClassFormatError::InvalidHandleKind(kind))?;
                Constant::MethodHandle {
                    handle_kind,
                    member: ConstantIndex::deserialize(reader)?,
                }
            }
            16 => Constant::MethodType {
                descriptor: ConstantIndex::deserialize(reader)?,
            },
            17 => Constant::Dynamic {
                bootstrap_method: u16::deserialize(reader)?,
                name_and_type: ConstantIndex::deserialize(reader)?,
            },
            18 => Constant::InvokeDynamic {
                bootstrap_method: u16::deserialize(reader)?,
                name_and_type: ConstantIndex::deserialize(reader)?,
            },
            19 => Constant::Module(ConstantIndex::deserialize(reader)?),
            20 => Constant::Package(ConstantIndex::deserialize(reader)?),
            other => return Err(Error::ClassFormat(ClassFormatError::UnrecognizedConstantTag(other))),
        })
    }
}

/// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`. Quoting
/// the spec:
///
/// > All 8-byte constants take up two entries in the constant_pool table of the class file. If a
/// > CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the constant_pool table
/// > at index n, then the next usable item in the pool is located at index n+2. The constant_pool
/// > index n+1 must be valid but is considered unusable.
impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Type of method handle
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-5.html#jvms-5.4.3.5-220
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum HandleKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl HandleKind {
    pub fn from_byte(byte: u8) -> Option<HandleKind> {
        Some(match byte {
            1 => HandleKind::GetField,
            2 => HandleKind::GetStatic,
            3 => HandleKind::PutField,
            4 => HandleKind::PutStatic,
            5 => HandleKind::InvokeVirtual,
            6 => HandleKind::InvokeStatic,
            7 => HandleKind::InvokeSpecial,
            8 => HandleKind::NewInvokeSpecial,
            9 => HandleKind::InvokeInterface,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            HandleKind::GetField => "getfield",
            HandleKind::GetStatic => "getstatic",
            HandleKind::PutField => "putfield",
            HandleKind::PutStatic => "putstatic",
            HandleKind::InvokeVirtual => "invokevirtual",
            HandleKind::InvokeStatic => "invokestatic",
            HandleKind::InvokeSpecial => "invokespecial",
            HandleKind::NewInvokeSpecial => "newinvokespecial",
            HandleKind::InvokeInterface => "invokeinterface",
        }
    }
}

/// Member reference resolved out of the constant pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub is_interface: bool,
}

/// Constant pool of a class being decoded
///
/// Slot 0 and the slot following every long or double are unusable and stay empty.
#[derive(Debug)]
pub struct ConstantPool {
    constants: Vec<Option<Constant>>,
}

impl Deserialize for ConstantPool {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let count = u16::deserialize(reader)?;
        let mut constants = Vec::with_capacity(count as usize);
        constants.push(None);
        while constants.len() < count as usize {
            let constant = Constant::read(reader, constants.len() as u16)?;
            let width = constant.width();
            constants.push(Some(constant));
            if width == 2 {
                constants.push(None);
            }
        }
        Ok(ConstantPool { constants })
    }
}

impl ConstantPool {
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.len() <= 1
    }

    pub fn get(&self, index: ConstantIndex) -> Result<&Constant, Error> {
        match self.constants.get(index.0 as usize) {
            Some(Some(constant)) => Ok(constant),
            _ => Err(Error::ClassFormat(ClassFormatError::ConstantIndexOutOfBounds(index.0))),
        }
    }

    fn mismatch(index: ConstantIndex, expected: &'static str) -> Error {
        Error::ClassFormat(ClassFormatError::ConstantTypeMismatch {
            index: index.0,
            expected,
        })
    }

    pub fn utf8(&self, index: ConstantIndex) -> Result<&str, Error> {
        match self.get(index)? {
            Constant::Utf8(string) => Ok(string),
            _ => Err(Self::mismatch(index, "Utf8")),
        }
    }

    /// Internal name (or array descriptor) of a `Class` constant
    pub fn class_name(&self, index: ConstantIndex) -> Result<&str, Error> {
        match self.get(index)? {
            Constant::Class(name) => self.utf8(*name),
            _ => Err(Self::mismatch(index, "Class")),
        }
    }

    pub fn name_and_type(&self, index: ConstantIndex) -> Result<(&str, &str), Error> {
        match self.get(index)? {
            Constant::NameAndType { name, descriptor } => Ok((self.utf8(*name)?, self.utf8(*descriptor)?)),
            _ => Err(Self::mismatch(index, "NameAndType")),
        }
    }

    fn member(&self, class: ConstantIndex, name_and_type: ConstantIndex, is_interface: bool) -> Result<MemberRef, Error> {
        let (name, descriptor) = self.name_and_type(name_and_type)?;
        Ok(MemberRef {
            owner: self.class_name(class)?.to_owned(),
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            is_interface,
        })
    }

    pub fn field_ref(&self, index: ConstantIndex) -> Result<MemberRef, Error> {
        match self.get(index)? {
            Constant::FieldRef { class, name_and_type } => self.member(*class, *name_and_type, false),
            _ => Err(Self::mismatch(index, "Fieldref")),
        }
    }

    pub fn method_ref(&self, index: ConstantIndex) -> Result<MemberRef, Error> {
        match self.get(index)? {
            Constant::MethodRef {
                class,
                name_and_type,
                is_interface,
            } => self.member(*class, *name_and_type, *is_interface),
            _ => Err(Self::mismatch(index, "Methodref")),
        }
    }

    /// Name, descriptor and bootstrap method index of an `InvokeDynamic` constant
    pub fn invoke_dynamic(&self, index: ConstantIndex) -> Result<(String, String, u16), Error> {
        match self.get(index)? {
            Constant::InvokeDynamic {
                bootstrap_method,
                name_and_type,
            } => {
                let (name, descriptor) = self.name_and_type(*name_and_type)?;
                Ok((name.to_owned(), descriptor.to_owned(), *bootstrap_method))
            }
            _ => Err(Self::mismatch(index, "InvokeDynamic")),
        }
    }

    /// Render a method handle (eg. `invokestatic java/lang/Math.abs(I)I`)
    pub fn method_handle(&self, handle_kind: HandleKind, member: ConstantIndex) -> Result<String, Error> {
        let member = match self.get(member)? {
            Constant::FieldRef { .. } => self.field_ref(member)?,
            _ => self.method_ref(member)?,
        };
        Ok(format!(
            "{} {}.{}{}",
            handle_kind.keyword(),
            member.owner,
            member.name,
            member.descriptor
        ))
    }

    /// Constant which `LDC`, `LDC_W` or `LDC2_W` can load
    pub fn loadable(&self, index: ConstantIndex) -> Result<LdcConstant, Error> {
        Ok(match self.get(index)? {
            Constant::Integer(integer) => LdcConstant::Integer(*integer),
            Constant::Float(float) => LdcConstant::Float(*float),
            Constant::Long(long) => LdcConstant::Long(*long),
            Constant::Double(double) => LdcConstant::Double(*double),
            Constant::String(string) => LdcConstant::String(self.utf8(*string)?.to_owned()),
            Constant::Class(name) => LdcConstant::Type(self.utf8(*name)?.to_owned()),
            Constant::MethodType { descriptor } => LdcConstant::Type(self.utf8(*descriptor)?.to_owned()),
            Constant::MethodHandle { handle_kind, member } => {
                LdcConstant::MethodHandle(self.method_handle(*handle_kind, *member)?)
            }
            Constant::Dynamic {
                bootstrap_method,
                name_and_type,
            } => {
                let (name, descriptor) = self.name_and_type(*name_and_type)?;
                LdcConstant::Dynamic {
                    name: name.to_owned(),
                    descriptor: descriptor.to_owned(),
                    bootstrap_method: *bootstrap_method,
                }
            }
            _ => return Err(Self::mismatch(index, "loadable constant")),
        })
    }
}

/// Decode the modified UTF-8 format used in class files
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// Returns `None` on malformed bytes. Unpaired surrogates are legal in class files but can't be
/// held by a `String`, so they decode to `U+FFFD`.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    fn continuation(bytes: &mut impl Iterator<Item = u8>) -> Option<u16> {
        match bytes.next() {
            Some(byte) if byte & 0b1100_0000 == 0b1000_0000 => Some((byte & 0x3F) as u16),
            _ => None,
        }
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut bytes = bytes.iter().copied();
    while let Some(byte) = bytes.next() {
        let unit = if byte & 0b1000_0000 == 0 {
            byte as u16
        } else if byte & 0b1110_0000 == 0b1100_0000 {
            ((byte & 0x1F) as u16) << 6 | continuation(&mut bytes)?
        } else if byte & 0b1111_0000 == 0b1110_0000 {
            let high = continuation(&mut bytes)?;
            let low = continuation(&mut bytes)?;
            ((byte & 0x0F) as u16) << 12 | high << 6 | low
        } else {
            return None;
        };
        units.push(unit);
    }

    Some(String::from_utf16_lossy(&units))
}

#[cfg(test)]
mod decode_modified_utf8_tests {
    use super::*;

    #[test]
    fn containing_null_byte() {
        assert_eq!(decode_modified_utf8(&[97, 192, 128, 97]).as_deref(), Some("a\x00a"));
    }

    #[test]
    fn simple_ascii() {
        assert_eq!(decode_modified_utf8(&[102, 111, 111]).as_deref(), Some("foo"));
        assert_eq!(
            decode_modified_utf8(&[104, 101, 108, 49, 48, 95, 87, 111, 114, 108, 100]).as_deref(),
            Some("hel10_World")
        );
    }

    #[test]
    fn two_and_three_byte_encodings() {
        assert_eq!(
            decode_modified_utf8(&[
                196, 132, 199, 141, 199, 158, 199, 160, 199, 186, 200, 128, 200, 130, 200, 166,
                200, 186, 211, 144, 211, 146
            ])
            .as_deref(),
            Some("ĄǍǞǠǺȀȂȦȺӐӒ")
        );
        assert_eq!(
            decode_modified_utf8(&[224, 164, 132, 224, 164, 133, 224, 165, 178]).as_deref(),
            Some("ऄअॲ")
        );
    }

    #[test]
    fn supplementary_characters() {
        assert_eq!(
            decode_modified_utf8(&[
                237, 160, 128, 237, 176, 128, 237, 172, 191, 237, 191, 191, 237, 175, 191, 237,
                191, 191
            ])
            .as_deref(),
            Some("\u{10000}\u{dffff}\u{10FFFF}")
        );
    }

    #[test]
    fn malformed() {
        // Truncated two-byte sequence
        assert_eq!(decode_modified_utf8(&[97, 192]), None);

        // Four-byte form is never used
        assert_eq!(decode_modified_utf8(&[240, 144, 128, 128]), None);

        // Bad continuation byte
        assert_eq!(decode_modified_utf8(&[224, 164, 97]), None);
    }

    #[test]
    fn unpaired_surrogates() {
        assert_eq!(decode_modified_utf8(&[97, 237, 160, 128]).as_deref(), Some("a\u{FFFD}"));
        assert_eq!(
            decode_modified_utf8(&[237, 176, 128, 98, 237, 175, 191]).as_deref(),
            Some("\u{FFFD}b\u{FFFD}")
        );
    }
}
