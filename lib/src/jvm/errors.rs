use super::AccessTarget;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),

    /// Name that is not any known access flag
    UnrecognizedAccessName(String),

    /// Two access flags were combined which belong to different kinds of declarations
    IncompatibleAccessTargets(AccessTarget, AccessTarget),

    /// Field or method descriptor that does not parse
    BadDescriptor(String),

    /// Class file bytes that could not be decoded
    ClassFormat(ClassFormatError),
}

/// Reasons a class file fails to decode
#[derive(Debug)]
pub enum ClassFormatError {
    InvalidMagic(u32),
    UnexpectedEof,
    UnrecognizedConstantTag(u8),
    ConstantIndexOutOfBounds(u16),
    ConstantTypeMismatch { index: u16, expected: &'static str },
    InvalidUtf8(u16),
    UnrecognizedOpcode { opcode: u8, offset: usize },
    InvalidCodeOffset { target: i64, code_length: usize },
    InvalidWideOpcode(u8),
    InvalidHandleKind(u8),

    /// Class or member name that is not legal in a class file
    InvalidName(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::ClassFormat(ClassFormatError::UnexpectedEof)
        } else {
            Error::IoError(err)
        }
    }
}

impl From<ClassFormatError> for Error {
    fn from(err: ClassFormatError) -> Error {
        Error::ClassFormat(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IoError(err) => write!(f, "IO error: {}", err),
            Error::UnrecognizedAccessName(name) => {
                write!(f, "unrecognized access flag name '{}'", name)
            }
            Error::IncompatibleAccessTargets(left, right) => write!(
                f,
                "access targets cannot be combined: {} and {}",
                left, right
            ),
            Error::BadDescriptor(msg) => write!(f, "bad descriptor: {}", msg),
            Error::ClassFormat(err) => write!(f, "malformed class file: {:?}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}
