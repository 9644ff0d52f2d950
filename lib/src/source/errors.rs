use crate::jvm;
use crate::jvm::model::LabelId;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Class model problems (malformed descriptors, unreadable class files)
    Jvm(jvm::Error),

    /// The class provider has no class by this name
    ClassNotFound(String),

    /// `NEWARRAY` operand outside of the primitive array type codes
    UnknownArrayType(i32),

    /// Jump whose target label is not part of the method body
    UnresolvedJumpTarget(LabelId),

    /// Jump written before labels were resolved (holds the source instruction index)
    UnlinkedJump(usize),

    /// Label written before it was named
    UnnamedLabel(LabelId),

    /// Token that violates its construction rules or doesn't fit in the text
    InvalidToken(String),

    /// Write position disagrees with the text actually written
    CursorDrift { expected: usize, actual: usize },
}

impl From<jvm::Error> for Error {
    fn from(err: jvm::Error) -> Error {
        Error::Jvm(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Jvm(err) => write!(f, "{}", err),
            Error::ClassNotFound(name) => write!(f, "no class named '{}'", name),
            Error::UnknownArrayType(code) => write!(f, "unknown primitive array type code {}", code),
            Error::UnresolvedJumpTarget(label) => write!(f, "jump to label {} which is not in the method", label),
            Error::UnlinkedJump(index) => write!(f, "jump at instruction {} was never linked to a label", index),
            Error::UnnamedLabel(label) => write!(f, "label {} has no name", label),
            Error::InvalidToken(msg) => write!(f, "invalid token: {}", msg),
            Error::CursorDrift { expected, actual } => write!(
                f,
                "write position drifted: expected offset {} but text is {} bytes long",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Jvm(err) => Some(err),
            _ => None,
        }
    }
}
