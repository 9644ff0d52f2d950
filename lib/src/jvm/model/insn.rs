use crate::jvm::opcodes::{self, PSEUDO};
use std::fmt;

/// Identity of a label within one method body
///
/// Jumps, switches and line numbers refer to labels by this identity, never by position.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LabelId(pub usize);

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Single entry of a method body
///
/// Real instructions carry their opcode. Labels, line numbers and frames are pseudo-instructions
/// with opcode [`PSEUDO`].
#[derive(Clone, Debug, PartialEq)]
pub struct Insn {
    pub opcode: i32,
    pub kind: InsnKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InsnKind {
    /// No operands (eg. `IADD`, `RETURN`)
    Zero,

    /// `BIPUSH`, `SIPUSH` and `NEWARRAY` (for which the operand is an array type code)
    Int(i32),

    /// Local variable instructions, always in their indexed form (`ILOAD 0`, never `ILOAD_0`)
    Var(u16),

    /// `NEW`, `ANEWARRAY`, `CHECKCAST` and `INSTANCEOF`
    ///
    /// The operand is an internal name, or an array descriptor for array classes.
    Type(String),

    Field {
        owner: String,
        name: String,
        descriptor: String,
    },

    Method {
        owner: String,
        name: String,
        descriptor: String,
    },

    InvokeDynamic {
        name: String,
        descriptor: String,

        /// Index into the class's `BootstrapMethods` attribute
        bootstrap_method: u16,
    },

    Jump(LabelId),
    Label(LabelId),
    Ldc(LdcConstant),
    Iinc {
        var: u16,
        increment: i16,
    },
    TableSwitch {
        low: i32,
        high: i32,
        default: LabelId,
        targets: Vec<LabelId>,
    },
    LookupSwitch {
        default: LabelId,
        keys: Vec<i32>,
        targets: Vec<LabelId>,
    },
    MultiANewArray {
        descriptor: String,
        dimensions: u8,
    },
    LineNumber {
        line: u16,
        start: LabelId,
    },

    /// Stack map frame (carried for completeness, contents are not modelled)
    Frame,
}

/// Constant loaded by `LDC`
#[derive(Clone, Debug, PartialEq)]
pub enum LdcConstant {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),

    /// Class literal (internal name or array descriptor) or method type (method descriptor)
    Type(String),

    /// Method handle, already rendered
    MethodHandle(String),

    /// Dynamically computed constant
    Dynamic {
        name: String,
        descriptor: String,
        bootstrap_method: u16,
    },
}

impl Insn {
    pub fn new(opcode: i32, kind: InsnKind) -> Insn {
        Insn { opcode, kind }
    }

    /// Instruction without operands
    pub fn zero(opcode: i32) -> Insn {
        Insn::new(opcode, InsnKind::Zero)
    }

    pub fn int(opcode: i32, operand: i32) -> Insn {
        Insn::new(opcode, InsnKind::Int(operand))
    }

    pub fn var(opcode: i32, index: u16) -> Insn {
        Insn::new(opcode, InsnKind::Var(index))
    }

    pub fn type_insn(opcode: i32, class: impl Into<String>) -> Insn {
        Insn::new(opcode, InsnKind::Type(class.into()))
    }

    pub fn field(opcode: i32, owner: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Insn {
        Insn::new(
            opcode,
            InsnKind::Field {
                owner: owner.into(),
                name: name.into(),
                descriptor: descriptor.into(),
            },
        )
    }

    pub fn method(opcode: i32, owner: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Insn {
        Insn::new(
            opcode,
            InsnKind::Method {
                owner: owner.into(),
                name: name.into(),
                descriptor: descriptor.into(),
            },
        )
    }

    pub fn jump(opcode: i32, target: LabelId) -> Insn {
        Insn::new(opcode, InsnKind::Jump(target))
    }

    pub fn label(id: LabelId) -> Insn {
        Insn::new(PSEUDO, InsnKind::Label(id))
    }

    pub fn line_number(line: u16, start: LabelId) -> Insn {
        Insn::new(PSEUDO, InsnKind::LineNumber { line, start })
    }

    pub fn frame() -> Insn {
        Insn::new(PSEUDO, InsnKind::Frame)
    }

    pub fn ldc(constant: LdcConstant) -> Insn {
        Insn::new(opcodes::LDC, InsnKind::Ldc(constant))
    }

    pub fn iinc(var: u16, increment: i16) -> Insn {
        Insn::new(opcodes::IINC, InsnKind::Iinc { var, increment })
    }

    /// Is this a pseudo-instruction (label, line number, frame)?
    pub fn is_pseudo(&self) -> bool {
        self.opcode == PSEUDO
    }

    /// Label identity, if this is a label
    pub fn label_id(&self) -> Option<LabelId> {
        match self.kind {
            InsnKind::Label(id) => Some(id),
            _ => None,
        }
    }
}

/// Debug-style rendering of the instruction, used when nothing better is available
impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match opcodes::mnemonic(self.opcode) {
            Some(mnemonic) => f.write_str(mnemonic)?,
            None => write!(f, "#{}", self.opcode)?,
        }
        match &self.kind {
            InsnKind::Zero | InsnKind::Frame => Ok(()),
            InsnKind::Int(operand) => write!(f, " {}", operand),
            InsnKind::Var(index) => write!(f, " {}", index),
            InsnKind::Type(class) => write!(f, " {}", class),
            InsnKind::Field { owner, name, descriptor } | InsnKind::Method { owner, name, descriptor } => {
                write!(f, " {}.{}{}", owner, name, descriptor)
            }
            InsnKind::InvokeDynamic {
                name,
                descriptor,
                bootstrap_method,
            } => write!(f, " {}{} [#{}]", name, descriptor, bootstrap_method),
            InsnKind::Jump(target) => write!(f, " {}", target),
            InsnKind::Label(id) => write!(f, " {}", id),
            InsnKind::Ldc(constant) => write!(f, " {:?}", constant),
            InsnKind::Iinc { var, increment } => write!(f, " {} {}", var, increment),
            InsnKind::TableSwitch { low, high, default, targets } => {
                write!(f, " {}..{} default {}", low, high, default)?;
                for target in targets {
                    write!(f, " {}", target)?;
                }
                Ok(())
            }
            InsnKind::LookupSwitch { default, keys, targets } => {
                write!(f, " default {}", default)?;
                for (key, target) in keys.iter().zip(targets) {
                    write!(f, " {}: {}", key, target)?;
                }
                Ok(())
            }
            InsnKind::MultiANewArray { descriptor, dimensions } => write!(f, " {} {}", descriptor, dimensions),
            InsnKind::LineNumber { line, start } => write!(f, " {} {}", line, start),
        }
    }
}
