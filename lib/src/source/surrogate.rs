use crate::jvm::model::{Insn, InsnKind, LabelId, LdcConstant};
use crate::jvm::opcodes::{self, *};
use crate::jvm::{BaseType, BinaryName, FieldType, ParseDescriptor, SourceName};
use crate::source::{Error, Token};
use std::fmt;

/// Stand-in for one instruction of a method body, knowing how to render itself
///
/// Surrogates are created fresh for each render. `source` is the position of the instruction in
/// the method's instruction list, which is what identifies it during label resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Surrogate {
    pub source: usize,
    pub kind: SurrogateKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurrogateKind {
    /// Instruction rendered as its bare mnemonic
    Simple { mnemonic: &'static str },

    /// Array element load or store (`IALOAD`, `AASTORE`, ...)
    ArrayAccess { mnemonic: &'static str },

    /// Local variable load or store (`ILOAD 1`, `ASTORE 3`, `RET 2`)
    LocalVarAccess { mnemonic: &'static str, index: u16 },

    /// `IINC index ±amount`
    IncrementLocal { index: u16, amount: i16 },

    /// Instruction with a class operand, rendered as `MNEMONIC descriptor`
    ///
    /// `dimensions` is only set for `MULTIANEWARRAY`, which gets it as a trailing operand.
    TypeOperand {
        mnemonic: &'static str,
        descriptor: String,
        dimensions: Option<u8>,
    },

    /// Instruction pushing a constant
    ConstantLoad {
        /// Full rendered text (`ICONST_1`, `BIPUSH 12`, `LDC "hi"`)
        text: String,

        /// Source spelling of the value (`1`, `0F`, `null`, `java.lang.String.class`)
        value: String,
    },

    FieldAccess {
        mnemonic: &'static str,
        owner: String,
        name: String,
        descriptor: String,
    },

    MethodCall {
        mnemonic: &'static str,
        owner: String,
        name: String,
        descriptor: String,
    },

    ReturnOrThrow { mnemonic: &'static str },

    /// `NEWARRAY` with its raw array type code
    NewPrimitiveArray { array_type: i32 },

    Jump {
        mnemonic: &'static str,
        target: LabelId,

        /// Position of the target label among the method's surrogates, once linked
        link: Option<usize>,
    },

    Label {
        id: LabelId,

        /// Assigned when the label survives pruning
        name: Option<String>,

        /// Source instructions of the jumps to this label
        backreferences: Vec<usize>,
    },

    /// Instruction with no dedicated rendering, shown as `hex-opcode:debug-text`
    OpaqueFallback { text: String },
}

impl Surrogate {
    /// Pick the surrogate for an instruction
    ///
    /// This never fails: anything unexpected is rendered through [`SurrogateKind::OpaqueFallback`].
    pub fn of(source: usize, insn: &Insn) -> Surrogate {
        Surrogate {
            source,
            kind: SurrogateKind::of(insn),
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self.kind, SurrogateKind::Label { .. })
    }

    pub fn is_jump(&self) -> bool {
        matches!(self.kind, SurrogateKind::Jump { .. })
    }

    /// Label name, if this is a label that has been named
    pub fn label_name(&self) -> Option<&str> {
        match &self.kind {
            SurrogateKind::Label { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Render the instruction to `out`, pushing any tokens it produces
    ///
    /// `start` is the offset at which the text is expected to begin. The returned offset is
    /// `start` plus the length this surrogate claims to have written, computed independently of
    /// `out`. `body` is the full list of surrogates of the method (used to name jump targets).
    pub fn write(
        &self,
        out: &mut String,
        tokens: &mut Vec<Token>,
        start: usize,
        body: &[Surrogate],
    ) -> Result<usize, Error> {
        match &self.kind {
            SurrogateKind::Simple { mnemonic }
            | SurrogateKind::ArrayAccess { mnemonic }
            | SurrogateKind::ReturnOrThrow { mnemonic } => {
                out.push_str(mnemonic);
                Ok(start + mnemonic.len())
            }

            SurrogateKind::LocalVarAccess { mnemonic, index } => {
                let index = index.to_string();
                out.push_str(mnemonic);
                out.push(' ');
                out.push_str(&index);
                Ok(start + mnemonic.len() + index.len() + 1)
            }

            SurrogateKind::IncrementLocal { index, amount } => {
                let index = index.to_string();
                let amount = format!("{:+}", amount);
                out.push_str("IINC ");
                out.push_str(&index);
                out.push(' ');
                out.push_str(&amount);
                Ok(start + index.len() + amount.len() + 6)
            }

            SurrogateKind::TypeOperand {
                mnemonic,
                descriptor,
                dimensions,
            } => {
                out.push_str(mnemonic);
                out.push(' ');
                out.push_str(descriptor);

                let descriptor_start = start + mnemonic.len() + 1;
                if let Some((offset, class_name)) = class_in_descriptor(descriptor) {
                    let class_start = descriptor_start + offset;
                    tokens.push(Token::class(class_start, class_start + class_name.len(), class_name)?);
                }

                let mut end = descriptor_start + descriptor.len();
                if let Some(dimensions) = dimensions {
                    let dimensions = dimensions.to_string();
                    out.push(' ');
                    out.push_str(&dimensions);
                    end += dimensions.len() + 1;
                }
                Ok(end)
            }

            SurrogateKind::ConstantLoad { text, .. } => {
                out.push_str(text);
                Ok(start + text.len())
            }

            SurrogateKind::FieldAccess {
                mnemonic,
                owner,
                name,
                descriptor,
            }
            | SurrogateKind::MethodCall {
                mnemonic,
                owner,
                name,
                descriptor,
            } => {
                out.push_str(mnemonic);
                out.push(' ');
                out.push_str(owner);
                out.push('.');
                out.push_str(name);
                out.push(' ');
                out.push_str(descriptor);

                let class_start = start + mnemonic.len() + 1;
                let class_end = class_start + owner.len();
                let member_start = class_end + 1;
                let member_end = member_start + name.len();

                // Array owners (eg. `[I.clone`) aren't classes
                if !owner.starts_with('[') {
                    tokens.push(Token::class(class_start, class_end, owner.as_str())?);
                }
                tokens.push(Token::member(
                    member_start,
                    member_end,
                    owner.as_str(),
                    name.as_str(),
                    descriptor.as_str(),
                )?);
                Ok(member_end + descriptor.len() + 1)
            }

            SurrogateKind::NewPrimitiveArray { array_type } => {
                let element = BaseType::from_array_code(*array_type).ok_or(Error::UnknownArrayType(*array_type))?;
                out.push_str("NEWARRAY ");
                out.push(element.descriptor_char());
                Ok(start + 10)
            }

            SurrogateKind::Jump { mnemonic, link, .. } => {
                let label_name = link
                    .and_then(|position| body.get(position))
                    .and_then(Surrogate::label_name)
                    .ok_or(Error::UnlinkedJump(self.source))?;
                out.push_str(mnemonic);
                out.push(' ');
                out.push_str(label_name);
                Ok(start + mnemonic.len() + label_name.len() + 1)
            }

            SurrogateKind::Label { id, name, .. } => {
                let name = name.as_deref().ok_or(Error::UnnamedLabel(*id))?;
                out.push_str(name);
                out.push(':');
                Ok(start + name.len() + 1)
            }

            SurrogateKind::OpaqueFallback { text } => {
                out.push_str(text);
                Ok(start + text.len())
            }
        }
    }
}

impl SurrogateKind {
    fn of(insn: &Insn) -> SurrogateKind {
        let opcode = insn.opcode;
        let mnemonic = opcodes::mnemonic(opcode);

        match (opcode, &insn.kind, mnemonic) {
            (NOP | POP..=SWAP | IADD..=LXOR | I2L..=DCMPG | ARRAYLENGTH | MONITORENTER | MONITOREXIT, InsnKind::Zero, Some(mnemonic)) => {
                SurrogateKind::Simple { mnemonic }
            }
            (IALOAD..=SALOAD | IASTORE..=SASTORE, InsnKind::Zero, Some(mnemonic)) => {
                SurrogateKind::ArrayAccess { mnemonic }
            }
            (IRETURN..=RETURN | ATHROW, InsnKind::Zero, Some(mnemonic)) => SurrogateKind::ReturnOrThrow { mnemonic },
            (ILOAD..=ALOAD | ISTORE..=ASTORE | RET, InsnKind::Var(index), Some(mnemonic)) => {
                SurrogateKind::LocalVarAccess { mnemonic, index: *index }
            }
            (IINC, InsnKind::Iinc { var, increment }, _) => SurrogateKind::IncrementLocal {
                index: *var,
                amount: *increment,
            },
            (ACONST_NULL..=DCONST_1, InsnKind::Zero, Some(mnemonic)) => SurrogateKind::ConstantLoad {
                text: mnemonic.to_owned(),
                value: String::from(implicit_constant(opcode)),
            },
            (BIPUSH | SIPUSH, InsnKind::Int(operand), Some(mnemonic)) => SurrogateKind::ConstantLoad {
                text: format!("{} {}", mnemonic, operand),
                value: operand.to_string(),
            },
            (LDC, InsnKind::Ldc(constant), _) => match ldc_value(constant) {
                Some((text, value)) => SurrogateKind::ConstantLoad {
                    text: format!("LDC {}", text),
                    value,
                },
                None => SurrogateKind::fallback(insn),
            },
            (NEW | ANEWARRAY | CHECKCAST | INSTANCEOF, InsnKind::Type(descriptor), Some(mnemonic)) => {
                SurrogateKind::TypeOperand {
                    mnemonic,
                    descriptor: descriptor.clone(),
                    dimensions: None,
                }
            }
            (MULTIANEWARRAY, InsnKind::MultiANewArray { descriptor, dimensions }, Some(mnemonic)) => {
                SurrogateKind::TypeOperand {
                    mnemonic,
                    descriptor: descriptor.clone(),
                    dimensions: Some(*dimensions),
                }
            }
            (GETSTATIC..=PUTFIELD, InsnKind::Field { owner, name, descriptor }, Some(mnemonic)) => {
                SurrogateKind::FieldAccess {
                    mnemonic,
                    owner: owner.clone(),
                    name: name.clone(),
                    descriptor: descriptor.clone(),
                }
            }
            (
                INVOKEVIRTUAL..=INVOKEINTERFACE,
                InsnKind::Method {
                    owner, name, descriptor,
                },
                Some(mnemonic),
            ) => SurrogateKind::MethodCall {
                mnemonic,
                owner: owner.clone(),
                name: name.clone(),
                descriptor: descriptor.clone(),
            },
            (NEWARRAY, InsnKind::Int(array_type), _) => SurrogateKind::NewPrimitiveArray {
                array_type: *array_type,
            },
            (IFEQ..=JSR | IFNULL | IFNONNULL, InsnKind::Jump(target), Some(mnemonic)) => SurrogateKind::Jump {
                mnemonic,
                target: *target,
                link: None,
            },
            (PSEUDO, InsnKind::Label(id), _) => SurrogateKind::Label {
                id: *id,
                name: None,
                backreferences: vec![],
            },

            // Switches and call sites are shown as-is until a later stage can resugar them
            (TABLESWITCH | LOOKUPSWITCH | INVOKEDYNAMIC | PSEUDO, _, _) => SurrogateKind::fallback(insn),

            _ => {
                log::warn!(
                    "Unknown opcode: {} ({:X}); {:?}",
                    opcode,
                    opcode,
                    insn.kind
                );
                SurrogateKind::fallback(insn)
            }
        }
    }

    fn fallback(insn: &Insn) -> SurrogateKind {
        SurrogateKind::OpaqueFallback {
            text: format!("{:x}:{}", insn.opcode, insn),
        }
    }

    /// Is this an array or local variable store?
    ///
    /// Store mnemonics are recognizable by length alone: 7 characters for array stores
    /// (`IASTORE`), 6 for local variable stores (`ISTORE`).
    pub fn is_store(&self) -> bool {
        match self {
            SurrogateKind::ArrayAccess { mnemonic } => mnemonic.len() == 7,
            SurrogateKind::LocalVarAccess { mnemonic, .. } => mnemonic.len() == 6,
            _ => false,
        }
    }

    /// Source spelling of the constant pushed, for constant loads
    pub fn constant_value(&self) -> Option<&str> {
        match self {
            SurrogateKind::ConstantLoad { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Value pushed by the `xCONST_n` and `ACONST_NULL` instructions
fn implicit_constant(opcode: i32) -> &'static str {
    match opcode {
        ACONST_NULL => "null",
        ICONST_M1 => "-1",
        ICONST_0 => "0",
        ICONST_1 => "1",
        ICONST_2 => "2",
        ICONST_3 => "3",
        ICONST_4 => "4",
        ICONST_5 => "5",
        LCONST_0 => "0L",
        LCONST_1 => "1L",
        FCONST_0 => "0F",
        FCONST_1 => "1F",
        FCONST_2 => "2F",
        DCONST_0 => "0D",
        DCONST_1 => "1D",
        _ => "?",
    }
}

/// Operand text and source value of an `LDC`
///
/// Method handles and dynamic constants have no rendering of their own.
fn ldc_value(constant: &LdcConstant) -> Option<(String, String)> {
    let operand_and_value = |operand: String| Some((operand.clone(), operand));
    match constant {
        LdcConstant::Integer(integer) => operand_and_value(integer.to_string()),
        LdcConstant::Float(float) => operand_and_value(format!("{}F", java_float(*float))),
        LdcConstant::Long(long) => operand_and_value(format!("{}L", long)),
        LdcConstant::Double(double) => operand_and_value(format!("{}D", java_float(*double))),
        LdcConstant::String(string) => operand_and_value(quote_string(string)),
        LdcConstant::Type(descriptor) if descriptor.starts_with('(') => {
            Some((descriptor.clone(), descriptor.clone()))
        }
        LdcConstant::Type(class) => {
            let value = format!("{}.class", class_literal(class));
            Some((value.clone(), value))
        }
        LdcConstant::MethodHandle(_) | LdcConstant::Dynamic { .. } => None,
    }
}

/// Spell a floating point value the way `Double.toString` (or `Float.toString`) would
///
/// Magnitudes in `[1e-3, 1e7)` are written out in full, everything else gets a mantissa with at
/// least one fractional digit and an `E` exponent (eg. `1.0E10`, `-2.5E-4`).
fn java_float<F>(value: F) -> String
where
    F: Into<f64> + fmt::Debug + fmt::LowerExp + Copy,
{
    let wide: f64 = value.into();
    if wide.is_nan() {
        return String::from("NaN");
    } else if wide.is_infinite() {
        return String::from(if wide > 0.0 { "Infinity" } else { "-Infinity" });
    }

    let magnitude = wide.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{:?}", value);
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    if mantissa.contains('.') {
        format!("{}E{}", mantissa, exponent)
    } else {
        format!("{}.0E{}", mantissa, exponent)
    }
}

/// Quote a string, escaping backslashes, newlines and double quotes
fn quote_string(string: &str) -> String {
    let mut quoted = String::with_capacity(string.len() + 2);
    quoted.push('"');
    for c in string.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '"' => quoted.push_str("\\\""),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Source spelling of a class constant (internal name or array descriptor)
fn class_literal(class: &str) -> String {
    if class.starts_with('[') {
        if let Ok(array_type) = FieldType::<BinaryName>::parse(class) {
            return array_type.source_name();
        }
    }
    class.replace('/', ".")
}

/// Locate the class name inside a class operand
///
/// Returns the offset of the name within the operand along with the name. Plain internal names
/// are entirely a class name, object array descriptors have their `[`s, `L` and `;` stripped, and
/// primitive array descriptors have no class name.
fn class_in_descriptor(descriptor: &str) -> Option<(usize, &str)> {
    if descriptor.is_empty() {
        return None;
    }
    if !descriptor.starts_with('[') {
        return Some((0, descriptor));
    }
    let dimensions = descriptor.len() - descriptor.trim_start_matches('[').len();
    let element = &descriptor[dimensions..];
    match element.strip_prefix('L').and_then(|rest| rest.strip_suffix(';')) {
        Some(class_name) if !class_name.is_empty() => Some((dimensions + 1, class_name)),
        _ => None,
    }
}
