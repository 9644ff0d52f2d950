use crate::jvm::class_file::{find_attribute, Code, ConstantIndex, ConstantPool, Deserialize, LineNumberTable};
use crate::jvm::model::{Insn, InsnKind, LabelId};
use crate::jvm::opcodes::*;
use crate::jvm::{ClassFormatError, Error};
use byteorder::ReadBytesExt;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;

/// Decode a `Code` attribute into a flat list of model instructions
///
/// The instructions come out normalised: `xLOAD_n`/`xSTORE_n` become their indexed forms, `WIDE`
/// is folded into the operand, `LDC_W`/`LDC2_W` become `LDC` and `GOTO_W`/`JSR_W` become
/// `GOTO`/`JSR`. A label is emitted in front of every jump or switch target, every exception
/// table boundary and every line number start. Labels are numbered in bytecode order.
pub fn decode_code(code: &Code, constants: &ConstantPool) -> Result<Vec<Insn>, Error> {
    let code_length = code.code_array.len();
    let decoded = decode_instructions(&code.code_array, constants)?;

    // Offsets that need labels
    let mut targets: BTreeSet<usize> = BTreeSet::new();
    for (_, insn) in &decoded {
        for target in jump_targets(&insn.kind) {
            targets.insert(target.0);
        }
    }
    for handler in &code.exception_table {
        for offset in [handler.start_pc, handler.end_pc, handler.handler_pc] {
            targets.insert(check_offset(offset as i64, code_length, true)?);
        }
    }
    let mut line_numbers: BTreeMap<usize, Vec<u16>> = BTreeMap::new();
    if let Some(LineNumberTable(entries)) = find_attribute::<LineNumberTable>(&code.attributes, constants)? {
        for entry in entries {
            let offset = check_offset(entry.start_pc as i64, code_length, false)?;
            targets.insert(offset);
            line_numbers.entry(offset).or_default().push(entry.line_number);
        }
    }

    // Label identities follow bytecode order
    let labels: BTreeMap<usize, LabelId> = targets
        .iter()
        .enumerate()
        .map(|(id, offset)| (*offset, LabelId(id)))
        .collect();
    log::trace!(
        "decoded {} instructions ({} bytes) with {} labels",
        decoded.len(),
        code_length,
        labels.len()
    );

    let mut instructions = Vec::with_capacity(decoded.len() + 2 * labels.len());
    let emit_labels = |offset: usize, instructions: &mut Vec<Insn>| {
        if let Some(label) = labels.get(&offset) {
            instructions.push(Insn::label(*label));
            for line in line_numbers.get(&offset).into_iter().flatten() {
                instructions.push(Insn::line_number(*line, *label));
            }
        }
    };
    for (offset, mut insn) in decoded {
        emit_labels(offset, &mut instructions);
        relabel(&mut insn.kind, &labels);
        instructions.push(insn);
    }
    emit_labels(code_length, &mut instructions);

    Ok(instructions)
}

/// Check that a bytecode offset lands inside the code (or just past its end, for range ends)
fn check_offset(target: i64, code_length: usize, allow_end: bool) -> Result<usize, Error> {
    let limit = if allow_end { code_length as i64 } else { code_length as i64 - 1 };
    if target < 0 || target > limit {
        Err(Error::ClassFormat(ClassFormatError::InvalidCodeOffset { target, code_length }))
    } else {
        Ok(target as usize)
    }
}

/// Labels referenced by an instruction
///
/// During decoding, label identities temporarily hold raw bytecode offsets.
fn jump_targets(kind: &InsnKind) -> Vec<LabelId> {
    match kind {
        InsnKind::Jump(target) => vec![*target],
        InsnKind::TableSwitch { default, targets, .. } | InsnKind::LookupSwitch { default, targets, .. } => {
            let mut all = targets.clone();
            all.push(*default);
            all
        }
        _ => vec![],
    }
}

/// Replace raw offsets with the final label identities
fn relabel(kind: &mut InsnKind, labels: &BTreeMap<usize, LabelId>) {
    let lookup = |label: &mut LabelId| {
        if let Some(id) = labels.get(&label.0) {
            *label = *id;
        }
    };
    match kind {
        InsnKind::Jump(target) => lookup(target),
        InsnKind::TableSwitch { default, targets, .. } | InsnKind::LookupSwitch { default, targets, .. } => {
            lookup(default);
            targets.iter_mut().for_each(lookup);
        }
        _ => (),
    }
}

/// Decode every instruction, along with its offset
fn decode_instructions(bytes: &[u8], constants: &ConstantPool) -> Result<Vec<(usize, Insn)>, Error> {
    let code_length = bytes.len();
    let mut reader = Cursor::new(bytes);
    let mut instructions = vec![];

    while (reader.position() as usize) < code_length {
        let offset = reader.position() as usize;
        let opcode = u8::deserialize(&mut reader)?;
        let insn = decode_instruction(opcode, offset, &mut reader, constants)?;
        instructions.push((offset, insn));
    }

    Ok(instructions)
}

fn decode_instruction(
    opcode: u8,
    offset: usize,
    reader: &mut Cursor<&[u8]>,
    constants: &ConstantPool,
) -> Result<Insn, Error> {
    let code_length = reader.get_ref().len();
    let jump = |relative: i64| -> Result<LabelId, Error> {
        check_offset(offset as i64 + relative, code_length, false).map(LabelId)
    };

    let op = opcode as i32;
    Ok(match op {
        NOP..=DCONST_1 => Insn::zero(op),
        BIPUSH => Insn::int(op, i8::deserialize(reader)? as i32),
        SIPUSH => Insn::int(op, i16::deserialize(reader)? as i32),
        LDC => {
            let index = u8::deserialize(reader)? as u16;
            Insn::ldc(constants.loadable(ConstantIndex(index))?)
        }
        LDC_W | LDC2_W => Insn::ldc(constants.loadable(ConstantIndex::deserialize(reader)?)?),
        ILOAD..=ALOAD | ISTORE..=ASTORE | RET => Insn::var(op, u8::deserialize(reader)? as u16),
        ILOAD_0..=ALOAD_3 => Insn::var(ILOAD + (op - ILOAD_0) / 4, ((op - ILOAD_0) % 4) as u16),
        ISTORE_0..=ASTORE_3 => Insn::var(ISTORE + (op - ISTORE_0) / 4, ((op - ISTORE_0) % 4) as u16),
        IALOAD..=SALOAD | IASTORE..=LXOR | I2L..=DCMPG => Insn::zero(op),
        IINC => {
            let var = u8::deserialize(reader)? as u16;
            let increment = i8::deserialize(reader)? as i16;
            Insn::iinc(var, increment)
        }
        IFEQ..=JSR | IFNULL | IFNONNULL => Insn::jump(op, jump(i16::deserialize(reader)? as i64)?),
        GOTO_W => Insn::jump(GOTO, jump(i32::deserialize(reader)? as i64)?),
        JSR_W => Insn::jump(JSR, jump(i32::deserialize(reader)? as i64)?),
        TABLESWITCH => {
            skip_padding(reader)?;
            let default = jump(i32::deserialize(reader)? as i64)?;
            let low = i32::deserialize(reader)?;
            let high = i32::deserialize(reader)?;
            let mut targets = vec![];
            for _ in low as i64..=high as i64 {
                targets.push(jump(i32::deserialize(reader)? as i64)?);
            }
            Insn::new(op, InsnKind::TableSwitch { low, high, default, targets })
        }
        LOOKUPSWITCH => {
            skip_padding(reader)?;
            let default = jump(i32::deserialize(reader)? as i64)?;
            let pairs = i32::deserialize(reader)?;
            let mut keys = vec![];
            let mut targets = vec![];
            for _ in 0..pairs.max(0) {
                keys.push(i32::deserialize(reader)?);
                targets.push(jump(i32::deserialize(reader)? as i64)?);
            }
            Insn::new(op, InsnKind::LookupSwitch { default, keys, targets })
        }
        IRETURN..=RETURN | ARRAYLENGTH | ATHROW | MONITORENTER | MONITOREXIT => Insn::zero(op),
        GETSTATIC..=PUTFIELD => {
            let field = constants.field_ref(ConstantIndex::deserialize(reader)?)?;
            Insn::field(op, field.owner, field.name, field.descriptor)
        }
        INVOKEVIRTUAL..=INVOKEINTERFACE => {
            let index = ConstantIndex::deserialize(reader)?;
            let method = constants.method_ref(index)?;
            if op == INVOKEINTERFACE {
                if !method.is_interface {
                    return Err(Error::ClassFormat(ClassFormatError::ConstantTypeMismatch {
                        index: index.0,
                        expected: "InterfaceMethodref",
                    }));
                }
                // Argument count and a zero byte
                u8::deserialize(reader)?;
                u8::deserialize(reader)?;
            }
            Insn::method(op, method.owner, method.name, method.descriptor)
        }
        INVOKEDYNAMIC => {
            let (name, descriptor, bootstrap_method) = constants.invoke_dynamic(ConstantIndex::deserialize(reader)?)?;
            u16::deserialize(reader)?;
            Insn::new(
                op,
                InsnKind::InvokeDynamic {
                    name,
                    descriptor,
                    bootstrap_method,
                },
            )
        }
        NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => {
            let class = constants.class_name(ConstantIndex::deserialize(reader)?)?;
            Insn::type_insn(op, class)
        }
        NEWARRAY => Insn::int(op, u8::deserialize(reader)? as i32),
        WIDE => {
            let widened = u8::deserialize(reader)?;
            match widened as i32 {
                IINC => {
                    let var = u16::deserialize(reader)?;
                    let increment = i16::deserialize(reader)?;
                    Insn::iinc(var, increment)
                }
                wide_op @ (ILOAD..=ALOAD | ISTORE..=ASTORE | RET) => Insn::var(wide_op, u16::deserialize(reader)?),
                _ => return Err(Error::ClassFormat(ClassFormatError::InvalidWideOpcode(widened))),
            }
        }
        MULTIANEWARRAY => {
            let descriptor = constants.class_name(ConstantIndex::deserialize(reader)?)?.to_owned();
            let dimensions = u8::deserialize(reader)?;
            Insn::new(op, InsnKind::MultiANewArray { descriptor, dimensions })
        }
        _ => return Err(Error::ClassFormat(ClassFormatError::UnrecognizedOpcode { opcode, offset })),
    })
}

/// Switch operands start on the next offset that is a multiple of 4
fn skip_padding(reader: &mut Cursor<&[u8]>) -> Result<(), Error> {
    while reader.position() % 4 != 0 {
        u8::deserialize(reader)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn empty_pool() -> ConstantPool {
        ConstantPool::deserialize(&mut Cursor::new(&[0x00, 0x01][..])).unwrap()
    }

    fn code(bytes: &[u8]) -> Code {
        Code {
            max_stack: 4,
            max_locals: 4,
            code_array: bytes.to_vec(),
            exception_table: vec![],
            attributes: vec![],
        }
    }

    #[test]
    fn normalised_forms() {
        let insns = decode_code(
            &code(&[
                0x2a, // aload_0
                0x3d, // istore_2
                0xc4, 0x16, 0x01, 0x00, // wide lload 256
                0xc4, 0x84, 0x00, 0x05, 0xff, 0xfe, // wide iinc 5 -2
                0x84, 0x01, 0xff, // iinc 1 -1
                0xb1, // return
            ]),
            &empty_pool(),
        )
        .unwrap();

        assert_eq!(
            insns,
            vec![
                Insn::var(ALOAD, 0),
                Insn::var(ISTORE, 2),
                Insn::var(LLOAD, 256),
                Insn::iinc(5, -2),
                Insn::iinc(1, -1),
                Insn::zero(RETURN),
            ]
        );
    }

    #[test]
    fn labels_in_bytecode_order() {
        let insns = decode_code(
            &code(&[
                0xa7, 0x00, 0x04, // goto +4
                0x00, // nop
                0xc8, 0xff, 0xff, 0xff, 0xfc, // goto_w -4
            ]),
            &empty_pool(),
        )
        .unwrap();

        assert_eq!(
            insns,
            vec![
                Insn::label(LabelId(0)),
                Insn::jump(GOTO, LabelId(1)),
                Insn::zero(NOP),
                Insn::label(LabelId(1)),
                Insn::jump(GOTO, LabelId(0)),
            ]
        );
    }

    #[test]
    fn table_switch_padding() {
        let insns = decode_code(
            &code(&[
                0x1a, // iload_0
                0xaa, 0x00, 0x00, // tableswitch + padding
                0x00, 0x00, 0x00, 0x17, // default: +23
                0x00, 0x00, 0x00, 0x00, // low
                0x00, 0x00, 0x00, 0x01, // high
                0x00, 0x00, 0x00, 0x17, // 0: +23
                0x00, 0x00, 0x00, 0x18, // 1: +24
                0xb1, // return
                0xb1, // return
            ]),
            &empty_pool(),
        )
        .unwrap();

        assert_eq!(
            insns,
            vec![
                Insn::var(ILOAD, 0),
                Insn::new(
                    TABLESWITCH,
                    InsnKind::TableSwitch {
                        low: 0,
                        high: 1,
                        default: LabelId(0),
                        targets: vec![LabelId(0), LabelId(1)],
                    }
                ),
                Insn::label(LabelId(0)),
                Insn::zero(RETURN),
                Insn::label(LabelId(1)),
                Insn::zero(RETURN),
            ]
        );
    }

    #[test]
    fn interface_method_calls() {
        #[rustfmt::skip]
        let pool = ConstantPool::deserialize(&mut Cursor::new(&[
            0x00, 0x08,
            0x01, 0x00, 0x03, b'a', b'/', b'I', // #1 Utf8 a/I
            0x07, 0x00, 0x01, // #2 Class a/I
            0x01, 0x00, 0x01, b'm', // #3 Utf8 m
            0x01, 0x00, 0x03, b'(', b')', b'V', // #4 Utf8 ()V
            0x0c, 0x00, 0x03, 0x00, 0x04, // #5 NameAndType m ()V
            0x0b, 0x00, 0x02, 0x00, 0x05, // #6 InterfaceMethodref
            0x0a, 0x00, 0x02, 0x00, 0x05, // #7 Methodref
        ][..]))
        .unwrap();

        let insns = decode_code(
            &code(&[
                0xb9, 0x00, 0x06, 0x01, 0x00, // invokeinterface #6 1
                0xb8, 0x00, 0x06, // invokestatic #6
                0xb8, 0x00, 0x07, // invokestatic #7
            ]),
            &pool,
        )
        .unwrap();
        assert_eq!(
            insns,
            vec![
                Insn::method(INVOKEINTERFACE, "a/I", "m", "()V"),
                Insn::method(INVOKESTATIC, "a/I", "m", "()V"),
                Insn::method(INVOKESTATIC, "a/I", "m", "()V"),
            ]
        );

        // `invokeinterface` needs an `InterfaceMethodref`
        assert!(matches!(
            decode_code(&code(&[0xb9, 0x00, 0x07, 0x01, 0x00]), &pool),
            Err(Error::ClassFormat(ClassFormatError::ConstantTypeMismatch {
                index: 7,
                expected: "InterfaceMethodref"
            }))
        ));
    }

    #[test]
    fn malformed_code() {
        // Jump past the end
        assert!(matches!(
            decode_code(&code(&[0xa7, 0x00, 0x10]), &empty_pool()),
            Err(Error::ClassFormat(ClassFormatError::InvalidCodeOffset { target: 16, code_length: 3 }))
        ));

        // Reserved opcode
        assert!(matches!(
            decode_code(&code(&[0x00, 0xca]), &empty_pool()),
            Err(Error::ClassFormat(ClassFormatError::UnrecognizedOpcode { opcode: 0xca, offset: 1 }))
        ));

        // Truncated operand
        assert!(matches!(
            decode_code(&code(&[0x10]), &empty_pool()),
            Err(Error::ClassFormat(ClassFormatError::UnexpectedEof))
        ));

        // Only loads, stores, `ret` and `iinc` can be widened
        assert!(matches!(
            decode_code(&code(&[0xc4, 0x60]), &empty_pool()),
            Err(Error::ClassFormat(ClassFormatError::InvalidWideOpcode(0x60)))
        ));
    }
}
