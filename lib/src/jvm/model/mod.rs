//! Structural representation of classes, as handed to the renderer
//!
//! The model is shaped like a tree-style bytecode model: members keep their raw access bits and
//! descriptors, and method bodies are flat lists of [`Insn`] in which labels, line numbers and
//! frames appear as pseudo-instructions with opcode [`PSEUDO`](crate::jvm::opcodes::PSEUDO).
//!
//!   - __Class__ is represented using [`ClassNode`]
//!   - __Method__ is represented using [`MethodNode`]
//!   - __Field__ is represented using [`FieldNode`]
//!   - __Instruction__ is represented using [`Insn`]

mod class;
mod field;
mod insn;
mod method;

pub use class::*;
pub use field::*;
pub use insn::*;
pub use method::*;
