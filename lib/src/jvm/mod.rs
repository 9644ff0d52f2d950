//! Read and describe JVM classes
//!
//! ### Simple example
//!
//! Classes can be built directly in the structural model:
//!
//! ```
//! use tda::jvm::model::{ClassNode, FieldNode, Insn, MethodNode};
//! use tda::jvm::opcodes::RETURN;
//! use tda::jvm::*;
//!
//! let mut class = ClassNode::new(
//!     ClassAccessFlags::PUBLIC,
//!     BinaryName::from_string(String::from("me/alec/Point")).unwrap(),
//!     Some(BinaryName::OBJECT),
//! );
//! class.fields.push(FieldNode::new(
//!     FieldAccessFlags::PUBLIC | FieldAccessFlags::FINAL,
//!     UnqualifiedName::from_string(String::from("x")).unwrap(),
//!     "I",
//! ));
//!
//! let mut method = MethodNode::new(
//!     MethodAccessFlags::PUBLIC,
//!     UnqualifiedName::from_string(String::from("reset")).unwrap(),
//!     "()V",
//! );
//! method.instructions.push(Insn::zero(RETURN));
//! class.methods.push(method);
//! ```
//!
//! Or decoded out of `.class` files, using [`class_file::read_class`] or a [`ClassProvider`].

mod access_flags;
pub mod class_file;
mod descriptors;
mod errors;
pub mod model;
mod names;
pub mod opcodes;
mod provider;

pub use access_flags::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
pub use provider::*;
