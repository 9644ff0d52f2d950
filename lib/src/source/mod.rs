//! Render classes to tokenized text
//!
//! ### Simple example
//!
//! ```
//! use tda::jvm::model::{ClassNode, FieldNode};
//! use tda::jvm::*;
//! use tda::source::{Entry, TokenizingDisassembler};
//!
//! let mut class = ClassNode::new(
//!     ClassAccessFlags::PUBLIC,
//!     BinaryName::from_string(String::from("me/alec/Point")).unwrap(),
//!     Some(BinaryName::OBJECT),
//! );
//! class.fields.push(FieldNode::new(
//!     FieldAccessFlags::empty(),
//!     UnqualifiedName::from_string(String::from("x")).unwrap(),
//!     "I",
//! ));
//!
//! let provider: MemoryClassProvider = vec![class].into_iter().collect();
//! let disassembler = TokenizingDisassembler::new(provider);
//! let index = disassembler.source("me/alec/Point", None)?.index()?;
//!
//! assert_eq!(index.text(), "package me.alec;\n\npublic class Point {\n\tint x;\n}\n");
//! assert_eq!(
//!     index.entry_at(44),
//!     Some(&Entry::Field {
//!         owner: String::from("me/alec/Point"),
//!         name: String::from("x"),
//!         descriptor: String::from("I"),
//!     })
//! );
//! # Ok::<(), tda::source::Error>(())
//! ```
//!
//! Rendering goes through a couple stages:
//!
//!   - every instruction of a method body is turned into a [`Surrogate`]
//!   - jumps get linked to their labels, and unused labels are dropped ([`resolve_labels`])
//!   - the class is written out top to bottom, with [`Token`]s registered as identifiers go by
//!   - tokens are bound to [`Entry`]s to make a [`SourceIndex`]

mod disassembler;
mod errors;
mod index;
mod labels;
mod renderer;
mod surrogate;
mod token;

pub use disassembler::*;
pub use errors::*;
pub use index::*;
pub use labels::*;
pub use renderer::*;
pub use surrogate::*;
pub use token::*;
