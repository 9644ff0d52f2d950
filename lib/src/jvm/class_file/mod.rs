//! Decoding of the binary `class` file format into the structural model

mod attribute;
mod binary_format;
mod bytecode;
mod class;
mod constants;
mod member;
mod reader;

pub use attribute::*;
pub use binary_format::*;
pub use bytecode::*;
pub use class::*;
pub use constants::*;
pub use member::*;
pub use reader::*;
