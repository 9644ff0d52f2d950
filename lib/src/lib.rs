//! Tokenizing disassembler for JVM classes
//!
//! A class is rendered into a pseudo-source listing (header, fields, and method bodies made up of
//! one bytecode instruction per line) and, at the same time, every identifier in that listing is
//! bound to the class, field, or method it denotes. The result is a [`source::SourceIndex`] that a
//! browsing or renaming front end can use to map any byte offset in the text back to a symbol.
//!
//!   - [`jvm`] holds the structural class model, access flags, descriptors, and class file reading
//!   - [`source`] holds the instruction surrogates, label resolution, and the class renderer

pub mod jvm;
pub mod source;
mod util;
