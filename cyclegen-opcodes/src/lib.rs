//! Defines the opcodes consumed by the `cyclegen` decoder generator.
//!
//! An instruction set is described as a document mapping opcode names to their opcode byte
//! and the ordered list of machine cycles that make up the instruction. The [`load`]
//! module parses such a document into an [`OpcodeTable`][table::OpcodeTable], which
//! holds one optional [`OpcodeDef`][table::OpcodeDef] for every possible opcode byte.
//!
//! The [`desc`] module supplies the raw serde types of the document format.

pub mod desc;
pub mod load;
pub mod table;

pub use load::{load, load_file, LoadError};
pub use table::{CycleKind, MachineCycle, OpcodeDef, OpcodeTable};
