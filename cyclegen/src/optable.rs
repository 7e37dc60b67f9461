//! Builds the 256-entry opcode offset table.
//!
//! The runtime looks up each decoded opcode byte in this table to find where that
//! opcode's steps are in the dispatch routine. Undefined opcodes map to 0.

use std::fmt;

use cyclegen_opcodes::OpcodeTable;

use crate::synth::DecoderProgram;
use crate::{tab, GenerateError};

/// Bias subtracted from each recorded decoder offset, aligning it with the runtime's own
/// step-zero convention.
pub const OFFSET_BIAS: i64 = 2;

const TABLE_INDENT: usize = 1;

/// A single row of the offset table.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum OffsetEntry {
    Undefined,
    Defined {
        opcode: u8,
        name: String,
        /// Biased offset written into the table.
        value: i64,
    },
}

impl OffsetEntry {
    /// Value written into the table for this entry.
    pub fn value(&self) -> i64 {
        match self {
            OffsetEntry::Undefined => 0,
            OffsetEntry::Defined { value, .. } => *value,
        }
    }
}

impl fmt::Display for OffsetEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OffsetEntry::Undefined => write!(f, "{:4},  // UNDEF", 0),
            OffsetEntry::Defined {
                opcode,
                name,
                value,
            } => write!(f, "{:4},  // {:02X}: {}", value, opcode, name),
        }
    }
}

/// The offset table, one entry per opcode byte in ascending order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OffsetTable {
    entries: Vec<OffsetEntry>,
}

impl OffsetTable {
    /// Build the table from the opcodes in `table` and the offsets recorded for them in
    /// `program`.
    ///
    /// Fails with [`GenerateError::MissingExpectedValue`] if a defined opcode has no
    /// recorded offset, which happens when its final machine cycle is a fetch.
    pub fn build(
        table: &OpcodeTable,
        program: &DecoderProgram,
    ) -> Result<Self, GenerateError> {
        let entries = table
            .slots()
            .map(|(opcode, def)| match def {
                None => Ok(OffsetEntry::Undefined),
                Some(def) => {
                    let offset = program.decoder_offset(opcode).ok_or_else(|| {
                        GenerateError::MissingExpectedValue(format!(
                            "decoder offset of op {}",
                            def
                        ))
                    })?;
                    Ok(OffsetEntry::Defined {
                        opcode,
                        name: def.name.clone(),
                        value: i64::from(offset) - OFFSET_BIAS,
                    })
                }
            })
            .collect::<Result<Vec<_>, GenerateError>>()?;
        Ok(Self { entries })
    }

    /// Entries in opcode order.
    pub fn entries(&self) -> &[OffsetEntry] {
        &self.entries
    }

    /// Entry for a single opcode.
    pub fn entry(&self, opcode: u8) -> &OffsetEntry {
        &self.entries[opcode as usize]
    }

    /// Render the table body, one newline-terminated row per opcode.
    pub fn render(&self) -> String {
        let indent = tab(TABLE_INDENT);
        self.entries
            .iter()
            .map(|entry| format!("{}{}\n", indent, entry))
            .collect()
    }
}
