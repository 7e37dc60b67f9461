//! Raw serde types for the opcode description document.
//!
//! The document is a mapping from opcode name to an [`OpcodeDesc`]:
//!
//! ```yaml
//! NEG_direct:
//!   id: 0x00
//!   mcycles:
//!     - type: fetch
//!     - type: generic
//!       action: "_neg(c, _GD())"
//!       tcycles: 3
//! ```
//!
//! These types only mirror the document. Turning them into an
//! [`OpcodeTable`][crate::table::OpcodeTable] (and rejecting invalid entries) is the job
//! of the [`load`][crate::load] module.

use serde::Deserialize;

/// Cycle type string which marks a fetch cycle. Every other type is a generic cycle.
pub const FETCH_TYPE: &str = "fetch";

/// Description of a single opcode, as written in the document.
#[derive(Debug, Clone, Deserialize)]
pub struct OpcodeDesc {
    /// The opcode byte. Kept wider than `u8` so out-of-range values can be reported by
    /// name instead of as a bare parse failure.
    pub id: i64,
    /// Machine cycles of the opcode, in execution order.
    #[serde(default)]
    pub mcycles: Option<Vec<MachineCycleDesc>>,
}

/// Description of a single machine cycle, as written in the document.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineCycleDesc {
    /// Cycle type, either [`FETCH_TYPE`] or anything else for a generic cycle.
    #[serde(rename = "type")]
    pub kind: String,
    /// Action expression, copied verbatim into the generated code.
    #[serde(default)]
    pub action: Option<String>,
    /// Extra wait states consumed by the final cycle of an opcode.
    #[serde(default)]
    pub tcycles: Option<u32>,
}

impl MachineCycleDesc {
    /// Whether this describes a fetch cycle.
    pub fn is_fetch(&self) -> bool {
        self.kind == FETCH_TYPE
    }
}
