//! The in-memory opcode table.

use std::fmt;

use crate::desc::MachineCycleDesc;

/// Number of slots in an [`OpcodeTable`], one per possible opcode byte.
pub const OPCODE_SLOTS: usize = 256;

/// Which kind of machine cycle this is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CycleKind {
    /// Fetches the next opcode byte and begins decoding it.
    Fetch,
    /// Runs an action and/or consumes wait states.
    Generic,
}

/// One machine cycle of an opcode.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MachineCycle {
    pub kind: CycleKind,
    /// Verbatim action expression. Ignored for fetch cycles.
    pub action: Option<String>,
    /// Extra wait states. Only meaningful on the final cycle of an opcode.
    pub wait_states: u32,
}

impl MachineCycle {
    /// Create a fetch cycle.
    pub fn fetch() -> Self {
        Self {
            kind: CycleKind::Fetch,
            action: None,
            wait_states: 0,
        }
    }

    /// Create a generic cycle running the given action, with no wait states.
    pub fn generic(action: Option<impl Into<String>>) -> Self {
        Self {
            kind: CycleKind::Generic,
            action: action.map(Into::into),
            wait_states: 0,
        }
    }

    /// Set the number of wait states of this cycle.
    pub fn with_wait_states(mut self, wait_states: u32) -> Self {
        self.wait_states = wait_states;
        self
    }
}

impl From<MachineCycleDesc> for MachineCycle {
    fn from(desc: MachineCycleDesc) -> Self {
        let kind = if desc.is_fetch() {
            CycleKind::Fetch
        } else {
            CycleKind::Generic
        };
        Self {
            kind,
            action: desc.action,
            wait_states: desc.tcycles.unwrap_or(0),
        }
    }
}

/// Definition of a single opcode.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OpcodeDef {
    /// Name of the opcode, used in comments and diagnostics.
    pub name: String,
    /// The opcode byte, which is also the slot the opcode occupies in the table.
    pub opcode: u8,
    /// Machine cycles in execution order. Never empty for opcodes produced by the loader.
    pub mcycles: Vec<MachineCycle>,
}

impl fmt::Display for OpcodeDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02X}: {}", self.opcode, self.name)
    }
}

/// Table of opcode definitions indexed by opcode byte. Empty slots are undefined opcodes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OpcodeTable {
    slots: Box<[Option<OpcodeDef>; OPCODE_SLOTS]>,
}

impl OpcodeTable {
    /// Create a table with every opcode undefined.
    pub fn new() -> Self {
        Self {
            slots: Box::new(std::array::from_fn(|_| None)),
        }
    }

    /// Store `def` in the slot for its opcode byte, returning whatever was there before.
    pub fn insert(&mut self, def: OpcodeDef) -> Option<OpcodeDef> {
        let slot = &mut self.slots[def.opcode as usize];
        slot.replace(def)
    }

    /// Get the definition for the given opcode byte, if it is defined.
    pub fn get(&self, opcode: u8) -> Option<&OpcodeDef> {
        self.slots[opcode as usize].as_ref()
    }

    /// Iterate every slot in ascending opcode order.
    pub fn slots(&self) -> impl Iterator<Item = (u8, Option<&OpcodeDef>)> + '_ {
        (0u8..=0xff).map(move |opcode| (opcode, self.get(opcode)))
    }

    /// Iterate the defined opcodes in ascending opcode order.
    pub fn defined(&self) -> impl Iterator<Item = &OpcodeDef> + '_ {
        self.slots.iter().flatten()
    }

    /// Number of defined opcodes.
    pub fn defined_count(&self) -> usize {
        self.defined().count()
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}
