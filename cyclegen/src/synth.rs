//! Synthesizes the dispatch cases of the decoder.
//!
//! Every machine cycle of every opcode becomes one case of a single shared dispatch
//! routine, numbered by a step id which is unique across the whole routine. The emulator
//! advances by exactly one step per clock tick, so an opcode only needs to know the step
//! id of its first case; everything after that is reached by incrementing the step.
//!
//! Opcodes are laid out in ascending opcode order and their cycles in declared order, so
//! the step ids of a run are a contiguous ascending range starting at the first step.

use std::fmt;

use cyclegen_opcodes::table::OPCODE_SLOTS;
use cyclegen_opcodes::{CycleKind, MachineCycle, OpcodeDef, OpcodeTable};
use log::debug;

use crate::config::CaseSyntax;
use crate::{tab, GenerateError};

/// Indent level of the generated cases inside the template's dispatch `switch`.
const CASE_INDENT: usize = 2;

/// Largest step id, including decoder offsets, that generated code may use. The host
/// keeps its step counter and offset table in 16-bit integers.
pub const MAX_STEP: u32 = u16::MAX as u32;

/// What a dispatch case does when its step is reached.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CaseBody {
    /// Fetch the next opcode byte and begin decoding it.
    Fetch,
    /// Run the action, if any, then fall through to the next step.
    Step(Option<String>),
    /// Consume a wait state without doing anything.
    Wait,
    /// Run the action, if any, then reset the step counter so the core returns to fetch.
    Finish(Option<String>),
}

impl CaseBody {
    /// Whether this case ends the opcode.
    pub fn is_finish(&self) -> bool {
        matches!(self, CaseBody::Finish(_))
    }

    /// Render the body as target code.
    pub fn render(&self, syntax: &CaseSyntax) -> String {
        let mut parts = Vec::with_capacity(3);
        let action = match self {
            CaseBody::Step(action) | CaseBody::Finish(action) => action.as_deref(),
            CaseBody::Fetch | CaseBody::Wait => None,
        };
        if let CaseBody::Fetch = self {
            parts.push(syntax.fetch.clone());
        }
        if let Some(action) = action {
            parts.push(format!("{};", action));
        }
        if self.is_finish() {
            parts.push(syntax.finish.clone());
        }
        parts.push(syntax.end.clone());
        parts.join(" ")
    }
}

/// A single numbered dispatch case.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DecoderCase {
    pub step: u32,
    pub body: CaseBody,
}

/// Entries of the generated dispatch routine, in output order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DecoderEntry {
    /// Separator naming the opcode whose cases follow.
    Header { opcode: u8, name: String },
    Case(DecoderCase),
}

/// The cases synthesized for a single opcode.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OpcodeSteps {
    /// Cases in step order.
    pub cases: Vec<DecoderCase>,
    /// Step id immediately after the opcode's final case. `None` if the opcode does not
    /// end in a generic cycle, in which case it never returns to fetch.
    pub decoder_offset: Option<u32>,
    /// First step id available to the next opcode.
    pub next_step: u32,
}

/// Hands out consecutive step ids while collecting the cases they label.
struct StepCounter {
    next: u32,
    cases: Vec<DecoderCase>,
}

impl StepCounter {
    fn new(first_step: u32) -> Self {
        Self {
            next: first_step,
            cases: Vec::new(),
        }
    }

    fn add(&mut self, body: CaseBody) -> Result<(), GenerateError> {
        let next = self
            .next
            .checked_add(1)
            .filter(|&next| next <= MAX_STEP)
            .ok_or_else(|| GenerateError::StepOverflow {
                first_step: self.next,
                needed: 1,
            })?;
        self.cases.push(DecoderCase {
            step: self.next,
            body,
        });
        self.next = next;
        Ok(())
    }
}

/// Number of cases `op` expands to, given its final cycle is `last`.
fn case_count(leading: &[MachineCycle], last: &MachineCycle) -> u64 {
    let tail = match last.kind {
        CycleKind::Generic if last.wait_states > 0 => u64::from(last.wait_states) + 1,
        CycleKind::Generic | CycleKind::Fetch => 1,
    };
    leading.len() as u64 + tail
}

/// Synthesize the cases for `op`, numbering them from `first_step`.
pub fn synthesize_opcode(
    op: &OpcodeDef,
    first_step: u32,
) -> Result<OpcodeSteps, GenerateError> {
    let (last, leading) = op.mcycles.split_last().ok_or_else(|| {
        GenerateError::MissingExpectedValue(format!("machine cycles of op {}", op))
    })?;

    let needed = case_count(leading, last);
    if u64::from(first_step) + needed > u64::from(MAX_STEP) {
        return Err(GenerateError::StepOverflow { first_step, needed });
    }

    let mut counter = StepCounter::new(first_step);
    for cycle in leading {
        counter.add(leading_body(cycle))?;
    }

    let decoder_offset = match last.kind {
        CycleKind::Fetch => {
            counter.add(CaseBody::Fetch)?;
            None
        }
        CycleKind::Generic if last.wait_states == 0 => {
            counter.add(CaseBody::Finish(last.action.clone()))?;
            Some(counter.next)
        }
        CycleKind::Generic => {
            counter.add(CaseBody::Step(last.action.clone()))?;
            // The action's own case accounts for the first wait state.
            for _ in 1..last.wait_states {
                counter.add(CaseBody::Wait)?;
            }
            counter.add(CaseBody::Finish(None))?;
            Some(counter.next)
        }
    };

    Ok(OpcodeSteps {
        cases: counter.cases,
        decoder_offset,
        next_step: counter.next,
    })
}

/// Body of a cycle which is not the last one of its opcode.
fn leading_body(cycle: &MachineCycle) -> CaseBody {
    match cycle.kind {
        CycleKind::Fetch => CaseBody::Fetch,
        CycleKind::Generic => CaseBody::Step(cycle.action.clone()),
    }
}

/// The complete dispatch routine for an opcode table.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DecoderProgram {
    first_step: u32,
    next_step: u32,
    entries: Vec<DecoderEntry>,
    offsets: Box<[Option<u32>; OPCODE_SLOTS]>,
}

impl DecoderProgram {
    /// Step id of the first generated case.
    pub fn first_step(&self) -> u32 {
        self.first_step
    }

    /// Step id following the last generated case.
    pub fn next_step(&self) -> u32 {
        self.next_step
    }

    /// All entries in output order.
    pub fn entries(&self) -> &[DecoderEntry] {
        &self.entries
    }

    /// All cases in output order.
    pub fn cases(&self) -> impl Iterator<Item = &DecoderCase> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            DecoderEntry::Case(case) => Some(case),
            DecoderEntry::Header { .. } => None,
        })
    }

    /// Recorded decoder offset for `opcode`. `None` for undefined opcodes and for opcodes
    /// which do not end in a generic cycle.
    pub fn decoder_offset(&self, opcode: u8) -> Option<u32> {
        self.offsets[opcode as usize]
    }

    /// Render the decode block with the given syntax.
    pub fn render(&self, syntax: &CaseSyntax) -> String {
        DecodeBlock {
            program: self,
            syntax,
        }
        .to_string()
    }
}

/// Display adapter rendering a [`DecoderProgram`] as target code.
struct DecodeBlock<'a> {
    program: &'a DecoderProgram,
    syntax: &'a CaseSyntax,
}

impl fmt::Display for DecodeBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let indent = tab(CASE_INDENT);
        for entry in &self.program.entries {
            match entry {
                DecoderEntry::Header { opcode, name } => {
                    writeln!(f)?;
                    writeln!(f, "{}// {:02X}: {}", indent, opcode, name)?;
                }
                DecoderEntry::Case(case) => {
                    writeln!(
                        f,
                        "{}case {:4}: {}",
                        indent,
                        case.step,
                        case.body.render(self.syntax)
                    )?;
                }
            }
        }
        Ok(())
    }
}

/// Synthesize the whole dispatch routine for `table`, numbering steps from `first_step`.
///
/// Undefined slots produce no cases. Each defined opcode continues numbering where the
/// previous one stopped.
pub fn synthesize(
    table: &OpcodeTable,
    first_step: u32,
) -> Result<DecoderProgram, GenerateError> {
    let mut program = DecoderProgram {
        first_step,
        next_step: first_step,
        entries: Vec::new(),
        offsets: Box::new([None; OPCODE_SLOTS]),
    };
    for op in table.defined() {
        let steps = synthesize_opcode(op, program.next_step)?;
        debug!(
            "{}: steps {}..{}, offset {:?}",
            op, program.next_step, steps.next_step, steps.decoder_offset
        );
        program.entries.push(DecoderEntry::Header {
            opcode: op.opcode,
            name: op.name.clone(),
        });
        program
            .entries
            .extend(steps.cases.into_iter().map(DecoderEntry::Case));
        program.offsets[op.opcode as usize] = steps.decoder_offset;
        program.next_step = steps.next_step;
    }
    Ok(program)
}
