//! Generates the cycle-stepped decoder of an emulated CPU.
//!
//! The generator takes an opcode description (see [`cyclegen_opcodes`]) and a host
//! template, and produces a source file containing:
//!
//! * one dispatch case per machine cycle of every opcode, each labelled with a step id
//!   that is unique across the whole routine ([`synth`]), and
//! * a 256-entry table mapping each opcode byte to its position in that routine
//!   ([`optable`]).
//!
//! A run is strictly sequential: load, synthesize, build the offset table, then merge
//! into the template and write the output ([`emit`]). Any error stops the run before the
//! output file is touched, and identical inputs always give byte-identical output.

use std::fs;
use std::io;
use std::path::PathBuf;

use cyclegen_opcodes::{LoadError, OpcodeTable};
use log::info;
use thiserror::Error;

pub mod config;
pub mod emit;
pub mod optable;
pub mod synth;
pub mod template;

pub use config::{CaseSyntax, GeneratorConfig};

use crate::optable::OffsetTable;

/// Number of spaces per indent level in generated code.
const TAB_WIDTH: usize = 4;

/// Whitespace for the given indent level.
pub(crate) fn tab(level: usize) -> String {
    " ".repeat(TAB_WIDTH * level)
}

/// Errors that stop a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The opcode description could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// A value the generator relies on was absent. This indicates a broken description
    /// or a bug, never a condition to recover from.
    #[error("Expected valid value for {0}, found none")]
    MissingExpectedValue(String),
    /// Numbering an opcode's cases would run past the largest usable step id.
    #[error(
        "{needed} steps starting at step {first_step} run past the last step id {}",
        synth::MAX_STEP
    )]
    StepOverflow {
        /// First step id given to the opcode.
        first_step: u32,
        /// Number of cases the opcode needs.
        needed: u64,
    },
    /// Reading the template or writing the output failed.
    #[error("Error while accessing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Generate the complete output source for an already-loaded opcode table.
pub fn generate_from_table(
    table: &OpcodeTable,
    template: &str,
    first_step: u32,
    syntax: &CaseSyntax,
) -> Result<String, GenerateError> {
    let program = synth::synthesize(table, first_step)?;
    let offsets = OffsetTable::build(table, &program)?;
    Ok(emit::merge(template, &program.render(syntax), &offsets.render()))
}

/// Generate the complete output source from the text of a description document and a
/// template. Nothing is written.
pub fn generate(
    desc: &str,
    template: &str,
    config: &GeneratorConfig,
) -> Result<String, GenerateError> {
    let table = cyclegen_opcodes::load(desc)?;
    generate_from_table(&table, template, config.first_step, &config.syntax)
}

/// Run the generator end to end as configured, replacing the output file only if every
/// step succeeded.
pub fn run(config: &GeneratorConfig) -> Result<(), GenerateError> {
    let table = cyclegen_opcodes::load_file(&config.desc_path)?;
    let template = fs::read_to_string(&config.template_path).map_err(|source| {
        GenerateError::Io {
            path: config.template_path.clone(),
            source,
        }
    })?;
    let source = generate_from_table(&table, &template, config.first_step, &config.syntax)?;
    emit::write_output(&config.output_path, &source)?;
    info!(
        "generated decoder for {} opcodes into {}",
        table.defined_count(),
        config.output_path.display()
    );
    Ok(())
}
