//! Configuration of a generation run.

use std::path::PathBuf;

/// Default path of the opcode description document.
pub const DEFAULT_DESC_PATH: &str = "mc6809e_desc.yml";
/// Default path of the host template.
pub const DEFAULT_TEMPLATE_PATH: &str = "mc6809e.template.h";
/// Default path the generated source is written to.
pub const DEFAULT_OUTPUT_PATH: &str = "../src/mc6809e.h";
/// First step id available to generated code. Steps below this are owned by the
/// template's own fetch and decode handling.
pub const FIRST_DECODER_STEP: u32 = 2;

/// Snippets of target-language syntax used to build dispatch case bodies.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CaseSyntax {
    /// Body of a fetch cycle.
    pub fetch: String,
    /// Statement that resets the step counter to the terminal marker, returning the
    /// core to opcode fetch.
    pub finish: String,
    /// Statement that ends a case and falls through to the next step on the next tick.
    pub end: String,
}

impl Default for CaseSyntax {
    fn default() -> Self {
        Self {
            fetch: "_FETCH();".to_string(),
            finish: "c->step = 0;".to_string(),
            end: "break;".to_string(),
        }
    }
}

/// Everything needed to run the generator end to end.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GeneratorConfig {
    pub desc_path: PathBuf,
    pub template_path: PathBuf,
    pub output_path: PathBuf,
    /// Step id given to the first generated case.
    pub first_step: u32,
    pub syntax: CaseSyntax,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            desc_path: DEFAULT_DESC_PATH.into(),
            template_path: DEFAULT_TEMPLATE_PATH.into(),
            output_path: DEFAULT_OUTPUT_PATH.into(),
            first_step: FIRST_DECODER_STEP,
            syntax: CaseSyntax::default(),
        }
    }
}
