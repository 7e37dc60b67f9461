use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cyclegen::config::{
    DEFAULT_DESC_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_TEMPLATE_PATH, FIRST_DECODER_STEP,
};
use cyclegen::GeneratorConfig;
use log::{error, info};

/// Cyclegen compiles an opcode description into a cycle-stepped decoder.
///
/// With no arguments, reads `mc6809e_desc.yml` and `mc6809e.template.h` from the current
/// directory and writes `../src/mc6809e.h`.
#[derive(Parser, Debug)]
struct Args {
    /// YAML document describing the machine cycles of each opcode.
    #[arg(short, long, default_value = DEFAULT_DESC_PATH)]
    desc: PathBuf,
    /// Host template containing the `$decode_block` and `$optable` placeholders.
    #[arg(short, long, default_value = DEFAULT_TEMPLATE_PATH)]
    template: PathBuf,
    /// File to write the generated source to. Replaced only if generation succeeds.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,
    /// Step id of the first generated case. Lower steps belong to the template.
    #[arg(long, default_value_t = FIRST_DECODER_STEP)]
    first_step: u32,
}

impl From<Args> for GeneratorConfig {
    fn from(args: Args) -> Self {
        GeneratorConfig {
            desc_path: args.desc,
            template_path: args.template,
            output_path: args.output,
            first_step: args.first_step,
            ..Default::default()
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = GeneratorConfig::from(Args::parse());

    match cyclegen::run(&config) {
        Ok(()) => {
            info!("done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
