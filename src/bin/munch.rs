//! Command line driver for the munch instruction selector.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use munch::{run_source, CostCache, SelectError};

#[derive(Parser, Debug)]
#[command(
    name = "munch",
    about = "Greedy tree-pattern instruction selection for a toy IR",
    version
)]
struct Args {
    /// Input files, one IR expression per non-blank line.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    // One cache for the whole run, so repeated tile shapes across files
    // reuse their sums.
    let mut cache = CostCache::new();
    let mut failed = false;

    for path in &args.inputs {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) => {
                let err = SelectError::Input {
                    path: path.display().to_string(),
                    source,
                };
                eprintln!("{err}");
                failed = true;
                continue;
            }
        };

        log::info!("📄 processing {}", path.display());
        let mut out = String::new();
        match run_source(&text, &mut cache, &mut out) {
            Ok(()) => print!("{out}"),
            Err(err) => {
                // Keep whatever was produced before the fault, drop the
                // rest of this file's lines.
                print!("{out}");
                eprintln!("processing of {} failed: {err}", path.display());
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
