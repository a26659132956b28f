#![allow(clippy::print_stdout)]
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use serde_json::Value;

/// Validate JSON documents against a JSON Schema.
#[derive(Parser)]
#[command(name = "conforma", version)]
struct Cli {
    /// Schema to validate against.
    schema: PathBuf,

    /// Instance document to check; repeat the flag to check several.
    #[arg(short = 'i', long = "instance", value_name = "FILE")]
    instances: Vec<PathBuf>,
}

fn load(path: &Path) -> Result<Value, String> {
    let contents =
        fs::read(path).map_err(|error| format!("cannot read {}: {error}", path.display()))?;
    serde_json::from_slice(&contents)
        .map_err(|error| format!("{} is not valid JSON: {error}", path.display()))
}

fn run(cli: &Cli) -> Result<bool, String> {
    let mut context = conforma::Context::new();
    let schema = context
        .parse(&load(&cli.schema)?)
        .map_err(|error| format!("Schema error: {error}"))?;

    let mut all_valid = true;
    for path in &cli.instances {
        let output = schema.validate(&load(path)?);
        let name = path.display();
        if output.valid() {
            println!("{name}: valid");
            continue;
        }
        all_valid = false;
        println!("{name}: invalid");
        for (index, error) in output.iter_errors().enumerate() {
            println!(
                "  {}. {} (at '{}', schema location '{}')",
                index + 1,
                error.error().unwrap_or_default(),
                error.instance_location(),
                error.keyword_location(),
            );
        }
    }
    Ok(all_valid)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
