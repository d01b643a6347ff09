use std::io::{Read, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use ts2c_transpile::cli::{self, Args};

fn main() -> ExitCode {
    let args = Arc::new(Args::parse());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(config) = cli::initialize(args) else {
        return ExitCode::SUCCESS;
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: ts2c_core::Config) -> Result<(), String> {
    let input = read_input(config.input.as_deref())?;
    let program: ts2c_ast::Program =
        serde_json::from_str(&input).map_err(|e| format!("failed to parse input AST: {e}"))?;

    let output = ts2c_transpile::transpile(&program, Arc::new(config.clone()))?;
    write_output(config.output.as_deref(), &output)
}

fn read_input(path: Option<&std::path::Path>) -> Result<String, String> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&std::path::Path>, text: &str) -> Result<(), String> {
    match path {
        Some(path) => std::fs::write(path, text).map_err(|e| format!("failed to write {}: {e}", path.display())),
        None => std::io::stdout()
            .write_all(text.as_bytes())
            .map_err(|e| format!("failed to write stdout: {e}")),
    }
}
