//! Configuration for a single `ts2c` run.
//!
//! Built the way the host crate this workspace is modeled on builds its own `Config`: deserialized
//! from a layered `config::Config` (baked-in defaults, an optional project file, explicit
//! overrides) by the CLI, then handed to [`crate::type_helper`], [`crate::memory_manager`], and
//! [`crate::emitter`] as an `Arc<Config>`.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the input AST JSON file. `None` means read from stdin.
    pub input: Option<PathBuf>,
    /// Path to write the emitted C to. `None` means write to stdout.
    pub output: Option<PathBuf>,
    /// Spaces per indentation level in the emitted C.
    pub indent_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: None,
            output: None,
            indent_width: 2,
        }
    }
}
