//! Command-line arguments and layered configuration loading for the `ts2c` binary.

use clap::Parser;
use config::FileFormat::Toml;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ts2c_core::Config;

/// Translates a source-language AST into C89.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Path to the input AST JSON file. Use `-` or omit to read from stdin.
    pub input: Option<PathBuf>,

    /// Path to write the emitted C to. Omit to write to stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Spaces per indentation level in the emitted C.
    #[arg(long)]
    pub indent_width: Option<usize>,

    /// Set a configuration value; format NAME=VALUE. May be repeated.
    #[arg(long, short, value_name = "NAME=VALUE")]
    pub config: Vec<String>,

    /// Print the location of the user config file and exit.
    #[arg(long)]
    pub print_config_path: bool,
}

/// Parses and validates the config, per the layering in [`load_config`]. Returns `None` only when
/// a flag calling for an early exit (`--print-config-path`) was given.
pub fn initialize(args: Arc<Args>) -> Option<Config> {
    let dirs = ProjectDirs::from("", "", "ts2c").expect("no home directory");
    if args.print_config_path {
        println!("Config file location: {:?}", config_file(dirs.config_dir()));
        return None;
    }
    Some(load_config(&args, dirs.config_dir()))
}

fn load_config(args: &Args, config_dir: &Path) -> Config {
    let mut settings = config::Config::builder()
        .add_source(config::File::from_str(
            include_str!("../default_config.toml"),
            Toml,
        ))
        .add_source(config::File::from(config_file(config_dir)).required(false))
        .add_source(config::File::from(PathBuf::from("translate.toml")).required(false));

    for entry in &args.config {
        let Some((name, value)) = entry.split_once('=') else {
            panic!("failed to parse config value {entry:?}; no '=' found");
        };
        settings = settings
            .set_override(name, value)
            .expect("settings override failed");
    }
    if let Some(width) = args.indent_width {
        settings = settings
            .set_override("indent_width", width as i64)
            .expect("settings override failed");
    }

    let mut config: Config = settings
        .build()
        .expect("failed to build settings")
        .try_deserialize()
        .expect("config deserialization failed");

    if let Some(input) = &args.input {
        if input != Path::new("-") {
            config.input = Some(input.clone());
        }
    }
    if let Some(output) = &args.output {
        config.output = Some(output.clone());
    }
    config
}

fn config_file(config_dir: &Path) -> PathBuf {
    [config_dir, "translate.toml".as_ref()].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;

    #[test]
    fn default_indent_width_comes_from_the_baked_in_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&Args::parse_from(["ts2c"]), dir.path());
        assert_eq!(config.indent_width, 2);
    }

    #[test]
    fn cli_flag_overrides_the_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(
            &Args::parse_from(["ts2c", "--indent-width", "4"]),
            dir.path(),
        );
        assert_eq!(config.indent_width, 4);
    }

    #[test]
    fn explicit_config_override_wins_over_cli_flag() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(
            &Args::parse_from([
                "ts2c",
                "--indent-width",
                "4",
                "--config",
                "indent_width=8",
            ]),
            dir.path(),
        );
        assert_eq!(config.indent_width, 8);
    }

    #[test]
    fn positional_input_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&Args::parse_from(["ts2c", "in.json"]), dir.path());
        assert_eq!(config.input, Some(PathBuf::from("in.json")));
    }

    #[test]
    fn a_dash_input_means_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&Args::parse_from(["ts2c", "-"]), dir.path());
        assert_eq!(config.input, None);
    }
}
