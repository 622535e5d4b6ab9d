//! Command-line interface definition

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pqbench_harness::{OutputFormat, Preset, UnitMode};

#[derive(Parser, Debug)]
#[command(name = "pqbench")]
#[command(
    version,
    about = "Timing harness for classical and post-quantum key exchange and signatures"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a sweep and report trimmed statistics
    Run(RunArgs),
    /// Print key, signature and ciphertext sizes
    Sizes(SizesArgs),
    /// Check a sweep file against its provider without timing anything
    Validate(ValidateArgs),
    /// List built-in presets
    Presets,
}

/// Where the sweep comes from.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SweepSource {
    /// TOML sweep file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Built-in preset (see `pqbench presets`)
    #[arg(short, long)]
    pub preset: Option<Preset>,
}

/// Settings layered over the file or preset.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Measurement mode: time (process CPU, microseconds) or cycles
    #[arg(short, long)]
    pub unit: Option<UnitMode>,

    /// Iterations per (variant, operation)
    #[arg(short = 'n', long)]
    pub iterations: Option<usize>,

    /// Assumed CPU frequency in Hz for cycle units
    #[arg(long)]
    pub cpu_frequency: Option<f64>,

    /// Message to sign, read from a file
    #[arg(short, long)]
    pub message: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SweepSource,

    #[command(flatten)]
    pub overrides: Overrides,

    /// Directory for chart files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Report format: console, json, json_pretty or markdown
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Write the final report to a file instead of stdout
    #[arg(long)]
    pub output_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SizesArgs {
    #[command(flatten)]
    pub source: SweepSource,

    /// Message to sign, read from a file
    #[arg(short, long)]
    pub message: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: SweepSource,

    #[command(flatten)]
    pub overrides: Overrides,

    /// Print the resolved sweep as TOML
    #[arg(long)]
    pub print: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(line: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(line.split_whitespace())
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_with_preset_and_overrides() {
        let line = "pqbench run --preset kex-pq --unit cycles -n 30 --format json --no-charts";
        let cli = parse(line).unwrap();

        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.source.preset, Some(Preset::KexPq));
        assert_eq!(args.overrides.unit, Some(UnitMode::Cycles));
        assert_eq!(args.overrides.iterations, Some(30));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(args.no_charts);
    }

    #[test]
    fn test_config_and_preset_are_exclusive() {
        assert!(parse("pqbench run --config a.toml --preset ecdsa").is_err());
        assert!(parse("pqbench run").is_err());
    }

    #[test]
    fn test_unknown_preset_rejected() {
        assert!(parse("pqbench sizes --preset rot13").is_err());
    }
}
