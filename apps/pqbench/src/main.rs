//! pqbench binary
//!
//! Loads a sweep from a TOML file or a built-in preset, opens the requested
//! cryptography provider and runs the sweep. Reports go to stdout, logs to
//! stderr.

mod cli;

use std::fs;
use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pqbench_harness::clock::ClockSource;
use pqbench_harness::config::{BenchmarkSection, UnitName};
use pqbench_harness::reporter::{ConsoleReporter, ConsoleSink, SvgChartSink};
use pqbench_harness::{
    measure_sizes, Clock, ConfigError, CryptoProvider, OutputFormat, Preset, Reporter,
    SweepController, SweepFile, UnitMode,
};

use cli::{Cli, Command, Overrides, RunArgs, SizesArgs, SweepSource, ValidateArgs};

/// Open the provider named `$name` and evaluate `$body` with it bound to
/// `$provider`. Providers compiled out of this build are unknown.
macro_rules! with_provider {
    ($name:expr, $provider:ident => $body:expr) => {
        match $name {
            #[cfg(feature = "rustcrypto")]
            "rustcrypto" => {
                let $provider = pqbench_crypto::RustCryptoProvider::new();
                $body
            }
            #[cfg(feature = "openssl")]
            "openssl" => {
                let $provider = pqbench_crypto::OpenSslProvider::load()
                    .context("Failed to initialise OpenSSL")?;
                $body
            }
            #[cfg(feature = "oqs")]
            "oqs" => {
                let $provider = pqbench_crypto::OqsProvider::load()
                    .context("Failed to initialise liboqs")?;
                $body
            }
            other => {
                let enabled = pqbench_crypto::enabled_providers().join(", ");
                Err(ConfigError::UnknownProvider(other.to_string()))
                    .context(format!("providers enabled in this build: {enabled}"))
            }
        }
    };
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs on stderr; stdout carries only reports
    let filter = EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Sizes(args) => sizes(args),
        Command::Validate(args) => validate(args),
        Command::Presets => {
            print_presets();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut sweep = load_sweep(&args.source, args.overrides.unit)?;
    apply_overrides(&mut sweep, &args.overrides);
    if let Some(dir) = args.output_dir {
        sweep.output.directory = dir;
    }
    if let Some(format) = args.format {
        sweep.output.format = format;
    }
    if args.no_charts {
        sweep.output.charts = false;
    }
    sweep.validate()?;

    let message = load_message(&sweep.benchmark)?;
    info!(
        "Sweep '{}': provider {}, {} variants, {} iterations",
        sweep.benchmark.name,
        sweep.benchmark.provider,
        sweep.variants.len(),
        sweep.benchmark.iterations
    );

    let output_file = args.output_file.as_deref();
    with_provider!(sweep.benchmark.provider.as_str(), provider => {
        run_with(&provider, &sweep, &message, output_file)
    })
}

fn run_with<P: CryptoProvider>(
    provider: &P,
    sweep: &SweepFile,
    message: &[u8],
    output_file: Option<&Path>,
) -> Result<()> {
    let controller = SweepController::new(
        provider,
        sweep.benchmark_config()?,
        sweep.unit()?,
        Clock::new(sweep.benchmark.clock)?,
        message,
    )?
    .with_suite_name(sweep.benchmark.name.clone());

    let charts = if sweep.output.charts {
        let sink = SvgChartSink::new(&sweep.output.directory).with_context(|| {
            format!(
                "Failed to create chart directory: {}",
                sweep.output.directory.display()
            )
        })?;
        Some(sink)
    } else {
        None
    };
    let streaming = sweep.output.format == OutputFormat::Console && output_file.is_none();
    let console = streaming.then(|| ConsoleSink::new(io::stdout()));

    let mut sink = (charts, console);
    let report = controller.run_plan(&sweep.variant_plan(), &mut sink)?;

    if let (Some(charts), _) = &sink {
        info!(
            "{} charts written to {}",
            charts.written().len(),
            charts.directory().display()
        );
    }

    let failures = report.failures().count();
    if failures > 0 {
        info!(
            "{} operations had no valid samples after trimming",
            failures
        );
    }

    let reporter = Reporter::new(sweep.output.format);
    match output_file {
        Some(path) => {
            reporter.write_to_file(&report, path)?;
            info!("Report written to {}", path.display());
        }
        None if !streaming => reporter.report(&report)?,
        None => {}
    }

    info!("Sweep finished in {} ms", report.total_duration_ms);
    Ok(())
}

fn sizes(args: SizesArgs) -> Result<()> {
    let mut sweep = load_sweep(&args.source, None)?;
    if let Some(path) = args.message {
        sweep.benchmark.message_file = Some(path);
    }
    let message = load_message(&sweep.benchmark)?;
    let variants: Vec<_> = sweep.variants.iter().map(|spec| spec.variant()).collect();

    let sizes = with_provider!(sweep.benchmark.provider.as_str(), provider => {
        measure_sizes(&provider, &variants, &message).map_err(anyhow::Error::from)
    })?;

    let output = if args.json {
        serde_json::to_string_pretty(&sizes)
            .context("Failed to serialize sizes")?
    } else {
        ConsoleReporter::format_sizes(&sizes)?
    };
    println!("{}", output);
    Ok(())
}

fn validate(args: ValidateArgs) -> Result<()> {
    let mut sweep = load_sweep(&args.source, args.overrides.unit)?;
    apply_overrides(&mut sweep, &args.overrides);
    sweep.validate()?;

    let pairs = with_provider!(sweep.benchmark.provider.as_str(), provider => {
        let controller = SweepController::new(
            &provider,
            sweep.benchmark_config()?,
            sweep.unit()?,
            Clock::new(sweep.benchmark.clock)?,
            &[],
        )?;
        controller
            .resolve_plan(&sweep.variant_plan())
            .map_err(anyhow::Error::from)
    })?;

    info!(
        "Sweep '{}' is valid: {} (variant, operation) pairs",
        sweep.benchmark.name,
        pairs.len()
    );
    if args.print {
        print!("{}", sweep.to_toml()?);
    }
    Ok(())
}

fn print_presets() {
    println!(
        "{:<14} {:<11} {:>6} {:>7}  description",
        "preset", "provider", "N time", "N cyc"
    );
    for preset in Preset::ALL {
        println!(
            "{:<14} {:<11} {:>6} {:>7}  {}",
            preset.name(),
            preset.provider(),
            preset.iterations(UnitMode::Time),
            preset.iterations(UnitMode::Cycles),
            preset.description()
        );
    }
}

/// Read the sweep file or expand the preset. `unit` picks the preset mode;
/// for a file it replaces the clock and unit.
fn load_sweep(source: &SweepSource, unit: Option<UnitMode>) -> Result<SweepFile> {
    match (&source.config, source.preset) {
        (Some(path), _) => {
            let mut sweep = SweepFile::from_file(path)?;
            if let Some(mode) = unit {
                let (clock, unit) = clock_and_unit(mode);
                sweep.benchmark.clock = clock;
                sweep.benchmark.unit = unit;
            }
            Ok(sweep)
        }
        (None, Some(preset)) => Ok(preset.build(unit.unwrap_or_default())),
        (None, None) => anyhow::bail!("either --config or --preset is required"),
    }
}

fn clock_and_unit(mode: UnitMode) -> (ClockSource, UnitName) {
    match mode {
        UnitMode::Time => (ClockSource::ProcessCpu, UnitName::Microseconds),
        UnitMode::Cycles => (ClockSource::Monotonic, UnitName::Cycles),
    }
}

fn apply_overrides(sweep: &mut SweepFile, overrides: &Overrides) {
    if let Some(n) = overrides.iterations {
        sweep.benchmark.iterations = n;
    }
    if let Some(hz) = overrides.cpu_frequency {
        sweep.benchmark.cpu_frequency_hz = hz;
    }
    if let Some(path) = &overrides.message {
        sweep.benchmark.message_file = Some(path.clone());
    }
}

/// The message signed by sign / verify runs: the configured file, or
/// `message_size` bytes of a fixed pattern.
fn load_message(benchmark: &BenchmarkSection) -> Result<Vec<u8>> {
    match &benchmark.message_file {
        Some(path) => fs::read(path)
            .with_context(|| format!("Failed to read message file {}", path.display())),
        None => {
            let pattern = (0..benchmark.message_size).map(|i| (i % 251) as u8);
            Ok(pattern.collect())
        }
    }
}
