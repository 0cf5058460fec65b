//! FeatureLab CLI: run enrichment requests and inspect data sources.
//!
//! Commands:
//! - `fetch`: run a TOML fetch request against a CSV directory or the synthetic source
//! - `timeframes`: list supported timeframes
//! - `methods`: list the indicator names each backend understands
//! - `symbol`: print contract metadata for an instrument

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use featurelab_core::backends::BackendKind;
use featurelab_core::data::{
    export, write_frame, CsvProvider, DataProvider, ExportFormat, SyntheticProvider,
};
use featurelab_core::domain::{FeatureFrame, Timeframe};
use featurelab_core::pipeline::{fetch, CancelToken, FetchRequest};

#[derive(Parser)]
#[command(name = "featurelab", about = "FeatureLab CLI: OHLCV feature enrichment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a fetch request and write the feature table.
    Fetch {
        /// Path to a TOML request file.
        #[arg(long)]
        config: PathBuf,

        /// Directory of `<INSTRUMENT>_<tf>.csv` files.
        #[arg(long, conflicts_with = "synthetic")]
        data_dir: Option<PathBuf>,

        /// Use seeded random-walk bars instead of files.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for the synthetic source.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Bars per instrument generated by the synthetic source.
        #[arg(long, default_value_t = 5_000)]
        synthetic_bars: usize,

        /// Output file. Records are printed to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// json, csv or parquet. Inferred from the output extension when omitted.
        #[arg(long)]
        format: Option<String>,

        /// Abort the fetch after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Only log warnings and errors.
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
    /// List supported timeframes.
    Timeframes,
    /// List the indicator methods of one or all backends.
    Methods {
        /// classic, native or frame.
        #[arg(long)]
        backend: Option<String>,
    },
    /// Print contract metadata for an instrument.
    Symbol {
        instrument: String,

        /// Directory holding `symbols.json`.
        #[arg(long)]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let quiet = matches!(cli.command, Commands::Fetch { quiet: true, .. });
    init_logging(quiet);

    match cli.command {
        Commands::Fetch {
            config,
            data_dir,
            synthetic,
            seed,
            synthetic_bars,
            output,
            format,
            timeout,
            quiet,
        } => {
            let provider: Box<dyn DataProvider> = match (data_dir, synthetic) {
                (Some(dir), false) => Box::new(CsvProvider::new(dir)),
                (None, true) => Box::new(SyntheticProvider::new(seed, synthetic_bars)),
                _ => bail!("one of --data-dir or --synthetic is required"),
            };
            let cancel = match timeout {
                Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
                None => CancelToken::new(),
            };
            run_fetch(
                provider.as_ref(),
                &config,
                output.as_deref(),
                format.as_deref(),
                &cancel,
                quiet,
            )
        }
        Commands::Timeframes => {
            for tf in Timeframe::supported() {
                println!("{:<6} {}", tf.label(), tf.description());
            }
            Ok(())
        }
        Commands::Methods { backend } => run_methods(backend.as_deref()),
        Commands::Symbol {
            instrument,
            data_dir,
        } => run_symbol(&instrument, &data_dir),
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_fetch(
    provider: &dyn DataProvider,
    config_path: &Path,
    output: Option<&Path>,
    format: Option<&str>,
    cancel: &CancelToken,
    quiet: bool,
) -> Result<()> {
    let mut request = FetchRequest::from_toml_file(config_path)
        .with_context(|| format!("loading request {}", config_path.display()))?;
    request.quiet |= quiet;

    let frame = fetch(provider, &request, cancel)
        .with_context(|| format!("fetching from {}", provider.name()))?;

    match output {
        Some(path) => {
            let format = resolve_format(format, path)?;
            write_frame(&frame, path, format)
                .with_context(|| format!("writing {}", path.display()))?;
            if !quiet {
                print_summary(&frame);
                eprintln!("Written to: {}", path.display());
            }
        }
        None => println!("{}", export::to_json(&frame)?),
    }
    Ok(())
}

fn resolve_format(explicit: Option<&str>, path: &Path) -> Result<ExportFormat> {
    let name = match explicit {
        Some(name) => name.to_string(),
        None => path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("json")
            .to_string(),
    };
    Ok(name.parse()?)
}

fn print_summary(frame: &FeatureFrame) {
    eprintln!();
    eprintln!("=== Feature Table ===");
    eprintln!("Rows:    {}", frame.len());
    eprintln!("Columns: {}", frame.width());
    eprintln!("Begins:  {}", fmt_time(frame.first_time()));
    eprintln!("Ends:    {}", fmt_time(frame.last_time()));
    eprintln!();
}

fn fmt_time(t: Option<NaiveDateTime>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn run_methods(backend: Option<&str>) -> Result<()> {
    let kinds: Vec<BackendKind> = match backend {
        Some(name) => vec![name.parse()?],
        None => BackendKind::ALL.to_vec(),
    };
    for kind in kinds {
        let methods = kind.backend().methods();
        println!("{kind} ({}):", methods.len());
        for chunk in methods.chunks(8) {
            println!("  {}", chunk.join(" "));
        }
    }
    Ok(())
}

fn run_symbol(instrument: &str, data_dir: &Path) -> Result<()> {
    let provider = CsvProvider::new(data_dir);
    match provider.symbol_meta(instrument)? {
        Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
        None => bail!("no metadata for '{instrument}' in {}", data_dir.display()),
    }
    Ok(())
}
