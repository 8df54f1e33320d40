use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use mzlib::config::{DecodeConfig, NestingPolicy};

mod chromatogram;
mod config;
mod convert;
mod info;

pub use config::Config;

/// mzlib - mzXML / mzData reader and converter
#[derive(Parser)]
#[command(name = "mzlib")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Load decoder settings from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Handling of mzXML scans nested below the child level.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum NestingArg {
    /// Skip them with a warning
    Warn,
    /// Fail the decode
    Reject,
    /// Decode every level
    Recurse,
}

impl From<NestingArg> for NestingPolicy {
    fn from(arg: NestingArg) -> Self {
        match arg {
            NestingArg::Warn => NestingPolicy::Warn,
            NestingArg::Reject => NestingPolicy::Reject,
            NestingArg::Recurse => NestingPolicy::Recurse,
        }
    }
}

/// Chromatogram trace to print.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ChromatogramKind {
    /// Total ion chromatogram
    #[default]
    Tic,
    /// Base peak chromatogram
    Bpc,
    /// Selected ion chromatogram over an m/z window
    Sic,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a run
    Info {
        /// Input file (.mzXML, .mzData, .xml)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert between formats, chosen by file extension
    Convert {
        /// Input file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (only mzData can be written)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Handling of mzXML scans nested below the child level
        #[arg(long, value_enum)]
        nesting: Option<NestingArg>,

        /// Worker threads for peak decoding
        #[arg(short = 't', long)]
        threads: Option<usize>,
    },

    /// Print an MS1 chromatogram as tab-separated rows
    Chromatogram {
        /// Input file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Trace to compute
        #[arg(short, long, value_enum, default_value = "tic")]
        kind: ChromatogramKind,

        /// Lower m/z bound for SIC
        #[arg(long, default_value_t = 0.0)]
        min_mz: f64,

        /// Upper m/z bound for SIC
        #[arg(long, default_value_t = f64::MAX)]
        max_mz: f64,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

/// Decoder settings from the config file, if any
fn load_decode_config(path: Option<&PathBuf>) -> Result<DecodeConfig> {
    match path {
        Some(path) => Ok(Config::from_file(path)?.decode),
        None => Ok(DecodeConfig::default()),
    }
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let mut decode_config = load_decode_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info { file, json } => info::run(file, &decode_config, json),
        Commands::Convert {
            input,
            output,
            nesting,
            threads,
        } => {
            // Flags win over the config file
            if let Some(nesting) = nesting {
                decode_config = decode_config.with_nesting(nesting.into());
            }
            if let Some(threads) = threads {
                decode_config = decode_config.with_threads(threads);
            }
            convert::run(input, output, &decode_config)
        }
        Commands::Chromatogram {
            file,
            kind,
            min_mz,
            max_mz,
        } => chromatogram::run(file, &decode_config, kind, min_mz, max_mz),
    }
}
