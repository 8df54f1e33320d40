//! # mzlib
//!
//! Command-line access to mzXML and mzData runs.
//!
//! ## Usage
//!
//! ```bash
//! # Summarize a run
//! mzlib info sample.mzXML
//!
//! # Convert mzXML to mzData
//! mzlib convert sample.mzXML sample.mzData --threads 4
//!
//! # MS1 base peak chromatogram
//! mzlib chromatogram sample.mzXML --kind bpc
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
