use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

use mzlib::config::DecodeConfig;
use mzlib::formats::{read_file, write_file, Format};

/// Convert a run from one format to another
pub fn run(input: PathBuf, output: PathBuf, config: &DecodeConfig) -> Result<()> {
    // Validate input file exists
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    // Resolve both formats before reading anything
    let input_format = Format::from_path(&input)?;
    let output_format = Format::from_path(&output)?;

    info!("mzlib Converter - {} to {}", input_format, output_format);
    info!("Input:  {}", input.display());
    info!("Output: {}", output.display());
    info!("Nesting policy: {:?}", config.nesting);
    if let Some(threads) = config.threads {
        info!("Decode threads: {}", threads);
    }

    let start = Instant::now();
    let data = read_file(&input, config)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    write_file(&data, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        "Converted {} scans in {:.2}s",
        data.scans.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
