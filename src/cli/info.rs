use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[cfg(feature = "colorized_output")]
use console::style;

use mzlib::config::DecodeConfig;
use mzlib::formats::{read_file, Format};
use mzlib::model::{Instrument, RawData};

/// Run summary printed by `mzlib info`
#[derive(Debug, Serialize)]
struct RunSummary {
    file: String,
    format: Format,
    source_file: String,
    instrument: Instrument,
    declared_scans: u64,
    decoded_scans: usize,
    ms_levels: Vec<(u8, usize)>,
    retention_time: Option<[f64; 2]>,
    mz: Option<[f64; 2]>,
}

impl RunSummary {
    fn new(file: &Path, format: Format, data: &RawData) -> Self {
        let rt_min = data.scans.iter().map(|s| s.retention_time).reduce(f64::min);
        let rt_max = data.scans.iter().map(|s| s.retention_time).reduce(f64::max);

        Self {
            file: file.display().to_string(),
            format,
            source_file: data.source_file.clone(),
            instrument: data.instrument.clone(),
            declared_scans: data.scan_count,
            decoded_scans: data.scans.len(),
            ms_levels: data.ms_level_counts(),
            retention_time: rt_min.zip(rt_max).map(|(a, b)| [a, b]),
            mz: data.min_mz().zip(data.max_mz()).map(|(a, b)| [a, b]),
        }
    }
}

fn heading(text: &str) -> String {
    #[cfg(feature = "colorized_output")]
    {
        style(text).bold().cyan().to_string()
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        text.to_string()
    }
}

fn print_summary(summary: &RunSummary) {
    println!("{}", heading("mzlib Run Information"));
    println!("{}", heading("====================="));
    println!("File: {}", summary.file);
    println!("Format: {}", summary.format);
    println!("Source file: {}", summary.source_file);
    println!();

    println!("{}", heading("Instrument:"));
    let instrument = &summary.instrument;
    println!("  Manufacturer: {}", instrument.manufacturer);
    println!("  Model: {}", instrument.model);
    println!("  Mass analyzer: {}", instrument.mass_analyzer);
    println!("  Detector: {}", instrument.detector);
    println!("  Ionization: {}", instrument.ionization);
    if instrument.resolution > 0.0 {
        println!("  Resolution: {}", instrument.resolution);
    }
    println!();

    println!("{}", heading("Scans:"));
    println!("  Declared: {}", summary.declared_scans);
    println!("  Decoded: {}", summary.decoded_scans);
    for (level, count) in &summary.ms_levels {
        println!("  MS{}: {}", level, count);
    }
    if let Some([start, end]) = summary.retention_time {
        println!("  Retention time: {:.3} - {:.3} min", start, end);
    }
    if let Some([low, high]) = summary.mz {
        println!("  m/z: {:.4} - {:.4}", low, high);
    }
}

/// Display information about a run
pub fn run(file: PathBuf, config: &DecodeConfig, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let format = Format::from_path(&file)?;
    let data = read_file(&file, config)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let summary = RunSummary::new(&file, format, &data);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
        );
    } else {
        print_summary(&summary);
    }

    Ok(())
}
