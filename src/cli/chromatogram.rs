use anyhow::{Context, Result};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use mzlib::config::DecodeConfig;
use mzlib::formats::read_file;
use mzlib::model::RawData;

use super::ChromatogramKind;

/// Intensity trace for the requested kind, aligned with MS1 retention times
fn trace(data: &RawData, kind: ChromatogramKind, min_mz: f64, max_mz: f64) -> Vec<f64> {
    match kind {
        ChromatogramKind::Tic => data.tic(),
        ChromatogramKind::Bpc => data.bpc(),
        ChromatogramKind::Sic => data.sic(min_mz, max_mz),
    }
}

/// Print `rt<TAB>intensity` rows for every MS1 scan
pub fn run(
    file: PathBuf,
    config: &DecodeConfig,
    kind: ChromatogramKind,
    min_mz: f64,
    max_mz: f64,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }
    if min_mz > max_mz {
        anyhow::bail!("--min-mz ({}) is greater than --max-mz ({})", min_mz, max_mz);
    }

    let data = read_file(&file, config)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let times = data.ms1_retention_times();
    let intensities = trace(&data, kind, min_mz, max_mz);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (rt, intensity) in times.iter().zip(&intensities) {
        writeln!(out, "{}\t{}", rt, intensity)?;
    }
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mzlib::model::Scan;

    #[test]
    fn test_trace_kinds() {
        let mut ms1 = Scan::new(1, 1);
        ms1.mz_array = vec![100.0, 200.0];
        ms1.intensity_array = vec![5.0, 7.0];
        let mut ms2 = Scan::new(2, 2);
        ms2.mz_array = vec![150.0];
        ms2.intensity_array = vec![100.0];

        let mut data = RawData::new();
        data.scans = vec![ms1, ms2];

        assert_eq!(trace(&data, ChromatogramKind::Tic, 0.0, 0.0), vec![12.0]);
        assert_eq!(trace(&data, ChromatogramKind::Bpc, 0.0, 0.0), vec![7.0]);
        assert_eq!(trace(&data, ChromatogramKind::Sic, 150.0, 250.0), vec![7.0]);
    }
}
