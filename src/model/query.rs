//! Reductions and filters over decoded scans
//!
//! Chromatograms (TIC, BPC, SIC) are computed over MS1 scans only and are
//! aligned with [`RawData::ms1_retention_times`].

use super::raw_data::RawData;
use super::scan::Scan;

fn fold_min(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| match acc {
        Some(m) if m <= v => Some(m),
        _ => Some(v),
    })
}

fn fold_max(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| match acc {
        Some(m) if m >= v => Some(m),
        _ => Some(v),
    })
}

impl Scan {
    /// Smallest m/z in the scan
    pub fn min_mz(&self) -> Option<f64> {
        fold_min(self.mz_array.iter().copied())
    }

    /// Largest m/z in the scan
    pub fn max_mz(&self) -> Option<f64> {
        fold_max(self.mz_array.iter().copied())
    }

    /// Most intense peak's intensity
    pub fn peak_intensity(&self) -> Option<f64> {
        fold_max(self.intensity_array.iter().copied())
    }

    /// Sum of all intensities
    pub fn total_intensity(&self) -> f64 {
        self.intensity_array.iter().sum()
    }

    /// Sum of intensities of peaks with `min_mz <= mz <= max_mz`
    pub fn selected_intensity(&self, min_mz: f64, max_mz: f64) -> f64 {
        self.peaks()
            .filter(|(mz, _)| *mz >= min_mz && *mz <= max_mz)
            .map(|(_, intensity)| intensity)
            .sum()
    }

    /// Remove peaks with `min_mz <= mz <= max_mz`, returning how many were removed
    pub fn remove_mz(&mut self, min_mz: f64, max_mz: f64) -> usize {
        self.retain_peaks(|mz| mz < min_mz || mz > max_mz)
    }

    /// Keep only peaks with `min_mz <= mz <= max_mz`, returning how many were removed
    pub fn only_mz(&mut self, min_mz: f64, max_mz: f64) -> usize {
        self.retain_peaks(|mz| mz >= min_mz && mz <= max_mz)
    }

    /// Rebuild both arrays keeping the peaks whose m/z satisfies `keep`
    pub(crate) fn retain_peaks<F: Fn(f64) -> bool>(&mut self, keep: F) -> usize {
        let before = self.mz_array.len();
        let (mz, intensity): (Vec<f64>, Vec<f64>) =
            self.peaks().filter(|(mz, _)| keep(*mz)).unzip();
        self.mz_array = mz;
        self.intensity_array = intensity;
        before - self.mz_array.len()
    }
}

impl RawData {
    fn ms1_scans(&self) -> impl Iterator<Item = &Scan> + '_ {
        self.scans.iter().filter(|s| s.ms_level == 1)
    }

    /// Retention times of MS1 scans, the x-axis of every chromatogram
    pub fn ms1_retention_times(&self) -> Vec<f64> {
        self.ms1_scans().map(|s| s.retention_time).collect()
    }

    /// Total ion chromatogram
    pub fn tic(&self) -> Vec<f64> {
        self.ms1_scans().map(Scan::total_intensity).collect()
    }

    /// Base peak chromatogram (0.0 for empty scans)
    pub fn bpc(&self) -> Vec<f64> {
        self.ms1_scans()
            .map(|s| s.peak_intensity().unwrap_or(0.0))
            .collect()
    }

    /// Selected ion chromatogram over `min_mz <= mz <= max_mz`
    pub fn sic(&self, min_mz: f64, max_mz: f64) -> Vec<f64> {
        self.ms1_scans()
            .map(|s| s.selected_intensity(min_mz, max_mz))
            .collect()
    }

    /// Smallest m/z across the run
    pub fn min_mz(&self) -> Option<f64> {
        fold_min(self.scans.iter().filter_map(Scan::min_mz))
    }

    /// Largest m/z across the run
    pub fn max_mz(&self) -> Option<f64> {
        fold_max(self.scans.iter().filter_map(Scan::max_mz))
    }

    /// Most intense peak across the run
    pub fn peak_intensity(&self) -> Option<f64> {
        fold_max(self.scans.iter().filter_map(Scan::peak_intensity))
    }

    /// The scan whose retention time is closest to `retention_time`
    ///
    /// Ties go to the earlier scan in document order.
    pub fn scan_at(&self, retention_time: f64) -> Option<&Scan> {
        let mut best: Option<(&Scan, f64)> = None;
        for scan in &self.scans {
            let diff = (scan.retention_time - retention_time).abs();
            match best {
                Some((_, d)) if d <= diff => {}
                _ => best = Some((scan, diff)),
            }
        }
        best.map(|(scan, _)| scan)
    }

    /// Remove scans with `min_time <= rt < max_time`
    ///
    /// Updates `scan_count` to the number of remaining scans and returns the
    /// number removed.
    pub fn remove_scans(&mut self, min_time: f64, max_time: f64) -> usize {
        self.retain_scans(|rt| rt < min_time || rt >= max_time)
    }

    /// Keep only scans with `min_time <= rt < max_time`
    ///
    /// Updates `scan_count` to the number of remaining scans and returns the
    /// number removed.
    pub fn only_scans(&mut self, min_time: f64, max_time: f64) -> usize {
        self.retain_scans(|rt| rt >= min_time && rt < max_time)
    }

    fn retain_scans<F: Fn(f64) -> bool>(&mut self, keep: F) -> usize {
        let before = self.scans.len();
        self.scans.retain(|s| keep(s.retention_time));
        self.scan_count = self.scans.len() as u64;
        before - self.scans.len()
    }

    /// Remove peaks with `|peak - mz| < tolerance` from every scan
    pub fn remove_mz(&mut self, mz: f64, tolerance: f64) -> usize {
        self.scans
            .iter_mut()
            .map(|s| s.retain_peaks(|v| (v - mz).abs() >= tolerance))
            .sum()
    }

    /// Keep only peaks with `|peak - mz| < tolerance` in every scan
    pub fn only_mz(&mut self, mz: f64, tolerance: f64) -> usize {
        self.scans
            .iter_mut()
            .map(|s| s.retain_peaks(|v| (v - mz).abs() < tolerance))
            .sum()
    }
}
