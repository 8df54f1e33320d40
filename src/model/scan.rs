use serde::{Deserialize, Serialize};

/// Ion polarity of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Polarity {
    /// Positive ion mode (+1)
    Positive,
    /// Negative ion mode (-1)
    Negative,
    /// Not reported by the source file (0)
    #[default]
    Unknown,
}

impl Polarity {
    /// Signed representation: 1, -1 or 0
    pub fn as_i8(&self) -> i8 {
        match self {
            Polarity::Positive => 1,
            Polarity::Negative => -1,
            Polarity::Unknown => 0,
        }
    }

    /// Build from the signed representation; any other value is unknown
    pub fn from_i8(value: i8) -> Self {
        match value {
            1 => Polarity::Positive,
            -1 => Polarity::Negative,
            _ => Polarity::Unknown,
        }
    }
}

/// A single spectral acquisition
///
/// Precursor fields only carry meaning when `parent_scan != 0`. Parent and
/// child scans refer to each other by `id`, never by reference.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scan {
    /// Identifier, unique within the run
    pub id: u64,

    /// Id of the scan this one's precursor was selected from, 0 if none
    pub parent_scan: u64,

    /// MS level (1 for survey scans, 2+ for fragmentation scans)
    pub ms_level: u8,

    /// Retention time in minutes
    pub retention_time: f64,

    /// Ion polarity
    pub polarity: Polarity,

    /// Instrument scan window `[low, high]`
    pub mz_range: [f64; 2],

    /// Selected precursor m/z
    pub precursor_mz: f64,

    /// Selected precursor intensity
    pub precursor_intensity: f64,

    /// Collision energy used for fragmentation
    pub collision_energy: f64,

    /// Profile (true) or centroided (false) data
    pub continuous: bool,

    /// Whether isotopic peaks were merged by upstream processing
    pub deisotoped: bool,

    /// m/z values, aligned with `intensity_array`
    pub mz_array: Vec<f64>,

    /// Intensity values, aligned with `mz_array`
    pub intensity_array: Vec<f64>,
}

impl Scan {
    /// Create an empty scan with the given id and MS level
    pub fn new(id: u64, ms_level: u8) -> Self {
        Self {
            id,
            ms_level,
            ..Default::default()
        }
    }

    /// Get the number of peaks
    pub fn peak_count(&self) -> usize {
        self.mz_array.len()
    }

    /// True when this scan was produced from a precursor of another scan
    pub fn has_parent(&self) -> bool {
        self.parent_scan != 0
    }

    /// Iterate over `(mz, intensity)` pairs
    pub fn peaks(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mz_array
            .iter()
            .copied()
            .zip(self.intensity_array.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_signed_values() {
        assert_eq!(Polarity::Positive.as_i8(), 1);
        assert_eq!(Polarity::Negative.as_i8(), -1);
        assert_eq!(Polarity::Unknown.as_i8(), 0);
        assert_eq!(Polarity::from_i8(-1), Polarity::Negative);
        assert_eq!(Polarity::from_i8(7), Polarity::Unknown);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut scan = Scan::new(3, 1);
        scan.mz_array = vec![100.0, 200.0];
        scan.intensity_array = vec![5.0, 6.0];

        let mut copy = scan.clone();
        copy.mz_array.clear();
        copy.intensity_array[0] = 0.0;

        assert_eq!(scan.mz_array, vec![100.0, 200.0]);
        assert_eq!(scan.intensity_array, vec![5.0, 6.0]);
    }

    #[test]
    fn test_peaks_iterator() {
        let mut scan = Scan::new(1, 1);
        scan.mz_array = vec![100.0, 200.0];
        scan.intensity_array = vec![5.0, 6.0];

        let peaks: Vec<_> = scan.peaks().collect();
        assert_eq!(peaks, vec![(100.0, 5.0), (200.0, 6.0)]);
        assert!(!scan.has_parent());
    }
}
