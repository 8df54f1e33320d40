use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::scan::Scan;

/// Instrument metadata from the source file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Instrument {
    /// Instrument vendor
    pub manufacturer: String,

    /// Instrument model
    pub model: String,

    /// Mass analyzer type (e.g. "FTMS", "Quadrupole")
    pub mass_analyzer: String,

    /// Detector type
    pub detector: String,

    /// Reported resolution
    pub resolution: f64,

    /// Reported mass accuracy
    pub accuracy: f64,

    /// Ionization type (e.g. "ESI")
    pub ionization: String,
}

/// One acquisition run
///
/// Populated once by a single decode call. `scan_count` is the count declared
/// in the file header and is not required to match `scans.len()`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawData {
    /// Path the run was read from, when read through the file helpers
    #[serde(skip)]
    pub filename: Option<PathBuf>,

    /// Source file name copied from the document metadata
    pub source_file: String,

    /// Instrument metadata
    pub instrument: Instrument,

    /// Declared scan count
    pub scan_count: u64,

    /// Scans in document order
    pub scans: Vec<Scan>,
}

impl RawData {
    /// Create an empty run
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from scan id to position in `scans`
    ///
    /// If an id occurs more than once the first occurrence wins.
    pub fn id_index(&self) -> HashMap<u64, usize> {
        let mut index = HashMap::with_capacity(self.scans.len());
        for (i, scan) in self.scans.iter().enumerate() {
            index.entry(scan.id).or_insert(i);
        }
        index
    }

    /// Position of the scan with the given id
    pub fn scan_index(&self, id: u64) -> Option<usize> {
        self.scans.iter().position(|s| s.id == id)
    }

    /// Look up a scan by id
    pub fn scan_by_id(&self, id: u64) -> Option<&Scan> {
        self.scans.iter().find(|s| s.id == id)
    }

    /// The scan whose precursor produced `scan`, if present in this run
    pub fn parent_of(&self, scan: &Scan) -> Option<&Scan> {
        if scan.has_parent() {
            self.scan_by_id(scan.parent_scan)
        } else {
            None
        }
    }

    /// All scans whose parent is `id`, in document order
    pub fn children_of(&self, id: u64) -> impl Iterator<Item = &Scan> + '_ {
        self.scans
            .iter()
            .filter(move |s| s.parent_scan != 0 && s.parent_scan == id)
    }

    /// Number of scans at each MS level
    pub fn ms_level_counts(&self) -> Vec<(u8, usize)> {
        let mut counts: HashMap<u8, usize> = HashMap::new();
        for scan in &self.scans {
            *counts.entry(scan.ms_level).or_default() += 1;
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_unstable();
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_run() -> RawData {
        let mut run = RawData::new();
        run.scans.push(Scan::new(1, 1));
        let mut child = Scan::new(2, 2);
        child.parent_scan = 1;
        run.scans.push(child);
        let mut child = Scan::new(3, 2);
        child.parent_scan = 1;
        run.scans.push(child);
        run.scans.push(Scan::new(4, 1));
        run
    }

    #[test]
    fn test_parent_lookup_by_id() {
        let run = sample_run();
        let child = &run.scans[2];

        assert_eq!(run.parent_of(child).map(|s| s.id), Some(1));
        assert!(run.parent_of(&run.scans[0]).is_none());
        assert_eq!(run.scan_index(4), Some(3));
        assert_eq!(run.id_index().get(&3), Some(&2));
    }

    #[test]
    fn test_children_in_document_order() {
        let run = sample_run();
        let children: Vec<u64> = run.children_of(1).map(|s| s.id).collect();

        assert_eq!(children, vec![2, 3]);
        assert_eq!(run.children_of(4).count(), 0);
    }

    #[test]
    fn test_ms_level_counts() {
        let run = sample_run();
        assert_eq!(run.ms_level_counts(), vec![(1, 2), (2, 2)]);
    }
}
