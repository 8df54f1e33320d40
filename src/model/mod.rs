//! # Scan Model
//!
//! Format-independent in-memory representation of an acquisition run.
//!
//! ```text
//! RawData
//! ├── source_file, instrument, scan_count
//! └── scans (document order)
//!     └── Scan
//!         ├── id, parent_scan (by id, 0 = none)
//!         ├── ms_level, retention_time (minutes), polarity
//!         ├── precursor_mz, precursor_intensity, collision_energy
//!         └── mz_array / intensity_array (always equal length)
//! ```

mod query;
mod raw_data;
mod scan;

pub use raw_data::{Instrument, RawData};
pub use scan::{Polarity, Scan};
