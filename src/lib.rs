//! # mzlib - mzXML and mzData for Rust
//!
//! `mzlib` reads mzXML and mzData mass spectrometry files into one
//! format-independent scan model and writes runs back out as mzData.
//!
//! ## Key Features
//!
//! - **Peak codec**: Base64 peak arrays, 32- or 64-bit floats, either byte
//!   order, optional zlib compression.
//!
//! - **Parallel decoding**: The XML is parsed once, sequentially; peak arrays
//!   are then decoded on a Rayon pool with document order preserved.
//!
//! - **Parent linkage**: MS2 scans carry the id of their precursor scan,
//!   whether the file expresses it by nesting (mzXML) or by reference (mzData).
//!
//! - **Queries**: TIC, BPC and SIC chromatograms, retention time and m/z
//!   filters over a decoded run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mzlib::config::DecodeConfig;
//! use mzlib::formats::{read_file, write_file};
//!
//! let run = read_file("sample.mzXML", &DecodeConfig::default())?;
//! println!("{} scans from {}", run.scans.len(), run.source_file);
//!
//! for scan in run.scans.iter().filter(|s| s.has_parent()) {
//!     let parent = run.parent_of(scan);
//!     println!("scan {} <- {:?}", scan.id, parent.map(|p| p.id));
//! }
//!
//! write_file(&run, "sample.mzData")?;
//! # Ok::<(), mzlib::error::MzError>(())
//! ```
//!
//! ## Decoding from memory
//!
//! ```rust
//! use mzlib::formats::mzxml::MzXmlDecoder;
//!
//! let xml = r#"<mzXML><msRun scanCount="1">
//!   <scan num="1" msLevel="1" peaksCount="2" retentionTime="PT90S">
//!     <peaks precision="32" byteOrder="network">QsgAAER6AABDSAAAQ/oAAA==</peaks>
//!   </scan>
//! </msRun></mzXML>"#;
//!
//! let run = MzXmlDecoder::default().decode(xml.as_bytes())?;
//! assert_eq!(run.scans[0].retention_time, 1.5);
//! assert_eq!(run.scans[0].mz_array, vec![100.0, 200.0]);
//! # Ok::<(), mzlib::error::MzError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`binary`]: Peak codec
//! - [`model`]: `RawData` / `Scan` and the query layer
//! - [`formats`]: mzXML and mzData decoders, mzData encoder, extension dispatch
//! - [`config`]: Decoder settings
//! - [`error`]: Error types

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod binary;
pub mod config;
/// Error types for decoding and encoding
pub mod error;
pub mod formats;
pub mod model;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::binary::{
        ByteOrder, CodecError, Compression, PeakCodec, PeakEncoding, Precision,
    };
    pub use crate::config::{DecodeConfig, NestingPolicy};
    pub use crate::error::{MzError, Result};
    pub use crate::formats::mzdata::{find_param, CvParam, MzDataDecoder, MzDataEncoder};
    pub use crate::formats::mzxml::MzXmlDecoder;
    pub use crate::formats::{decode, encode, read_file, write_file, Format};
    pub use crate::model::{Instrument, Polarity, RawData, Scan};
}
