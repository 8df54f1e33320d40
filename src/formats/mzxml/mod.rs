//! mzXML decoder
//!
//! mzXML stores each scan's peaks as one Base64 block of interleaved
//! big-endian m/z,intensity pairs. MS2 scans sit inside their MS1 parent,
//! and that nesting is what links a child to its parent scan.
//!
//! Decoding runs in two phases: a sequential quick-xml pass collects raw
//! scans, then [`decode_ordered`] decodes the peak blocks in parallel.

mod parser;
mod raw;

use std::io::BufRead;

use log::{info, warn};

use crate::config::DecodeConfig;
use crate::error::Result;
use crate::formats::parallel::decode_ordered;
use crate::model::RawData;

/// Decoder for mzXML documents
#[derive(Debug, Clone, Default)]
pub struct MzXmlDecoder {
    config: DecodeConfig,
}

impl MzXmlDecoder {
    /// Create a decoder with the given settings
    pub fn new(config: DecodeConfig) -> Self {
        Self { config }
    }

    /// Decode a complete mzXML document
    pub fn decode<R: BufRead>(&self, source: R) -> Result<RawData> {
        let parsed = parser::parse(source, self.config.nesting)?;
        let header = parsed.header;
        let continuous = !header.centroided;

        let scans = decode_ordered(parsed.scans, self.config.threads, |raw| {
            raw.decode(continuous)
        })?;

        if header.scan_count != scans.len() as u64 {
            warn!(
                "msRun declares {} scans but {} were decoded",
                header.scan_count,
                scans.len()
            );
        }
        info!("Decoded {} mzXML scans", scans.len());

        let mut data = RawData::new();
        data.source_file = header.source_file.unwrap_or_default();
        data.instrument = header.instrument;
        data.scan_count = header.scan_count;
        data.scans = scans;
        Ok(data)
    }
}
