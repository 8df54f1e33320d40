//! Format-specific decoders and encoders.
//!
//! - [`mzxml`] - mzXML 2.x/3.x (decode)
//! - [`mzdata`] - PSI mzData 1.05 (decode and encode)
//!
//! mzML and JSON are recognized by [`Format::from_path`] so callers get a
//! clear [`MzError::NotImplemented`] instead of a parse failure.

pub mod mzdata;
pub mod mzxml;
pub mod parallel;
pub(crate) mod xml;

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::config::DecodeConfig;
use crate::error::{MzError, Result};
use crate::model::RawData;
use self::mzdata::{MzDataDecoder, MzDataEncoder};
use self::mzxml::MzXmlDecoder;

/// Mass spectrometry file formats known to this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Format {
    /// mzXML
    MzXml,
    /// PSI mzData
    MzData,
    /// PSI mzML (not implemented)
    MzMl,
    /// JSON dump of a run (not implemented)
    Json,
    /// Gzipped JSON dump of a run (not implemented)
    JsonGz,
}

impl Format {
    /// Infer the format from a file extension, ignoring case
    ///
    /// `.xml` is taken to be mzData.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if name.ends_with(".json.gz") {
            return Ok(Format::JsonGz);
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "mzxml" => Ok(Format::MzXml),
            "mzdata" | "xml" => Ok(Format::MzData),
            "mzml" => Ok(Format::MzMl),
            "json" => Ok(Format::Json),
            _ => Err(MzError::UnknownFormat(path.display().to_string())),
        }
    }

    /// Human-readable format name
    pub fn name(&self) -> &'static str {
        match self {
            Format::MzXml => "mzXML",
            Format::MzData => "mzData",
            Format::MzMl => "mzML",
            Format::Json => "JSON",
            Format::JsonGz => "JSON.gz",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode a run in the given format from a buffered source
pub fn decode<R: BufRead>(format: Format, source: R, config: &DecodeConfig) -> Result<RawData> {
    match format {
        Format::MzXml => MzXmlDecoder::new(config.clone()).decode(source),
        Format::MzData => MzDataDecoder::new(config.clone()).decode(source),
        Format::MzMl | Format::Json | Format::JsonGz => Err(MzError::NotImplemented {
            format: format.name(),
            operation: "Reading",
        }),
    }
}

/// Encode a run in the given format
///
/// Nothing is written for unsupported formats.
pub fn encode<W: Write>(format: Format, data: &RawData, sink: W) -> Result<()> {
    match format {
        Format::MzData => MzDataEncoder::new().encode(data, sink),
        Format::MzXml | Format::MzMl | Format::Json | Format::JsonGz => {
            Err(MzError::NotImplemented {
                format: format.name(),
                operation: "Writing",
            })
        }
    }
}

/// Read a run from disk, choosing the decoder by file extension
pub fn read_file(path: impl AsRef<Path>, config: &DecodeConfig) -> Result<RawData> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    if !matches!(format, Format::MzXml | Format::MzData) {
        return decode(format, std::io::empty(), config);
    }

    info!("Reading {} as {}", path.display(), format);
    let file = File::open(path)?;
    let mut data = decode(format, BufReader::new(file), config)?;
    data.filename = Some(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()));
    Ok(data)
}

/// Write a run to disk, choosing the encoder by file extension
///
/// The file is not created when the format cannot be written.
pub fn write_file(data: &RawData, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    if format != Format::MzData {
        return encode(format, data, std::io::sink());
    }

    info!("Writing {} scans to {} as {}", data.scans.len(), path.display(), format);
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encode(format, data, &mut writer)?;
    writer.flush()?;
    Ok(())
}
