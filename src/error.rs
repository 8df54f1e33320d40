use crate::binary::CodecError;

/// Errors that can occur while decoding or encoding a run
#[derive(Debug, thiserror::Error)]
pub enum MzError {
    /// Malformed XML
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error while reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Attribute value is not valid UTF-8
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The document is well-formed XML but not the expected schema
    #[error("Invalid {format} structure: {message}")]
    InvalidStructure {
        /// Format being decoded
        format: &'static str,
        /// What was wrong
        message: String,
    },

    /// Required XML attribute is missing
    #[error("Missing required attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        /// Element name
        element: &'static str,
        /// Attribute name
        attribute: &'static str,
    },

    /// An attribute is present but its value cannot be interpreted
    #[error("Invalid value '{value}' for attribute '{attribute}' on <{element}>")]
    InvalidAttributeValue {
        /// Element name
        element: &'static str,
        /// Attribute name
        attribute: &'static str,
        /// Offending value
        value: String,
    },

    /// Scans nested deeper than parent/child under the reject policy
    #[error("Scan {scan} is nested {depth} levels deep; only parent/child nesting is supported")]
    UnsupportedNesting {
        /// Id of the offending scan
        scan: u64,
        /// Nesting depth, 1 for top-level scans
        depth: usize,
    },

    /// A peak array of one scan could not be decoded
    #[error("Failed to decode peaks of scan {scan}: {source}")]
    Codec {
        /// Id of the scan
        scan: u64,
        /// Underlying codec error
        #[source]
        source: CodecError,
    },

    /// The m/z and intensity arrays of a scan differ in length
    #[error("Lengths of m/z and intensity arrays do not match in scan {scan}: {mz} vs {intensity}")]
    ArrayLengthMismatch {
        /// Id of the scan
        scan: u64,
        /// Decoded m/z values
        mz: usize,
        /// Decoded intensity values
        intensity: usize,
    },

    /// The format is recognized but the operation is not available for it
    #[error("{operation} {format} files is not implemented")]
    NotImplemented {
        /// Format name
        format: &'static str,
        /// "Reading" or "Writing"
        operation: &'static str,
    },

    /// The file extension does not map to any known format
    #[error("File type '{0}' not recognized")]
    UnknownFormat(String),

    /// The worker pool for parallel decoding could not be created
    #[error("Failed to build decode thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, MzError>;
