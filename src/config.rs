//! Decoder configuration

use serde::Deserialize;

/// What to do with mzXML scans nested below the child level
///
/// mzXML nests MS2 scans inside their MS1 parent. A third level (an MS3 scan
/// inside an MS2 scan) is outside the two-level layout this crate models, so
/// the caller decides how it is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestingPolicy {
    /// Log a warning and skip scans below the child level
    #[default]
    Warn,
    /// Fail the whole decode
    Reject,
    /// Decode every level, linking each scan to its enclosing scan
    Recurse,
}

impl std::str::FromStr for NestingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(NestingPolicy::Warn),
            "reject" => Ok(NestingPolicy::Reject),
            "recurse" => Ok(NestingPolicy::Recurse),
            other => Err(format!("unknown nesting policy: {other}")),
        }
    }
}

/// Settings shared by the format decoders
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Handling of mzXML scans nested deeper than parent/child
    pub nesting: NestingPolicy,

    /// Worker threads for peak decoding; `None` uses the global rayon pool
    pub threads: Option<usize>,
}

impl DecodeConfig {
    /// Set the nesting policy
    pub fn with_nesting(mut self, nesting: NestingPolicy) -> Self {
        self.nesting = nesting;
        self
    }

    /// Set the number of decode threads
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}
