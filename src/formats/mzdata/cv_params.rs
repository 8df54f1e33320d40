//! Controlled vocabulary parameters as used by mzData
//!
//! mzData 1.05 identifies most spectrum and run properties by the `name`
//! attribute of a `<cvParam>`, with the PSI accession as a secondary key.

use quick_xml::events::BytesStart;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::formats::xml::get_attribute;

/// A `<cvParam>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvParam {
    /// Ontology label (e.g. "psi")
    pub cv_label: String,

    /// Accession number (e.g. "PSI:1000038")
    pub accession: String,

    /// Term name, the lookup key
    pub name: String,

    /// Value; empty when absent
    pub value: String,
}

impl CvParam {
    /// Build a PSI parameter
    pub fn psi(accession: &str, name: &str, value: impl Into<String>) -> Self {
        Self {
            cv_label: "psi".to_string(),
            accession: accession.to_string(),
            name: name.to_string(),
            value: value.into(),
        }
    }

    /// Read a parameter from its start tag
    pub(crate) fn from_start(e: &BytesStart) -> Result<Self> {
        Ok(Self {
            cv_label: get_attribute(e, "cvLabel")?.unwrap_or_default(),
            accession: get_attribute(e, "accession")?.unwrap_or_default(),
            name: get_attribute(e, "name")?.unwrap_or_default(),
            value: get_attribute(e, "value")?.unwrap_or_default(),
        })
    }

    /// Get the value as f64 if possible
    pub fn value_as_f64(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }
}

/// Value of the first parameter called `name`
///
/// A missing parameter is not an error; callers choose the default.
pub fn find_param<'a>(params: &'a [CvParam], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|p| p.name == name)
        .map(|p| p.value.as_str())
}

/// PSI accessions written by the mzData encoder
#[allow(non_snake_case)]
pub mod PSI_ACCESSIONS {
    /// Ionization type of the source
    pub const IONIZATION_TYPE: &str = "PSI:1000008";

    /// Mass analyzer type
    pub const ANALYZER_TYPE: &str = "PSI:1000010";

    /// Detector type
    pub const DETECTOR_TYPE: &str = "PSI:1000026";

    /// Detector sampling frequency
    pub const SAMPLING_FREQUENCY: &str = "PSI:1000029";

    /// Whether peaks were de-isotoped
    pub const DEISOTOPING: &str = "PSI:1000033";

    /// Whether charges were deconvolved
    pub const CHARGE_DECONVOLUTION: &str = "PSI:1000034";

    /// Peak processing applied
    pub const PEAK_PROCESSING: &str = "PSI:1000035";

    /// Scan mode
    pub const SCAN_MODE: &str = "PSI:1000036";

    /// Scan polarity
    pub const POLARITY: &str = "PSI:1000037";

    /// Retention time in minutes
    pub const TIME_IN_MINUTES: &str = "PSI:1000038";

    /// Precursor m/z
    pub const MASS_TO_CHARGE_RATIO: &str = "PSI:1000040";

    /// Precursor intensity
    pub const INTENSITY: &str = "PSI:1000042";

    /// Collision energy
    pub const COLLISION_ENERGY: &str = "PSI:1000045";
}
