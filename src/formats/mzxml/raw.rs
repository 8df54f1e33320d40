use crate::binary::{ByteOrder, CodecError, Compression, PeakCodec, PeakEncoding, Precision};
use crate::error::{MzError, Result};
use crate::model::{Polarity, Scan};

/// Raw `<peaks>` content with deferred decoding
#[derive(Debug, Clone)]
pub(crate) struct RawPeaks {
    /// Base64 text of interleaved m/z,intensity pairs
    pub base64: String,
    /// Value of the `precision` attribute, validated at decode time
    pub precision_bits: u32,
    /// Compression from `compressionType`
    pub compression: Compression,
}

impl Default for RawPeaks {
    fn default() -> Self {
        Self {
            base64: String::new(),
            precision_bits: 32,
            compression: Compression::None,
        }
    }
}

/// One `<scan>` element with its peak list still Base64-encoded
///
/// Produced by the sequential XML pass and turned into a [`Scan`] by
/// [`RawMzXmlScan::decode`], which is safe to run on any thread.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawMzXmlScan {
    pub id: u64,
    pub parent_scan: u64,
    pub ms_level: u8,
    pub retention_time: f64,
    pub polarity: Polarity,
    pub mz_range: [f64; 2],
    pub collision_energy: f64,
    pub precursor_mz: Option<f64>,
    pub precursor_intensity: f64,
    /// Declared number of m/z,intensity pairs
    pub peak_count: usize,
    pub peaks: RawPeaks,
}

impl RawMzXmlScan {
    /// Decode the peak list and build the final scan
    ///
    /// mzXML peaks are always network (big-endian) order, whatever the
    /// `byteOrder` attribute says.
    pub fn decode(self, continuous: bool) -> Result<Scan> {
        let id = self.id;
        let codec_error = |source| MzError::Codec { scan: id, source };

        let precision = Precision::from_bits(self.peaks.precision_bits).map_err(codec_error)?;
        let encoding = PeakEncoding::new(precision, ByteOrder::BigEndian)
            .with_compression(self.peaks.compression);

        let value_count = self
            .peak_count
            .checked_mul(2)
            .ok_or(CodecError::CountOverflow(self.peak_count))
            .map_err(codec_error)?;
        let values =
            PeakCodec::decode(&self.peaks.base64, value_count, &encoding).map_err(codec_error)?;
        let (mz_array, intensity_array) = deinterleave(&values);

        if mz_array.len() != intensity_array.len() {
            return Err(MzError::ArrayLengthMismatch {
                scan: id,
                mz: mz_array.len(),
                intensity: intensity_array.len(),
            });
        }

        Ok(Scan {
            id,
            parent_scan: self.parent_scan,
            ms_level: self.ms_level,
            retention_time: self.retention_time,
            polarity: self.polarity,
            mz_range: self.mz_range,
            precursor_mz: self.precursor_mz.unwrap_or(0.0),
            precursor_intensity: self.precursor_intensity,
            collision_energy: self.collision_energy,
            continuous,
            deisotoped: false,
            mz_array,
            intensity_array,
        })
    }
}

/// Split `[mz0, int0, mz1, int1, ...]` into m/z and intensity arrays
pub(crate) fn deinterleave(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut mz = Vec::with_capacity(values.len() / 2);
    let mut intensity = Vec::with_capacity(values.len() / 2);
    for pair in values.chunks(2) {
        mz.push(pair[0]);
        if let Some(&v) = pair.get(1) {
            intensity.push(v);
        }
    }
    (mz, intensity)
}

/// Parse an `xs:duration` retention time of the form `PT<seconds>S` into minutes
pub(crate) fn parse_retention_time(value: &str) -> Option<f64> {
    let seconds: f64 = value
        .trim()
        .strip_prefix("PT")?
        .strip_suffix('S')?
        .parse()
        .ok()?;
    Some(seconds / 60.0)
}

/// Map the `polarity` attribute: "+" positive, "-" negative, anything else unknown
pub(crate) fn parse_polarity(value: Option<&str>) -> Polarity {
    match value {
        Some("+") => Polarity::Positive,
        Some("-") => Polarity::Negative,
        _ => Polarity::Unknown,
    }
}
