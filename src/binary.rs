//! Binary peak array codec
//!
//! mzXML and mzData store numerical arrays (m/z, intensity) as Base64-encoded
//! binary data. This module handles both directions of that pipeline:
//!
//! Decoding:
//! 1. Base64 decode the text
//! 2. Decompress if needed (zlib)
//! 3. Interpret bytes as float32 or float64 in the declared byte order
//!
//! Encoding narrows to the target precision, serializes in the requested byte
//! order and Base64-encodes the result. Encoding never compresses.

use std::io::{Cursor, Read};

use base64::prelude::*;
use byteorder::{BigEndian, ByteOrder as _, LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;
use serde::{Deserialize, Serialize};

/// Byte order of the values inside a binary array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Most significant byte first ("network" order, mandatory for mzXML)
    BigEndian,
    /// Least significant byte first
    LittleEndian,
}

impl ByteOrder {
    /// The reverse of this byte order
    pub fn flipped(self) -> Self {
        match self {
            ByteOrder::BigEndian => ByteOrder::LittleEndian,
            ByteOrder::LittleEndian => ByteOrder::BigEndian,
        }
    }
}

/// Binary encoding precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Precision {
    /// 32-bit IEEE-754 floating point
    Float32,
    /// 64-bit IEEE-754 floating point
    #[default]
    Float64,
}

impl Precision {
    /// Map a bit count from a `precision` attribute onto a precision
    pub fn from_bits(bits: u32) -> Result<Self, CodecError> {
        match bits {
            32 => Ok(Precision::Float32),
            64 => Ok(Precision::Float64),
            other => Err(CodecError::UnsupportedPrecision(other)),
        }
    }

    /// Bit count as written in `precision` attributes
    pub fn bits(&self) -> u32 {
        match self {
            Precision::Float32 => 32,
            Precision::Float64 => 64,
        }
    }

    /// Get the byte size per value
    pub fn byte_size(&self) -> usize {
        match self {
            Precision::Float32 => 4,
            Precision::Float64 => 8,
        }
    }
}

/// Compression applied to the bytes before Base64 encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Compression {
    /// No compression (raw binary)
    #[default]
    None,
    /// zlib compression
    Zlib,
}

/// Full description of how one binary array is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakEncoding {
    /// Width of each value
    pub precision: Precision,
    /// Byte order of each value
    pub byte_order: ByteOrder,
    /// Compression of the whole byte stream
    pub compression: Compression,
}

impl PeakEncoding {
    /// Uncompressed encoding with the given precision and byte order
    pub fn new(precision: Precision, byte_order: ByteOrder) -> Self {
        Self {
            precision,
            byte_order,
            compression: Compression::None,
        }
    }

    /// Set the compression
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// Errors that can occur during binary decoding
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid standard Base64
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The zlib stream could not be inflated
    #[error("Decompression error: {0}")]
    Decompression(#[source] std::io::Error),

    /// Fewer bytes than `element_count * width` after decoding
    #[error("Truncated peak data: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required for the declared element count
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// The declared element count cannot be addressed in memory
    #[error("Element count {0} is too large to decode")]
    CountOverflow(usize),

    /// A precision attribute other than 32 or 64
    #[error("Unsupported precision: {0} bits (expected 32 or 64)")]
    UnsupportedPrecision(u32),
}

/// Codec between Base64 text and `f64` sequences
pub struct PeakCodec;

impl PeakCodec {
    /// Decode a Base64-encoded binary array
    ///
    /// # Arguments
    /// * `base64_data` - Base64 text; embedded whitespace is ignored
    /// * `element_count` - Number of values to read
    /// * `encoding` - Precision, byte order and compression of the data
    ///
    /// # Returns
    /// Exactly `element_count` values widened to `f64`. Bytes beyond the
    /// declared count are ignored.
    pub fn decode(
        base64_data: &str,
        element_count: usize,
        encoding: &PeakEncoding,
    ) -> Result<Vec<f64>, CodecError> {
        if element_count == 0 {
            return Ok(Vec::new());
        }
        let expected = Self::required_bytes(element_count, encoding.precision)?;

        let cleaned: String = base64_data
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let decoded_bytes = BASE64_STANDARD.decode(cleaned.as_bytes())?;

        let bytes = match encoding.compression {
            Compression::None => decoded_bytes,
            Compression::Zlib => {
                let mut decoder = ZlibDecoder::new(&decoded_bytes[..]);
                let mut uncompressed = Vec::new();
                decoder
                    .read_to_end(&mut uncompressed)
                    .map_err(CodecError::Decompression)?;
                uncompressed
            }
        };

        let actual = bytes.len();
        if actual < expected {
            return Err(CodecError::Truncated { expected, actual });
        }

        Self::bytes_to_floats(
            &bytes[..expected],
            encoding.precision,
            encoding.byte_order,
        )
    }

    /// Bytes needed to hold `element_count` values at `precision`
    fn required_bytes(element_count: usize, precision: Precision) -> Result<usize, CodecError> {
        element_count
            .checked_mul(precision.byte_size())
            .ok_or(CodecError::CountOverflow(element_count))
    }

    /// Convert raw bytes to f64 values
    fn bytes_to_floats(
        bytes: &[u8],
        precision: Precision,
        byte_order: ByteOrder,
    ) -> Result<Vec<f64>, CodecError> {
        let count = bytes.len() / precision.byte_size();
        let truncated = |_| CodecError::Truncated {
            expected: count * precision.byte_size(),
            actual: bytes.len(),
        };

        let mut values = Vec::with_capacity(count);
        let mut cursor = Cursor::new(bytes);

        for _ in 0..count {
            let value = match (precision, byte_order) {
                (Precision::Float32, ByteOrder::BigEndian) => {
                    cursor.read_f32::<BigEndian>().map(f64::from)
                }
                (Precision::Float32, ByteOrder::LittleEndian) => {
                    cursor.read_f32::<LittleEndian>().map(f64::from)
                }
                (Precision::Float64, ByteOrder::BigEndian) => cursor.read_f64::<BigEndian>(),
                (Precision::Float64, ByteOrder::LittleEndian) => {
                    cursor.read_f64::<LittleEndian>()
                }
            };
            values.push(value.map_err(truncated)?);
        }

        Ok(values)
    }

    /// Encode values as Base64 text
    ///
    /// 32-bit output uses standard IEEE-754 double to single rounding.
    pub fn encode(values: &[f64], precision: Precision, byte_order: ByteOrder) -> String {
        BASE64_STANDARD.encode(Self::floats_to_bytes(values, precision, byte_order))
    }

    /// Serialize values into raw bytes at the given precision and byte order
    pub fn floats_to_bytes(values: &[f64], precision: Precision, byte_order: ByteOrder) -> Vec<u8> {
        let mut bytes = vec![0u8; values.len() * precision.byte_size()];

        match precision {
            Precision::Float32 => {
                let narrowed: Vec<f32> = values.iter().map(|&v| v as f32).collect();
                match byte_order {
                    ByteOrder::BigEndian => BigEndian::write_f32_into(&narrowed, &mut bytes),
                    ByteOrder::LittleEndian => LittleEndian::write_f32_into(&narrowed, &mut bytes),
                }
            }
            Precision::Float64 => match byte_order {
                ByteOrder::BigEndian => BigEndian::write_f64_into(values, &mut bytes),
                ByteOrder::LittleEndian => LittleEndian::write_f64_into(values, &mut bytes),
            },
        }

        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_float64_little_endian() {
        let encoding = PeakEncoding::new(Precision::Float64, ByteOrder::LittleEndian);
        let result = PeakCodec::decode("AAAAAAAgWUAAAAAAAAhpQA==", 2, &encoding).unwrap();

        assert_eq!(result, vec![100.5, 200.25]);
    }

    #[test]
    fn test_encode_float64_little_endian() {
        let encoded =
            PeakCodec::encode(&[100.5, 200.25], Precision::Float64, ByteOrder::LittleEndian);
        assert_eq!(encoded, "AAAAAAAgWUAAAAAAAAhpQA==");
    }

    #[test]
    fn test_encode_every_precision_and_order() {
        let big64 = PeakCodec::encode(&[100.5, 200.25], Precision::Float64, ByteOrder::BigEndian);
        assert_eq!(big64, "QFkgAAAAAABAaQgAAAAAAA==");

        let big32 = PeakCodec::encode(
            &[100.0, 1000.0, 200.0, 500.0],
            Precision::Float32,
            ByteOrder::BigEndian,
        );
        assert_eq!(big32, "QsgAAER6AABDSAAAQ/oAAA==");

        let little32 = PeakCodec::encode(&[1.0, 2.0], Precision::Float32, ByteOrder::LittleEndian);
        assert_eq!(little32, "AACAPwAAAEA=");
    }

    #[test]
    fn test_decode_float64_big_endian() {
        let encoding = PeakEncoding::new(Precision::Float64, ByteOrder::BigEndian);
        let result = PeakCodec::decode("QFkgAAAAAABAaQgAAAAAAA==", 2, &encoding).unwrap();

        assert_eq!(result, vec![100.5, 200.25]);
    }

    #[test]
    fn test_decode_float32_big_endian() {
        // 100.0, 1000.0, 200.0, 500.0 as network-order floats
        let encoding = PeakEncoding::new(Precision::Float32, ByteOrder::BigEndian);
        let result = PeakCodec::decode("QsgAAER6AABDSAAAQ/oAAA==", 4, &encoding).unwrap();

        assert_eq!(result, vec![100.0, 1000.0, 200.0, 500.0]);
    }

    #[test]
    fn test_decode_zlib_compressed() {
        let encoding = PeakEncoding::new(Precision::Float32, ByteOrder::BigEndian)
            .with_compression(Compression::Zlib);
        let result = PeakCodec::decode("eJxzOsHA4FLFwODsAcS/GBgAIGADkQ==", 4, &encoding).unwrap();

        assert_eq!(result, vec![100.0, 1000.0, 200.0, 500.0]);
    }

    #[test]
    fn test_decode_zlib_roundtrip_with_flate2() {
        use flate2::write::ZlibEncoder;
        use std::io::Write;

        let values: Vec<f64> = vec![100.0, 200.0, 300.0, 400.0];
        let bytes = PeakCodec::floats_to_bytes(&values, Precision::Float64, ByteOrder::LittleEndian);

        let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&bytes).unwrap();
        let compressed = encoder.finish().unwrap();
        let base64_data = BASE64_STANDARD.encode(&compressed);

        let encoding = PeakEncoding::new(Precision::Float64, ByteOrder::LittleEndian)
            .with_compression(Compression::Zlib);
        let result = PeakCodec::decode(&base64_data, 4, &encoding).unwrap();
        assert_eq!(result, values);
    }

    #[test]
    fn test_decode_ignores_embedded_whitespace() {
        let encoding = PeakEncoding::new(Precision::Float64, ByteOrder::LittleEndian);
        let result =
            PeakCodec::decode("AAAAAAAgWUAA\n  AAAAAAhpQA==\n", 2, &encoding).unwrap();

        assert_eq!(result, vec![100.5, 200.25]);
    }

    #[test]
    fn test_decode_zero_elements() {
        let encoding = PeakEncoding::new(Precision::Float64, ByteOrder::LittleEndian);
        assert!(PeakCodec::decode("", 0, &encoding).unwrap().is_empty());
    }

    #[test]
    fn test_decode_truncated() {
        let encoding = PeakEncoding::new(Precision::Float64, ByteOrder::LittleEndian);
        let err = PeakCodec::decode("AAAAAAAgWUAAAAAAAAhpQA==", 3, &encoding).unwrap_err();

        match err {
            CodecError::Truncated { expected, actual } => {
                assert_eq!(expected, 24);
                assert_eq!(actual, 16);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_huge_count_is_an_error() {
        let encoding = PeakEncoding::new(Precision::Float64, ByteOrder::LittleEndian);
        let err = PeakCodec::decode("AAAAAAAgWUAAAAAAAAhpQA==", usize::MAX / 4, &encoding)
            .unwrap_err();

        assert!(matches!(err, CodecError::CountOverflow(n) if n == usize::MAX / 4));
    }

    #[test]
    fn test_decode_extra_bytes_are_ignored() {
        let encoding = PeakEncoding::new(Precision::Float64, ByteOrder::LittleEndian);
        let result = PeakCodec::decode("AAAAAAAgWUAAAAAAAAhpQA==", 1, &encoding).unwrap();

        assert_eq!(result, vec![100.5]);
    }

    #[test]
    fn test_decode_invalid_base64() {
        let encoding = PeakEncoding::new(Precision::Float32, ByteOrder::BigEndian);
        let err = PeakCodec::decode("not*base64!", 1, &encoding).unwrap_err();

        assert!(matches!(err, CodecError::Base64(_)));
    }

    #[test]
    fn test_decode_corrupt_zlib() {
        let encoding = PeakEncoding::new(Precision::Float32, ByteOrder::BigEndian)
            .with_compression(Compression::Zlib);
        // Valid base64, but the bytes are not a zlib stream
        let err = PeakCodec::decode("QsgAAER6AABDSAAAQ/oAAA==", 4, &encoding).unwrap_err();

        assert!(matches!(err, CodecError::Decompression(_)));
    }

    #[test]
    fn test_unsupported_precision() {
        assert!(matches!(
            Precision::from_bits(16),
            Err(CodecError::UnsupportedPrecision(16))
        ));
        assert_eq!(Precision::from_bits(32).unwrap(), Precision::Float32);
        assert_eq!(Precision::from_bits(64).unwrap().bits(), 64);
    }

    #[test]
    fn test_byte_order_reverses_all_bytes() {
        let big = PeakCodec::floats_to_bytes(&[1.5], Precision::Float32, ByteOrder::BigEndian);
        let little =
            PeakCodec::floats_to_bytes(&[1.5], Precision::Float32, ByteOrder::LittleEndian);

        let mut reversed = big.clone();
        reversed.reverse();
        assert_eq!(little, reversed);
        assert_eq!(big, vec![0x3f, 0xc0, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_float32_rounds_to_single() {
        let encoded = PeakCodec::encode(&[0.1], Precision::Float32, ByteOrder::LittleEndian);
        let encoding = PeakEncoding::new(Precision::Float32, ByteOrder::LittleEndian);
        let decoded = PeakCodec::decode(&encoded, 1, &encoding).unwrap();

        assert_eq!(decoded[0], 0.1f32 as f64);
    }
}
