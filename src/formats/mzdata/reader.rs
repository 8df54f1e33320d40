//! mzData decoder
//!
//! mzData keeps m/z and intensities in two separate `<data>` blocks per
//! spectrum, each with its own precision and byte order. Precursor scans are
//! referenced by `precursor@spectrumRef` instead of by nesting.

use std::io::BufRead;

use log::{debug, info, warn};
use quick_xml::events::{BytesStart, Event};

use super::cv_params::{find_param, CvParam};
use crate::binary::{ByteOrder, PeakCodec, PeakEncoding, Precision};
use crate::config::DecodeConfig;
use crate::error::{MzError, Result};
use crate::formats::parallel::decode_ordered;
use crate::formats::xml::{
    get_attribute, new_reader, parse_attribute, parse_value, required_attribute, soft_f64,
};
use crate::model::{Instrument, Polarity, RawData, Scan};

const FORMAT: &str = "mzData";

/// One `<data>` block, still Base64-encoded
#[derive(Debug, Clone)]
struct RawArray {
    precision_bits: Option<u32>,
    byte_order: ByteOrder,
    length: usize,
    base64: String,
}

impl Default for RawArray {
    fn default() -> Self {
        Self {
            precision_bits: None,
            byte_order: ByteOrder::LittleEndian,
            length: 0,
            base64: String::new(),
        }
    }
}

impl RawArray {
    fn from_start(e: &BytesStart) -> Result<Self> {
        let length: usize = parse_attribute(e, "data", "length")?.unwrap_or(0);
        let precision_bits: Option<u32> = parse_attribute(e, "data", "precision")?;
        if length > 0 && precision_bits.is_none() {
            return Err(MzError::MissingAttribute {
                element: "data",
                attribute: "precision",
            });
        }
        let byte_order = match get_attribute(e, "endian")?.as_deref() {
            Some("big") => ByteOrder::BigEndian,
            _ => ByteOrder::LittleEndian,
        };

        Ok(Self {
            precision_bits,
            byte_order,
            length,
            base64: String::new(),
        })
    }

    fn decode(&self, scan: u64) -> Result<Vec<f64>> {
        if self.length == 0 {
            return Ok(Vec::new());
        }
        let codec_error = |source| MzError::Codec { scan, source };
        let precision =
            Precision::from_bits(self.precision_bits.unwrap_or(0)).map_err(codec_error)?;
        let encoding = PeakEncoding::new(precision, self.byte_order);
        PeakCodec::decode(&self.base64, self.length, &encoding).map_err(codec_error)
    }
}

/// First `<precursor>` of a spectrum
#[derive(Debug, Clone, Default)]
struct RawPrecursor {
    spectrum_ref: u64,
    ion_selection: Vec<CvParam>,
    activation: Vec<CvParam>,
}

/// One `<spectrum>` with undecoded arrays
#[derive(Debug, Clone, Default)]
struct RawMzDataSpectrum {
    id: u64,
    ms_level: u8,
    mz_range: [f64; 2],
    instrument_params: Vec<CvParam>,
    spectrum_type: String,
    precursor: Option<RawPrecursor>,
    mz: RawArray,
    intensity: RawArray,
}

impl RawMzDataSpectrum {
    fn decode(self, deisotoped: bool) -> Result<Scan> {
        let id = self.id;
        let mz_array = self.mz.decode(id)?;
        let intensity_array = self.intensity.decode(id)?;
        if mz_array.len() != intensity_array.len() {
            return Err(MzError::ArrayLengthMismatch {
                scan: id,
                mz: mz_array.len(),
                intensity: intensity_array.len(),
            });
        }

        let params = &self.instrument_params;
        let mut scan = Scan {
            id,
            ms_level: self.ms_level,
            retention_time: param_f64(params, "TimeInMinutes"),
            polarity: match find_param(params, "Polarity") {
                Some("positive") => Polarity::Positive,
                Some(_) => Polarity::Negative,
                None => Polarity::Unknown,
            },
            mz_range: self.mz_range,
            continuous: self.spectrum_type == "continuous",
            deisotoped,
            mz_array,
            intensity_array,
            ..Default::default()
        };

        if let Some(precursor) = self.precursor {
            scan.parent_scan = precursor.spectrum_ref;
            scan.precursor_mz = param_f64(&precursor.ion_selection, "MassToChargeRatio");
            scan.precursor_intensity = param_f64(&precursor.ion_selection, "Intensity");
            scan.collision_energy = param_f64(&precursor.activation, "CollisionEnergy");
        }

        Ok(scan)
    }
}

/// Numeric cvParam value, 0.0 when missing or malformed
fn param_f64(params: &[CvParam], name: &str) -> f64 {
    match find_param(params, name) {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring non-numeric cvParam {name}='{value}'");
            0.0
        }),
        None => 0.0,
    }
}

/// Run-level fields gathered before the spectra are decoded
#[derive(Debug, Default)]
struct RunDescription {
    source_name: String,
    source_path: String,
    instrument: Instrument,
    processing: Vec<CvParam>,
    scan_count: u64,
}

impl RunDescription {
    fn source_file(&self) -> String {
        if self.source_path.is_empty() {
            self.source_name.clone()
        } else if self.source_path.ends_with('/') {
            format!("{}{}", self.source_path, self.source_name)
        } else {
            format!("{}/{}", self.source_path, self.source_name)
        }
    }

    /// Run-wide Deisotoping flag; unrecognized values count as false
    fn deisotoped(&self) -> bool {
        find_param(&self.processing, "Deisotoping")
            .and_then(parse_bool)
            .unwrap_or(false)
    }
}

/// Boolean spellings accepted in cvParam values
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Collect the run description and raw spectra in one sequential pass
fn parse<R: BufRead>(source: R) -> Result<(RunDescription, Vec<RawMzDataSpectrum>)> {
    let mut reader = new_reader(source);
    let mut buf = Vec::new();

    let mut run = RunDescription::default();
    let mut spectra = Vec::new();
    let mut current: Option<RawMzDataSpectrum> = None;
    let mut precursors_seen = 0usize;
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name().as_ref().to_vec();
                handle_element(e, &stack, &mut run, &mut current, &mut precursors_seen)?;
                if name == b"mzData" {
                    seen_root = true;
                }
                if name == b"spectrum" {
                    current = Some(RawMzDataSpectrum {
                        id: parse_id(e)?,
                        ms_level: 1,
                        ..Default::default()
                    });
                    precursors_seen = 0;
                }
                stack.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"mzData" {
                    seen_root = true;
                }
                if e.local_name().as_ref() == b"spectrum" {
                    spectra.push(RawMzDataSpectrum {
                        id: parse_id(e)?,
                        ms_level: 1,
                        ..Default::default()
                    });
                } else {
                    handle_element(e, &stack, &mut run, &mut current, &mut precursors_seen)?;
                }
            }
            Ok(Event::Text(ref t)) => {
                let text = t.unescape()?;
                handle_text(&text, &stack, &mut run, &mut current);
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"spectrum" {
                    if let Some(spectrum) = current.take() {
                        spectra.push(spectrum);
                    }
                }
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MzError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if current.is_some() {
        return Err(MzError::InvalidStructure {
            format: FORMAT,
            message: "Unexpected EOF inside <spectrum>".to_string(),
        });
    }
    if !seen_root {
        return Err(MzError::InvalidStructure {
            format: FORMAT,
            message: "No <mzData> element found".to_string(),
        });
    }

    debug!("Parsed {} mzData spectra", spectra.len());
    Ok((run, spectra))
}

fn parse_id(e: &BytesStart) -> Result<u64> {
    let value = required_attribute(e, "spectrum", "id")?;
    parse_value(&value, "spectrum", "id")
}

/// Apply a start or empty tag given the names of its open ancestors
fn handle_element(
    e: &BytesStart,
    stack: &[Vec<u8>],
    run: &mut RunDescription,
    current: &mut Option<RawMzDataSpectrum>,
    precursors_seen: &mut usize,
) -> Result<()> {
    let parent = stack.last().map(Vec::as_slice);

    match e.local_name().as_ref() {
        b"spectrumList" => {
            run.scan_count = parse_attribute(e, "spectrumList", "count")?.unwrap_or(0);
        }
        b"cvParam" => {
            let param = CvParam::from_start(e)?;
            match (parent, current.as_mut()) {
                (Some(b"spectrumInstrument"), Some(spectrum)) => {
                    spectrum.instrument_params.push(param);
                }
                // Only the first precursor is kept
                (Some(b"ionSelection"), Some(spectrum)) if *precursors_seen == 1 => {
                    if let Some(precursor) = spectrum.precursor.as_mut() {
                        precursor.ion_selection.push(param);
                    }
                }
                (Some(b"activation"), Some(spectrum)) if *precursors_seen == 1 => {
                    if let Some(precursor) = spectrum.precursor.as_mut() {
                        precursor.activation.push(param);
                    }
                }
                (Some(b"analyzer"), None) if param.name == "AnalyzerType" => {
                    run.instrument.mass_analyzer = param.value;
                }
                (Some(b"detector"), None) if param.name == "DetectorType" => {
                    run.instrument.detector = param.value;
                }
                (Some(b"source"), None) if param.name == "IonizationType" => {
                    run.instrument.ionization = param.value;
                }
                (Some(b"processingMethod"), None) => run.processing.push(param),
                _ => {}
            }
        }
        b"spectrumInstrument" => {
            if let Some(spectrum) = current.as_mut() {
                spectrum.ms_level = parse_attribute(e, "spectrumInstrument", "msLevel")?.unwrap_or(1);
                spectrum.mz_range = [
                    soft_f64(e, "spectrumInstrument", "mzRangeStart")?,
                    soft_f64(e, "spectrumInstrument", "mzRangeStop")?,
                ];
            }
        }
        b"acqSpecification" => {
            if let Some(spectrum) = current.as_mut() {
                spectrum.spectrum_type = get_attribute(e, "spectrumType")?.unwrap_or_default();
            }
        }
        b"precursor" => {
            if let Some(spectrum) = current.as_mut() {
                *precursors_seen += 1;
                if *precursors_seen == 1 {
                    spectrum.precursor = Some(RawPrecursor {
                        spectrum_ref: parse_attribute(e, "precursor", "spectrumRef")?.unwrap_or(0),
                        ..Default::default()
                    });
                }
            }
        }
        b"data" => {
            if let Some(spectrum) = current.as_mut() {
                match parent {
                    Some(b"mzArrayBinary") => spectrum.mz = RawArray::from_start(e)?,
                    Some(b"intenArrayBinary") => spectrum.intensity = RawArray::from_start(e)?,
                    _ => {}
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn handle_text(
    text: &str,
    stack: &[Vec<u8>],
    run: &mut RunDescription,
    current: &mut Option<RawMzDataSpectrum>,
) {
    let Some(element) = stack.last().map(Vec::as_slice) else {
        return;
    };
    let parent = stack.len().checked_sub(2).map(|i| stack[i].as_slice());

    match (element, current.as_mut()) {
        (b"data", Some(spectrum)) => match parent {
            Some(b"mzArrayBinary") => spectrum.mz.base64.push_str(text),
            Some(b"intenArrayBinary") => spectrum.intensity.base64.push_str(text),
            _ => {}
        },
        (b"nameOfFile", None) => run.source_name.push_str(text),
        (b"pathToFile", None) => run.source_path.push_str(text),
        (b"instrumentName", None) => run.instrument.model.push_str(text),
        _ => {}
    }
}

/// Decoder for mzData 1.05 documents
#[derive(Debug, Clone, Default)]
pub struct MzDataDecoder {
    config: DecodeConfig,
}

impl MzDataDecoder {
    /// Create a decoder with the given settings
    pub fn new(config: DecodeConfig) -> Self {
        Self { config }
    }

    /// Decode a complete mzData document
    pub fn decode<R: BufRead>(&self, source: R) -> Result<RawData> {
        let (run, spectra) = parse(source)?;
        let deisotoped = run.deisotoped();

        let scans = decode_ordered(spectra, self.config.threads, |raw| raw.decode(deisotoped))?;
        if scans.len() as u64 != run.scan_count {
            warn!(
                "spectrumList declares {} spectra but {} were decoded",
                run.scan_count,
                scans.len()
            );
        }
        info!("Decoded {} mzData spectra", scans.len());

        let mut data = RawData::new();
        data.source_file = run.source_file();
        data.instrument = run.instrument;
        data.instrument.manufacturer = data.instrument.model.clone();
        data.scan_count = run.scan_count;
        data.scans = scans;
        Ok(data)
    }
}
