//! Sequential pass over an mzXML document
//!
//! Collects the run header and one [`RawMzXmlScan`] per `<scan>` element.
//! Scans are recorded when their start tag is read, so a parent always
//! precedes its nested children and document order is kept.

use std::io::BufRead;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::raw::{parse_polarity, parse_retention_time, RawMzXmlScan};
use crate::binary::Compression;
use crate::config::NestingPolicy;
use crate::error::{MzError, Result};
use crate::formats::xml::{
    get_attribute, new_reader, parse_attribute, parse_value, required_attribute, soft_f64,
    soft_parse_f64,
};
use crate::model::Instrument;

const FORMAT: &str = "mzXML";

/// Run-level information from `<msRun>`
#[derive(Debug, Clone, Default)]
pub(crate) struct MzXmlHeader {
    pub scan_count: u64,
    pub source_file: Option<String>,
    pub instrument: Instrument,
    /// Run-wide `dataProcessing@centroided` flag
    pub centroided: bool,
}

/// Everything collected by the sequential pass
#[derive(Debug, Default)]
pub(crate) struct ParsedMzXml {
    pub header: MzXmlHeader,
    pub scans: Vec<RawMzXmlScan>,
}

/// Pull parser state for one mzXML document
pub(crate) struct MzXmlParser<R: BufRead> {
    reader: Reader<R>,
    nesting: NestingPolicy,
    parsed: ParsedMzXml,
    /// Open `<scan>` elements; `None` marks a scan dropped by the nesting policy
    open_scans: Vec<Option<usize>>,
    seen_run: bool,
    in_instrument: bool,
    in_peaks: bool,
    in_precursor: bool,
    precursor_text: String,
}

impl<R: BufRead> MzXmlParser<R> {
    /// Create a parser over a buffered source
    pub fn new(source: R, nesting: NestingPolicy) -> Self {
        Self {
            reader: new_reader(source),
            nesting,
            parsed: ParsedMzXml::default(),
            open_scans: Vec::new(),
            seen_run: false,
            in_instrument: false,
            in_peaks: false,
            in_precursor: false,
            precursor_text: String::new(),
        }
    }

    /// Read the whole document
    pub fn parse(mut self) -> Result<ParsedMzXml> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => self.handle_start(e, false)?,
                Ok(Event::Empty(ref e)) => self.handle_start(e, true)?,
                Ok(Event::Text(ref t)) => {
                    if self.in_peaks || self.in_precursor {
                        let text = t.unescape()?;
                        self.handle_text(&text);
                    }
                }
                Ok(Event::End(ref e)) => self.handle_end(e.local_name().as_ref())?,
                Ok(Event::Eof) => break,
                Err(e) => return Err(MzError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        if !self.open_scans.is_empty() {
            return Err(MzError::InvalidStructure {
                format: FORMAT,
                message: "Unexpected EOF inside <scan>".to_string(),
            });
        }
        if !self.seen_run {
            return Err(MzError::InvalidStructure {
                format: FORMAT,
                message: "No <msRun> element found".to_string(),
            });
        }

        debug!(
            "Parsed {} mzXML scans (declared {})",
            self.parsed.scans.len(),
            self.parsed.header.scan_count
        );
        Ok(self.parsed)
    }

    /// Index of the innermost open scan, if it is being kept
    fn current_scan(&self) -> Option<usize> {
        self.open_scans.last().copied().flatten()
    }

    fn handle_start(&mut self, e: &BytesStart, empty: bool) -> Result<()> {
        match e.local_name().as_ref() {
            b"msRun" => {
                self.seen_run = true;
                self.parsed.header.scan_count =
                    parse_attribute(e, "msRun", "scanCount")?.unwrap_or(0);
            }
            b"parentFile" => {
                if self.parsed.header.source_file.is_none() {
                    self.parsed.header.source_file = get_attribute(e, "fileName")?;
                }
            }
            b"msInstrument" => {
                self.in_instrument = !empty;
            }
            b"msManufacturer" | b"msModel" | b"msMassAnalyzer" | b"msIonisation"
            | b"msDetector" | b"msResolution"
                if self.in_instrument =>
            {
                self.apply_instrument_value(e)?;
            }
            b"instrument" => {
                // mzXML 2.0 flattens the instrument into attributes
                let instrument = &mut self.parsed.header.instrument;
                if let Some(v) = get_attribute(e, "manufacturer")? {
                    instrument.manufacturer = v;
                }
                if let Some(v) = get_attribute(e, "model")? {
                    instrument.model = v;
                }
                if let Some(v) = get_attribute(e, "msType")? {
                    instrument.mass_analyzer = v;
                }
                if let Some(v) = get_attribute(e, "ionisation")? {
                    instrument.ionization = v;
                }
                if let Some(v) = get_attribute(e, "detector")? {
                    instrument.detector = v;
                }
            }
            b"dataProcessing" => {
                if let Some(v) = get_attribute(e, "centroided")? {
                    self.parsed.header.centroided = parse_flag(&v, "dataProcessing", "centroided")?;
                }
            }
            b"scan" => self.open_scan(e, empty)?,
            b"precursorMz" => {
                if let Some(idx) = self.current_scan() {
                    let scan = &mut self.parsed.scans[idx];
                    if scan.precursor_mz.is_none() {
                        scan.precursor_intensity =
                            soft_f64(e, "precursorMz", "precursorIntensity")?;
                        self.in_precursor = !empty;
                        self.precursor_text.clear();
                    }
                }
            }
            b"peaks" => {
                if let Some(idx) = self.current_scan() {
                    let peaks = &mut self.parsed.scans[idx].peaks;
                    if let Some(bits) = parse_attribute(e, "peaks", "precision")? {
                        peaks.precision_bits = bits;
                    }
                    peaks.compression = match get_attribute(e, "compressionType")?.as_deref() {
                        Some("zlib") => Compression::Zlib,
                        _ => Compression::None,
                    };
                    peaks.base64.clear();
                    self.in_peaks = !empty;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn apply_instrument_value(&mut self, e: &BytesStart) -> Result<()> {
        let Some(value) = get_attribute(e, "value")? else {
            return Ok(());
        };
        let instrument = &mut self.parsed.header.instrument;
        match e.local_name().as_ref() {
            b"msManufacturer" => instrument.manufacturer = value,
            b"msModel" => instrument.model = value,
            b"msMassAnalyzer" => instrument.mass_analyzer = value,
            b"msIonisation" => instrument.ionization = value,
            b"msDetector" => instrument.detector = value,
            b"msResolution" => {
                instrument.resolution = soft_parse_f64(&value, "msResolution", "value");
            }
            _ => {}
        }
        Ok(())
    }

    fn open_scan(&mut self, e: &BytesStart, empty: bool) -> Result<()> {
        let depth = self.open_scans.len() + 1;

        // Everything below a dropped scan is dropped with it
        if matches!(self.open_scans.last(), Some(None)) {
            if !empty {
                self.open_scans.push(None);
            }
            return Ok(());
        }

        let parent_scan = self
            .current_scan()
            .map(|idx| self.parsed.scans[idx].id)
            .unwrap_or(0);

        if depth > 2 {
            match self.nesting {
                NestingPolicy::Warn => {
                    let num = get_attribute(e, "num")?.unwrap_or_default();
                    warn!(
                        "Skipping scan {} nested {} levels deep under scan {}",
                        num, depth, parent_scan
                    );
                    if !empty {
                        self.open_scans.push(None);
                    }
                    return Ok(());
                }
                NestingPolicy::Reject => {
                    let scan = parse_value(&required_attribute(e, "scan", "num")?, "scan", "num")?;
                    return Err(MzError::UnsupportedNesting { scan, depth });
                }
                NestingPolicy::Recurse => {}
            }
        }

        let raw = read_scan_attributes(e, parent_scan)?;
        self.parsed.scans.push(raw);
        if !empty {
            self.open_scans.push(Some(self.parsed.scans.len() - 1));
        }
        Ok(())
    }

    fn handle_text(&mut self, text: &str) {
        if self.in_peaks {
            if let Some(idx) = self.current_scan() {
                self.parsed.scans[idx].peaks.base64.push_str(text);
            }
        } else if self.in_precursor {
            self.precursor_text.push_str(text);
        }
    }

    fn handle_end(&mut self, name: &[u8]) -> Result<()> {
        match name {
            b"scan" => {
                self.open_scans.pop();
            }
            b"peaks" => {
                self.in_peaks = false;
            }
            b"precursorMz" => {
                if self.in_precursor {
                    self.in_precursor = false;
                    if let Some(idx) = self.current_scan() {
                        let mz = parse_value(&self.precursor_text, "precursorMz", "#text")?;
                        self.parsed.scans[idx].precursor_mz = Some(mz);
                    }
                }
            }
            b"msInstrument" => {
                self.in_instrument = false;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Read the attributes of a `<scan>` start tag
fn read_scan_attributes(e: &BytesStart, parent_scan: u64) -> Result<RawMzXmlScan> {
    let id = parse_value(&required_attribute(e, "scan", "num")?, "scan", "num")?;

    let retention_time = match get_attribute(e, "retentionTime")? {
        Some(value) => {
            parse_retention_time(&value).ok_or(MzError::InvalidAttributeValue {
                element: "scan",
                attribute: "retentionTime",
                value,
            })?
        }
        None => 0.0,
    };

    Ok(RawMzXmlScan {
        id,
        parent_scan,
        ms_level: parse_attribute(e, "scan", "msLevel")?.unwrap_or(1),
        retention_time,
        polarity: parse_polarity(get_attribute(e, "polarity")?.as_deref()),
        mz_range: [soft_f64(e, "scan", "lowMz")?, soft_f64(e, "scan", "highMz")?],
        collision_energy: soft_f64(e, "scan", "collisionEnergy")?,
        peak_count: parse_attribute(e, "scan", "peaksCount")?.unwrap_or(0),
        ..Default::default()
    })
}

/// Interpret a 0/1 (or false/true) flag attribute
fn parse_flag(value: &str, element: &'static str, attribute: &'static str) -> Result<bool> {
    match value.trim() {
        "0" | "false" => Ok(false),
        "1" | "true" => Ok(true),
        _ => Err(MzError::InvalidAttributeValue {
            element,
            attribute,
            value: value.to_string(),
        }),
    }
}

/// Run the sequential pass over `source`
pub(crate) fn parse<R: BufRead>(source: R, nesting: NestingPolicy) -> Result<ParsedMzXml> {
    MzXmlParser::new(source, nesting).parse()
}
