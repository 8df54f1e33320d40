//! mzData 1.05 encoder
//!
//! Arrays are always written as uncompressed little-endian 64-bit floats.
//! Everything the mzData decoder reads is written back, so a decoded run
//! survives an encode/decode cycle unchanged.

use std::io::Write;

use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::cv_params::{CvParam, PSI_ACCESSIONS};
use crate::binary::{ByteOrder, PeakCodec, Precision};
use crate::error::Result;
use crate::model::{Polarity, RawData, Scan};

const MZDATA_VERSION: &str = "1.05";

/// Encoder for mzData 1.05 documents
#[derive(Debug, Clone, Copy, Default)]
pub struct MzDataEncoder;

impl MzDataEncoder {
    /// Create an encoder
    pub fn new() -> Self {
        Self
    }

    /// Render `data` to `sink`
    ///
    /// On error the sink may hold a partial document.
    pub fn encode<W: Write>(&self, data: &RawData, sink: W) -> Result<()> {
        let mut writer = Writer::new_with_indent(sink, b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("mzData");
        root.push_attribute(("version", MZDATA_VERSION));
        root.push_attribute(("accessionNumber", "psi-ms:100"));
        root.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
        writer.write_event(Event::Start(root))?;

        let mut cv_lookup = BytesStart::new("cvLookup");
        cv_lookup.push_attribute(("cvLabel", "psi"));
        cv_lookup.push_attribute(("fullName", "The PSI Ontology"));
        cv_lookup.push_attribute(("version", "1.00"));
        cv_lookup.push_attribute(("address", "http://psidev.sourceforge.net/ontology"));
        writer.write_event(Event::Empty(cv_lookup))?;

        write_description(&mut writer, data)?;

        let count = data.scans.len().to_string();
        let mut list = BytesStart::new("spectrumList");
        list.push_attribute(("count", count.as_str()));
        writer.write_event(Event::Start(list))?;
        for scan in &data.scans {
            write_spectrum(&mut writer, scan)?;
        }
        writer.write_event(Event::End(BytesEnd::new("spectrumList")))?;

        writer.write_event(Event::End(BytesEnd::new("mzData")))?;
        writer.into_inner().flush()?;

        debug!("Encoded {} spectra as mzData", data.scans.len());
        Ok(())
    }
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    if text.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
        return Ok(());
    }
    start(writer, name)?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

fn write_cv_params<W: Write>(writer: &mut Writer<W>, params: &[CvParam]) -> Result<()> {
    for cv in params {
        let mut tag = BytesStart::new("cvParam");
        tag.push_attribute(("cvLabel", cv.cv_label.as_str()));
        tag.push_attribute(("accession", cv.accession.as_str()));
        tag.push_attribute(("name", cv.name.as_str()));
        tag.push_attribute(("value", cv.value.as_str()));
        writer.write_event(Event::Empty(tag))?;
    }
    Ok(())
}

/// Wrap `params` in an element called `name`
fn cv_container<W: Write>(writer: &mut Writer<W>, name: &str, params: &[CvParam]) -> Result<()> {
    start(writer, name)?;
    write_cv_params(writer, params)?;
    end(writer, name)
}

/// Split a source path at its last '/' into (directory, file name)
///
/// The separator stays on the directory when dropping it would leave the
/// directory empty or ending in '/', so the reader can rejoin losslessly.
fn split_source_file(source_file: &str) -> (&str, &str) {
    match source_file.rfind('/') {
        Some(i) => {
            let dir = &source_file[..i];
            let dir = if dir.is_empty() || dir.ends_with('/') {
                &source_file[..=i]
            } else {
                dir
            };
            (dir, &source_file[i + 1..])
        }
        None => ("", source_file),
    }
}

fn write_description<W: Write>(writer: &mut Writer<W>, data: &RawData) -> Result<()> {
    let instrument = &data.instrument;
    let deisotoped = data.scans.first().map(|s| s.deisotoped).unwrap_or(false);
    let (path, name) = split_source_file(&data.source_file);

    start(writer, "description")?;

    start(writer, "admin")?;
    text_element(writer, "sampleName", "")?;
    start(writer, "sourceFile")?;
    text_element(writer, "nameOfFile", name)?;
    text_element(writer, "pathToFile", path)?;
    end(writer, "sourceFile")?;
    end(writer, "admin")?;

    start(writer, "instrument")?;
    text_element(writer, "instrumentName", &instrument.model)?;
    cv_container(
        writer,
        "source",
        &[CvParam::psi(
            PSI_ACCESSIONS::IONIZATION_TYPE,
            "IonizationType",
            instrument.ionization.as_str(),
        )],
    )?;
    let mut analyzers = BytesStart::new("analyzerList");
    analyzers.push_attribute(("count", "1"));
    writer.write_event(Event::Start(analyzers))?;
    cv_container(
        writer,
        "analyzer",
        &[CvParam::psi(
            PSI_ACCESSIONS::ANALYZER_TYPE,
            "AnalyzerType",
            instrument.mass_analyzer.as_str(),
        )],
    )?;
    end(writer, "analyzerList")?;
    cv_container(
        writer,
        "detector",
        &[
            CvParam::psi(
                PSI_ACCESSIONS::DETECTOR_TYPE,
                "DetectorType",
                instrument.detector.as_str(),
            ),
            CvParam::psi(PSI_ACCESSIONS::SAMPLING_FREQUENCY, "SamplingFrequency", "unknown"),
        ],
    )?;
    end(writer, "instrument")?;

    start(writer, "dataProcessing")?;
    start(writer, "software")?;
    text_element(
        writer,
        "name",
        &format!("mzlib, Version={}", env!("CARGO_PKG_VERSION")),
    )?;
    text_element(writer, "version", env!("CARGO_PKG_VERSION"))?;
    end(writer, "software")?;
    cv_container(
        writer,
        "processingMethod",
        &[
            CvParam::psi(PSI_ACCESSIONS::DEISOTOPING, "Deisotoping", deisotoped.to_string()),
            CvParam::psi(
                PSI_ACCESSIONS::CHARGE_DECONVOLUTION,
                "ChargeDeconvolution",
                "unknown",
            ),
            CvParam::psi(PSI_ACCESSIONS::PEAK_PROCESSING, "PeakProcessing", "unknown"),
        ],
    )?;
    end(writer, "dataProcessing")?;

    end(writer, "description")
}

fn write_spectrum<W: Write>(writer: &mut Writer<W>, scan: &Scan) -> Result<()> {
    let id = scan.id.to_string();
    let mut spectrum = BytesStart::new("spectrum");
    spectrum.push_attribute(("id", id.as_str()));
    writer.write_event(Event::Start(spectrum))?;

    start(writer, "spectrumDesc")?;
    start(writer, "spectrumSettings")?;

    let mut acquisition_spec = BytesStart::new("acqSpecification");
    if scan.continuous {
        acquisition_spec.push_attribute(("spectrumType", "continuous"));
    } else {
        acquisition_spec.push_attribute(("spectrumType", "discrete"));
        acquisition_spec.push_attribute(("methodOfCombination", "sum"));
    }
    acquisition_spec.push_attribute(("count", "1"));
    writer.write_event(Event::Start(acquisition_spec))?;
    let mut acquisition = BytesStart::new("acquisition");
    acquisition.push_attribute(("number", id.as_str()));
    writer.write_event(Event::Empty(acquisition))?;
    end(writer, "acqSpecification")?;

    let ms_level = scan.ms_level.to_string();
    let range_start = scan.mz_range[0].to_string();
    let range_stop = scan.mz_range[1].to_string();
    let mut instrument = BytesStart::new("spectrumInstrument");
    instrument.push_attribute(("msLevel", ms_level.as_str()));
    instrument.push_attribute(("mzRangeStart", range_start.as_str()));
    instrument.push_attribute(("mzRangeStop", range_stop.as_str()));
    writer.write_event(Event::Start(instrument))?;

    let mut params = vec![CvParam::psi(PSI_ACCESSIONS::SCAN_MODE, "ScanMode", "Scan")];
    // Unknown polarity is left out so it decodes as unknown again
    match scan.polarity {
        Polarity::Positive => {
            params.push(CvParam::psi(PSI_ACCESSIONS::POLARITY, "Polarity", "positive"))
        }
        Polarity::Negative => {
            params.push(CvParam::psi(PSI_ACCESSIONS::POLARITY, "Polarity", "negative"))
        }
        Polarity::Unknown => {}
    }
    params.push(CvParam::psi(
        PSI_ACCESSIONS::TIME_IN_MINUTES,
        "TimeInMinutes",
        scan.retention_time.to_string(),
    ));
    write_cv_params(writer, &params)?;
    end(writer, "spectrumInstrument")?;

    end(writer, "spectrumSettings")?;

    if scan.has_parent() {
        write_precursor_list(writer, scan)?;
    }

    end(writer, "spectrumDesc")?;

    write_array(writer, "mzArrayBinary", &scan.mz_array)?;
    write_array(writer, "intenArrayBinary", &scan.intensity_array)?;

    end(writer, "spectrum")
}

fn write_precursor_list<W: Write>(writer: &mut Writer<W>, scan: &Scan) -> Result<()> {
    let mut list = BytesStart::new("precursorList");
    list.push_attribute(("count", "1"));
    writer.write_event(Event::Start(list))?;

    let ms_level = scan.ms_level.saturating_sub(1).to_string();
    let spectrum_ref = scan.parent_scan.to_string();
    let mut precursor = BytesStart::new("precursor");
    precursor.push_attribute(("msLevel", ms_level.as_str()));
    precursor.push_attribute(("spectrumRef", spectrum_ref.as_str()));
    writer.write_event(Event::Start(precursor))?;

    cv_container(
        writer,
        "ionSelection",
        &[
            CvParam::psi(
                PSI_ACCESSIONS::MASS_TO_CHARGE_RATIO,
                "MassToChargeRatio",
                scan.precursor_mz.to_string(),
            ),
            CvParam::psi(
                PSI_ACCESSIONS::INTENSITY,
                "Intensity",
                scan.precursor_intensity.to_string(),
            ),
        ],
    )?;
    cv_container(
        writer,
        "activation",
        &[CvParam::psi(
            PSI_ACCESSIONS::COLLISION_ENERGY,
            "CollisionEnergy",
            scan.collision_energy.to_string(),
        )],
    )?;

    end(writer, "precursor")?;
    end(writer, "precursorList")
}

fn write_array<W: Write>(writer: &mut Writer<W>, name: &str, values: &[f64]) -> Result<()> {
    let encoded = PeakCodec::encode(values, Precision::Float64, ByteOrder::LittleEndian);
    let length = values.len().to_string();

    start(writer, name)?;
    let mut data = BytesStart::new("data");
    data.push_attribute(("precision", "64"));
    data.push_attribute(("endian", "little"));
    data.push_attribute(("length", length.as_str()));
    writer.write_event(Event::Start(data))?;
    writer.write_event(Event::Text(BytesText::new(&encoded)))?;
    end(writer, "data")?;
    end(writer, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::mzdata::MzDataDecoder;
    use crate::model::Instrument;

    fn sample_run() -> RawData {
        let mut parent = Scan::new(1, 1);
        parent.retention_time = 0.5;
        parent.polarity = Polarity::Positive;
        parent.mz_range = [100.0, 1500.0];
        parent.continuous = true;
        parent.mz_array = vec![100.5, 200.25];
        parent.intensity_array = vec![10.0, 20.0];

        let mut child = Scan::new(2, 2);
        child.parent_scan = 1;
        child.retention_time = 0.51;
        child.polarity = Polarity::Unknown;
        child.precursor_mz = 200.25;
        child.precursor_intensity = 20.0;
        child.collision_energy = 35.0;
        child.mz_array = vec![150.125];
        child.intensity_array = vec![3.5];

        RawData {
            source_file: "/data/run & co.raw".to_string(),
            instrument: Instrument {
                manufacturer: "Orbitrap".to_string(),
                model: "Orbitrap".to_string(),
                mass_analyzer: "FTMS".to_string(),
                detector: "unknown".to_string(),
                ionization: "ESI".to_string(),
                ..Default::default()
            },
            scan_count: 2,
            scans: vec![parent, child],
            ..Default::default()
        }
    }

    fn encode_to_string(data: &RawData) -> String {
        let mut out = Vec::new();
        MzDataEncoder::new().encode(data, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_document_shape() {
        let xml = encode_to_string(&sample_run());

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<mzData version=\"1.05\""));
        assert!(xml.contains("<spectrumList count=\"2\">"));
        assert!(xml.contains("<nameOfFile>run &amp; co.raw</nameOfFile>"));
        assert!(xml.contains("<pathToFile>/data</pathToFile>"));
        assert!(xml.contains("spectrumType=\"discrete\" methodOfCombination=\"sum\""));
        assert!(xml.contains("spectrumRef=\"1\""));
        assert!(xml.contains("<data precision=\"64\" endian=\"little\" length=\"2\">AAAAAAAgWUAAAAAAAAhpQA==</data>"));
        // Only the child scan has a precursor block
        assert_eq!(xml.matches("<precursorList").count(), 1);
    }

    #[test]
    fn test_round_trip_through_decoder() {
        let original = sample_run();
        let xml = encode_to_string(&original);
        let decoded = MzDataDecoder::default().decode(xml.as_bytes()).unwrap();

        assert_eq!(decoded.source_file, original.source_file);
        assert_eq!(decoded.instrument, original.instrument);
        assert_eq!(decoded.scan_count, 2);
        assert_eq!(decoded.scans, original.scans);
    }

    #[test]
    fn test_split_source_file() {
        assert_eq!(split_source_file("a/b/c.raw"), ("a/b", "c.raw"));
        assert_eq!(split_source_file("c.raw"), ("", "c.raw"));
        assert_eq!(split_source_file("/c.raw"), ("/", "c.raw"));
        assert_eq!(split_source_file("a//c.raw"), ("a//", "c.raw"));
    }

    #[test]
    fn test_source_file_round_trips() {
        for source in ["/run.raw", "C:/data/run.raw", "run.raw", "a//run.raw", "dir/"] {
            let mut data = RawData::new();
            data.source_file = source.to_string();

            let decoded = MzDataDecoder::default()
                .decode(encode_to_string(&data).as_bytes())
                .unwrap();
            assert_eq!(decoded.source_file, source);
        }
    }
}
