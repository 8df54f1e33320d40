//! Integration tests for the mzXML decoder
//!
//! This test suite validates:
//! - Parent/child linkage from scan nesting
//! - Interleaved peak decoding at both precisions, with and without zlib
//! - Document order under parallel decoding
//! - Nesting policies for grandchild scans

use std::io::Write;

use flate2::write::ZlibEncoder;
use mzlib::prelude::*;

// ============================================================================
// Helper Functions
// ============================================================================

/// Interleave m/z and intensity values the way mzXML stores them
fn interleave(mz: &[f64], intensity: &[f64]) -> Vec<f64> {
    mz.iter()
        .zip(intensity)
        .flat_map(|(m, i)| [*m, *i])
        .collect()
}

/// `<peaks>` element for the given pairs, big-endian
fn peaks_element(mz: &[f64], intensity: &[f64], precision: Precision, zlib: bool) -> String {
    let values = interleave(mz, intensity);
    if zlib {
        let bytes = PeakCodec::floats_to_bytes(&values, precision, ByteOrder::BigEndian);
        let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&bytes).unwrap();
        let compressed = encoder.finish().unwrap();
        let text = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, compressed);
        format!(
            r#"<peaks precision="{}" byteOrder="network" pairOrder="m/z-int" compressionType="zlib" compressedLen="0">{}</peaks>"#,
            precision.bits(),
            text
        )
    } else {
        format!(
            r#"<peaks precision="{}" byteOrder="network" pairOrder="m/z-int">{}</peaks>"#,
            precision.bits(),
            PeakCodec::encode(&values, precision, ByteOrder::BigEndian)
        )
    }
}

/// A run of `survey_count` MS1 scans, each with `children` nested MS2 scans
fn create_test_mzxml(survey_count: u64, children: u64, centroided: bool) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<mzXML xmlns="http://sashimi.sourceforge.net/schema_revision/mzXML_3.1">
  <msRun scanCount="{}" startTime="PT0S" endTime="PT600S">
    <parentFile fileName="file://C:/data/test.RAW" fileType="RAWData" fileSha1="0"/>
    <msInstrument>
      <msManufacturer category="msManufacturer" value="Thermo Scientific"/>
      <msModel category="msModel" value="LTQ"/>
      <msIonisation category="msIonisation" value="ESI"/>
      <msMassAnalyzer category="msMassAnalyzer" value="ITMS"/>
      <msDetector category="msDetector" value="EMT"/>
    </msInstrument>
    <dataProcessing centroided="{}"/>"#,
        survey_count * (children + 1),
        u8::from(centroided)
    );

    let mut num = 1u64;
    for i in 0..survey_count {
        let parent = num;
        let mz: Vec<f64> = (0..10).map(|j| 100.0 + j as f64 * 50.0 + i as f64).collect();
        let intensity: Vec<f64> = (0..10).map(|j| 1000.0 + j as f64 * 10.0).collect();
        xml.push_str(&format!(
            r#"
    <scan num="{}" msLevel="1" peaksCount="{}" polarity="+" retentionTime="PT{}S" lowMz="100" highMz="600">
      {}"#,
            parent,
            mz.len(),
            i * 60,
            peaks_element(&mz, &intensity, Precision::Float32, false)
        ));
        num += 1;

        for c in 0..children {
            let mz = [200.0 + c as f64, 300.5];
            let intensity = [10.0, 20.0];
            xml.push_str(&format!(
                r#"
      <scan num="{}" msLevel="2" peaksCount="2" polarity="+" retentionTime="PT{}.5S" collisionEnergy="35">
        <precursorMz precursorIntensity="{}" activationMethod="CID">{}</precursorMz>
        {}
      </scan>"#,
                num,
                i * 60 + c + 1,
                1000 + c,
                400.0 + c as f64,
                peaks_element(&mz, &intensity, Precision::Float64, c % 2 == 1)
            ));
            num += 1;
        }
        xml.push_str("\n    </scan>");
    }

    xml.push_str("\n  </msRun>\n</mzXML>\n");
    xml
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_run_header() {
    let xml = create_test_mzxml(1, 0, false);
    let data = MzXmlDecoder::default().decode(xml.as_bytes()).unwrap();

    assert_eq!(data.source_file, "file://C:/data/test.RAW");
    assert_eq!(data.instrument.manufacturer, "Thermo Scientific");
    assert_eq!(data.instrument.model, "LTQ");
    assert_eq!(data.instrument.mass_analyzer, "ITMS");
    assert_eq!(data.instrument.detector, "EMT");
    assert_eq!(data.instrument.ionization, "ESI");
    assert_eq!(data.scan_count, 1);
    assert!(data.filename.is_none());
}

#[test]
fn test_parent_linkage_and_order() {
    let xml = create_test_mzxml(3, 2, true);
    let data = MzXmlDecoder::default().decode(xml.as_bytes()).unwrap();

    let linkage: Vec<(u64, u64, u8)> = data
        .scans
        .iter()
        .map(|s| (s.id, s.parent_scan, s.ms_level))
        .collect();
    assert_eq!(
        linkage,
        vec![
            (1, 0, 1),
            (2, 1, 2),
            (3, 1, 2),
            (4, 0, 1),
            (5, 4, 2),
            (6, 4, 2),
            (7, 0, 1),
            (8, 7, 2),
            (9, 7, 2),
        ]
    );

    let child = &data.scans[5];
    assert_eq!(data.parent_of(child).map(|p| p.id), Some(4));
    assert_eq!(data.children_of(4).count(), 2);
}

#[test]
fn test_interleaved_peaks_both_precisions() {
    let xml = create_test_mzxml(2, 2, false);
    let data = MzXmlDecoder::default().decode(xml.as_bytes()).unwrap();

    let survey = &data.scans[3];
    assert_eq!(survey.peak_count(), 10);
    assert_eq!(survey.mz_array[0], 101.0);
    assert_eq!(survey.mz_array[9], 551.0);
    assert_eq!(survey.intensity_array[9], 1090.0);

    // Second child is zlib-compressed
    for child in [&data.scans[4], &data.scans[5]] {
        assert_eq!(child.intensity_array, vec![10.0, 20.0]);
        assert_eq!(child.mz_array[1], 300.5);
    }
    assert_eq!(data.scans[5].mz_array[0], 201.0);
}

#[test]
fn test_scan_attributes() {
    let xml = create_test_mzxml(2, 1, false);
    let data = MzXmlDecoder::default().decode(xml.as_bytes()).unwrap();

    let survey = &data.scans[2];
    assert_eq!(survey.retention_time, 1.0);
    assert_eq!(survey.polarity, Polarity::Positive);
    assert_eq!(survey.mz_range, [100.0, 600.0]);
    assert!(survey.continuous);
    assert!(!survey.deisotoped);

    let child = &data.scans[3];
    assert_eq!(child.precursor_mz, 400.0);
    assert_eq!(child.precursor_intensity, 1000.0);
    assert_eq!(child.collision_energy, 35.0);
    assert_eq!(child.retention_time, 61.5 / 60.0);
}

#[test]
fn test_centroided_flag_applies_to_every_scan() {
    let xml = create_test_mzxml(2, 2, true);
    let data = MzXmlDecoder::default().decode(xml.as_bytes()).unwrap();
    assert!(data.scans.iter().all(|s| !s.continuous));
}

#[test]
fn test_order_preserved_with_many_threads() {
    let xml = create_test_mzxml(40, 3, false);
    let config = DecodeConfig::default().with_threads(8);
    let data = MzXmlDecoder::new(config).decode(xml.as_bytes()).unwrap();

    let ids: Vec<u64> = data.scans.iter().map(|s| s.id).collect();
    assert_eq!(ids, (1..=160).collect::<Vec<u64>>());
}

#[test]
fn test_declared_count_is_kept_separately() {
    let xml = create_test_mzxml(2, 0, false).replace(r#"scanCount="2""#, r#"scanCount="7""#);
    let data = MzXmlDecoder::default().decode(xml.as_bytes()).unwrap();

    assert_eq!(data.scans.len(), 2);
    assert_eq!(data.scan_count, 7);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_peak_count_larger_than_data_fails() {
    let xml = create_test_mzxml(1, 0, false).replace(r#"peaksCount="10""#, r#"peaksCount="11""#);
    let err = MzXmlDecoder::default().decode(xml.as_bytes()).unwrap_err();

    match err {
        MzError::Codec {
            scan: 1,
            source: CodecError::Truncated { expected, actual },
        } => {
            assert_eq!(expected, 88);
            assert_eq!(actual, 80);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_huge_peak_count_is_a_codec_error() {
    // 2^62 pairs overflow the byte count; 2^63 pairs overflow the value count
    for count in [4_611_686_018_427_387_904u64, 9_223_372_036_854_775_808] {
        let xml = create_test_mzxml(1, 0, false)
            .replace(r#"peaksCount="10""#, &format!(r#"peaksCount="{count}""#));
        let err = MzXmlDecoder::default().decode(xml.as_bytes()).unwrap_err();

        assert!(
            matches!(
                err,
                MzError::Codec { scan: 1, source: CodecError::CountOverflow(_) }
            ),
            "{count}: {err:?}"
        );
    }
}

#[test]
fn test_malformed_xml_fails() {
    let xml = create_test_mzxml(1, 1, false).replace("</msRun>", "</msRunx>");
    assert!(MzXmlDecoder::default().decode(xml.as_bytes()).is_err());
}

#[test]
fn test_grandchildren_by_policy() {
    let xml = r#"<mzXML><msRun scanCount="3">
  <scan num="1" msLevel="1" peaksCount="0">
    <scan num="2" msLevel="2" peaksCount="0">
      <scan num="3" msLevel="3" peaksCount="0"><peaks precision="32"/></scan>
    </scan>
  </scan>
</msRun></mzXML>"#;

    let warned = MzXmlDecoder::default().decode(xml.as_bytes()).unwrap();
    assert_eq!(warned.scans.len(), 2);

    let recursed = MzXmlDecoder::new(DecodeConfig::default().with_nesting(NestingPolicy::Recurse))
        .decode(xml.as_bytes())
        .unwrap();
    let parents: Vec<u64> = recursed.scans.iter().map(|s| s.parent_scan).collect();
    assert_eq!(parents, vec![0, 1, 2]);

    let rejected = MzXmlDecoder::new(DecodeConfig::default().with_nesting(NestingPolicy::Reject))
        .decode(xml.as_bytes());
    assert!(matches!(
        rejected,
        Err(MzError::UnsupportedNesting { scan: 3, depth: 3 })
    ));
}

#[test]
fn test_dropped_grandchild_attributes_are_not_parsed() {
    let xml = r#"<mzXML><msRun scanCount="3">
  <scan num="1" msLevel="1" peaksCount="0">
    <scan num="2" msLevel="2" peaksCount="0">
      <scan num="x3" msLevel="3" retentionTime="soon" peaksCount="0"/>
    </scan>
  </scan>
</msRun></mzXML>"#;

    let data = MzXmlDecoder::default().decode(xml.as_bytes()).unwrap();
    let ids: Vec<u64> = data.scans.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2]);
}
