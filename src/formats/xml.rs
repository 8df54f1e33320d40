//! quick-xml helpers shared by the mzXML and mzData readers

use std::io::BufRead;
use std::str::FromStr;

use log::warn;
use quick_xml::escape::unescape;
use quick_xml::events::BytesStart;
use quick_xml::Reader;

use crate::error::{MzError, Result};

/// Create a pull parser over a buffered source
pub(crate) fn new_reader<R: BufRead>(source: R) -> Reader<R> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);
    reader
}

/// Get an attribute value from a start tag
pub(crate) fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| MzError::Xml(quick_xml::Error::from(e)))?;
        if attr.key.as_ref() == name.as_bytes() {
            let raw = std::str::from_utf8(&attr.value)?;
            let value = unescape(raw).map_err(|e| MzError::Xml(quick_xml::Error::from(e)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Get an attribute that must be present
pub(crate) fn required_attribute(
    e: &BytesStart,
    element: &'static str,
    attribute: &'static str,
) -> Result<String> {
    get_attribute(e, attribute)?.ok_or(MzError::MissingAttribute { element, attribute })
}

/// Parse an attribute value, failing if it is present but malformed
pub(crate) fn parse_attribute<T: FromStr>(
    e: &BytesStart,
    element: &'static str,
    attribute: &'static str,
) -> Result<Option<T>> {
    match get_attribute(e, attribute)? {
        Some(value) => parse_value(&value, element, attribute).map(Some),
        None => Ok(None),
    }
}

/// Parse a value taken from `attribute` of `element`
pub(crate) fn parse_value<T: FromStr>(
    value: &str,
    element: &'static str,
    attribute: &'static str,
) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| MzError::InvalidAttributeValue {
            element,
            attribute,
            value: value.to_string(),
        })
}

/// Parse a descriptive float attribute, falling back to 0.0
///
/// Missing values are silent; malformed values are logged.
pub(crate) fn soft_f64(e: &BytesStart, element: &'static str, attribute: &'static str) -> Result<f64> {
    Ok(get_attribute(e, attribute)?
        .map(|v| soft_parse_f64(&v, element, attribute))
        .unwrap_or(0.0))
}

/// Parse a descriptive float value, logging and returning 0.0 when malformed
pub(crate) fn soft_parse_f64(value: &str, element: &str, attribute: &str) -> f64 {
    match value.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!("Ignoring non-numeric {element}@{attribute} value '{value}'");
            0.0
        }
    }
}
