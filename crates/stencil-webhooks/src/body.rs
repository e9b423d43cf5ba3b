//! Body encoding for POST webhook delivery.

use bytes::Bytes;
use indexmap::IndexMap;

use crate::{declaration::BodyFormat, error::Result};

/// Serializes the parameter set per the declared format.
///
/// Returns the encoded body and its content type. Parameter order is
/// preserved in every encoding.
pub(crate) fn encode_body(
    format: BodyFormat,
    parameters: &IndexMap<String, String>,
) -> Result<(Bytes, &'static str)> {
    match format {
        BodyFormat::Json => {
            let body = serde_json::to_vec(parameters)?;
            Ok((Bytes::from(body), "application/json"))
        },
        BodyFormat::Xml => Ok((Bytes::from(encode_xml(parameters)), "application/xml")),
        BodyFormat::FormUrlEncoded => {
            let body = serde_urlencoded::to_string(parameters)?;
            Ok((Bytes::from(body), "application/x-www-form-urlencoded"))
        },
    }
}

fn encode_xml(parameters: &IndexMap<String, String>) -> String {
    let mut xml = String::from("<parameters>");
    for (key, value) in parameters {
        xml.push_str("<parameter key=\"");
        xml.push_str(&xml_escape(key));
        xml.push_str("\">");
        xml.push_str(&xml_escape(value));
        xml.push_str("</parameter>");
    }
    xml.push_str("</parameters>");
    xml
}

fn xml_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}
