//! Attestation assertion parsing.
//!
//! The attestation service answers with either a SAML 2.0 assertion whose
//! attribute statement carries the host's trust flag and asset tags, or a
//! JSON body when the host is unknown or not enrolled. Asset tags travel as
//! attributes named `tag[<key>]`; they are decoded here so nothing downstream
//! sees the bracket syntax.

use roxmltree::{Document, Node};
use tg_common::error::ParseError;
use tg_common::types::TrustRecord;
use tracing::{debug, warn};

const SAML_ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
const TRUSTED_ATTRIBUTE: &str = "trusted";
const TAG_PREFIX: &str = "tag[";
const TAG_SUFFIX: &str = "]";

/// Parse an assertion body into a trust record.
///
/// A JSON body is the service's negative answer and yields an untrusted
/// record rather than an error.
pub fn parse_assertion(raw: &[u8]) -> Result<TrustRecord, ParseError> {
    if serde_json::from_slice::<serde_json::Value>(raw).is_ok() {
        debug!("attestation service returned a JSON negative result");
        return Ok(TrustRecord::untrusted());
    }

    let text = std::str::from_utf8(raw).map_err(|_| ParseError::Encoding)?;
    let doc = Document::parse(text).map_err(|e| ParseError::Xml(e.to_string()))?;

    let mut record = TrustRecord::untrusted();
    for attribute in attributes(&doc) {
        let name = attribute.attribute("Name").ok_or(ParseError::MissingName)?;
        let Some(value) = attribute_value(attribute) else {
            continue;
        };

        if name.eq_ignore_ascii_case(TRUSTED_ATTRIBUTE) {
            record.trusted = value.eq_ignore_ascii_case("true");
        } else if let Some(key) = tag_key(name) {
            record.tags.insert(&key, value);
        }
    }

    Ok(record)
}

/// Total variant of [`parse_assertion`]: any parse failure is an untrusted host.
pub fn evaluate_assertion(raw: &[u8]) -> TrustRecord {
    parse_assertion(raw).unwrap_or_else(|err| {
        warn!(%err, "unparsable attestation assertion, treating host as untrusted");
        TrustRecord::untrusted()
    })
}

/// `saml2:Attribute` elements of every top-level `saml2:AttributeStatement`.
fn attributes<'a, 'input>(doc: &'a Document<'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.root_element()
        .children()
        .filter(|n| n.has_tag_name((SAML_ASSERTION_NS, "AttributeStatement")))
        .flat_map(|statement| statement.children())
        .filter(|n| n.has_tag_name((SAML_ASSERTION_NS, "Attribute")))
}

fn attribute_value<'a>(attribute: Node<'a, '_>) -> Option<&'a str> {
    attribute
        .children()
        .find(|n| n.has_tag_name((SAML_ASSERTION_NS, "AttributeValue")))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `tag[Location]` -> `location`. Matching on the brackets is case-insensitive.
fn tag_key(name: &str) -> Option<String> {
    let head = name.get(..TAG_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(TAG_PREFIX) {
        return None;
    }
    let key = name[TAG_PREFIX.len()..].strip_suffix(TAG_SUFFIX)?.trim();
    if key.is_empty() {
        return None;
    }
    Some(key.to_lowercase())
}
