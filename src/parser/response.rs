//! SOAP envelope decoding for the two consultation services.

use super::SIFEN_NS;
use super::boundary::extract_document_fragment;
use super::cascade::decode_document;
use super::tree::{Element, EntityMode};
use super::unescape::clean_document_content;
use crate::core::codes::{DOCUMENT_FOUND, TAXPAYER_FOUND};
use crate::core::{InvoiceDocument, LookupResult, SifenError, TaxpayerRecord};

const TAXPAYER_RESPONSE: &str = "rResEnviConsRUC";
const DOCUMENT_RESPONSE: &str = "rEnviConsDeResponse";
const RESPONSE_CODE: &str = "dCodRes";
const RESPONSE_MESSAGE: &str = "dMsgRes";
const TAXPAYER_CONTENT: &str = "xContRUC";
const DOCUMENT_CONTENT: &str = "xContenDE";

/// Parse a RUC consultation response.
///
/// # Errors
///
/// - [`SifenError::MalformedXml`] when the envelope is not well-formed;
/// - [`SifenError::ProtocolShape`] when the response body, its status fields
///   or, on success, any taxpayer field is missing.
pub fn parse_taxpayer_response(xml: &str) -> Result<LookupResult<TaxpayerRecord>, SifenError> {
    let root = parse_envelope(xml)?;
    let body = response_body(&root, TAXPAYER_RESPONSE)?;
    let (code, message) = response_status(body)?;
    tracing::info!(code, message, "taxpayer response parsed");

    if code != TAXPAYER_FOUND {
        return Ok(LookupResult::without_payload(code, message));
    }

    let content = body.descendant(TAXPAYER_CONTENT).ok_or_else(|| {
        SifenError::ProtocolShape(format!("{TAXPAYER_CONTENT} missing from {TAXPAYER_RESPONSE}"))
    })?;
    let record = TaxpayerRecord {
        id: required(content, "dRUCCons")?.to_string(),
        legal_name: required(content, "dRazCons")?.trim().to_string(),
        status_code: required(content, "dCodEstCons")?.to_string(),
        status_description: required(content, "dDesEstCons")?.to_string(),
        is_electronic_biller: required(content, "dRUCFactElec")? == "S",
    };
    tracing::info!(ruc = %record.id, legal_name = %record.legal_name, "taxpayer extracted");

    Ok(LookupResult::with_payload(code, message, record))
}

/// Parse a DTE consultation response.
///
/// On the found code the escaped `xContenDE` payload is cleaned, the `rDE`
/// fragment cut out of it, and the fragment decoded by the strategy cascade.
///
/// # Errors
///
/// - [`SifenError::MalformedXml`] when the envelope is not well-formed;
/// - [`SifenError::ProtocolShape`] when the response body, its status fields
///   or, on success, `xContenDE` is missing.
pub fn parse_document_response(xml: &str) -> Result<LookupResult<InvoiceDocument>, SifenError> {
    let root = parse_envelope(xml)?;
    let body = response_body(&root, DOCUMENT_RESPONSE)?;
    let (code, message) = response_status(body)?;
    tracing::info!(code, message, "document response parsed");

    if code != DOCUMENT_FOUND {
        return Ok(LookupResult::without_payload(code, message));
    }

    let content = body.descendant(DOCUMENT_CONTENT).ok_or_else(|| {
        SifenError::ProtocolShape(format!("{DOCUMENT_CONTENT} missing from {DOCUMENT_RESPONSE}"))
    })?;
    let cleaned = clean_document_content(content.text());
    let fragment = extract_document_fragment(&cleaned);
    let document = decode_document(&fragment.text)?;

    tracing::info!(
        control_code = %document.control_code,
        issuer = %document.issuer.name,
        recipient = %document.recipient.name,
        items = document.line_items.len(),
        gross_total = document.totals.gross_total,
        qr = document.qr_verification_url.is_some(),
        "document extracted"
    );
    Ok(LookupResult::with_payload(code, message, document))
}

fn parse_envelope(xml: &str) -> Result<Element, SifenError> {
    let xml = xml.trim_start_matches('\u{feff}').trim();
    Element::parse(xml, EntityMode::Lenient)
}

fn response_body<'a>(root: &'a Element, tag: &str) -> Result<&'a Element, SifenError> {
    root.find_ns(SIFEN_NS, tag).ok_or_else(|| {
        tracing::error!(tag, "response body not found");
        SifenError::ProtocolShape(format!("{tag} not found in response"))
    })
}

/// The status code, trimmed, and the message exactly as SIFEN sent it.
fn response_status(body: &Element) -> Result<(&str, &str), SifenError> {
    let code = required(body, RESPONSE_CODE)?;
    let message = body
        .child(RESPONSE_MESSAGE)
        .map(Element::raw_text)
        .ok_or_else(|| missing(body, RESPONSE_MESSAGE))?;
    Ok((code, message))
}

fn required<'a>(parent: &'a Element, name: &str) -> Result<&'a str, SifenError> {
    parent.child_text(name).ok_or_else(|| missing(parent, name))
}

fn missing(parent: &Element, name: &str) -> SifenError {
    SifenError::ProtocolShape(format!("{name} missing from {}", parent.name))
}
