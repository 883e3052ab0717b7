//! Pattern-scan decode, the last tier of the cascade.
//!
//! Every field is searched for on its own over the cleaned text, so damage in
//! one region only costs the fields that live there. Well-formedness is never
//! required and the strategy never fails.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::cascade::{DecodeStrategy, RecoverableError};
use super::fields::{clean_qr_url, compose_document_number, non_empty, rate_label};
use super::unescape::unescape_html;
use crate::core::{
    DEFAULT_CURRENCY, InvoiceDocument, LineItem, PartyRecord, SifenError, TotalsRecord,
    amount_or_zero, parse_amount, parse_decimal,
};

/// Issuer name used when no name tag could be recovered.
pub const ISSUER_PLACEHOLDER: &str = "issuer unavailable";
/// Recipient name used when no name tag could be recovered.
pub const RECIPIENT_PLACEHOLDER: &str = "recipient unavailable";
/// Identity document type assumed for a recipient with an id number but no type.
pub const DEFAULT_RECIPIENT_ID_TYPE: &str = "CI";

// Tag variants, first match wins. Each list leads with the tag the structured
// decoders read, so all three tiers agree on a well-formed document.
const ISSUE_DATE: &[&str] = &["dFeEmiDE", "dFecFirma"];
const ISSUER_RUC: &[&str] = &["dRucEm", "dRUCEmi"];
// `dDVId` is the control code's check digit, not the issuer's; fallback only.
const ISSUER_DV: &[&str] = &["dDVEmi", "dDVId"];
const ISSUER_NAME: &[&str] = &["dNomEmi", "dRazEmi", "dRazSoc"];
const RECIPIENT_ID: &[&str] = &["dNumIDRec", "dCedRec"];
// `dTotGralOpe` includes rounding and commission; `dTotOpe` is the fallback.
const GROSS_TOTAL: &[&str] = &["dTotGralOpe", "dTotOpe"];
const TAX_TOTAL: &[&str] = &["dTotIVA", "dLiqTotIVA"];
const ITEM_TOTAL: &[&str] = &["dTotOpeItem", "dTotBruOpeItem"];
const ITEM_TAX: &[&str] = &["dLiqIVAItem", "dBasGravIVA"];

const SCANNED_TAGS: &[&str] = &[
    "dProtAut", "dCodSeg", "dDesTipEmi", "dFeEmiDE", "dFecFirma", "dDesTiDE", "dEst", "dPunExp",
    "dNumDoc", "dDCondOpe", "dRucEm", "dRUCEmi", "dDVEmi", "dDVId", "dNomEmi", "dRazEmi",
    "dRazSoc", "dDirEmi", "dTelEmi", "dEmailE", "dNomRec", "dRucRec", "dDVRec", "dDTipIDRec",
    "dNumIDRec", "dCedRec", "dDirRec", "dDesPaisRe", "dTelRec", "dEmailRec", "cMoneOpe",
    "dTotGralOpe", "dTotOpe", "dTotIVA", "dLiqTotIVA", "dIVA5", "dIVA10", "dSubExe", "dSubExo",
    "dCarQR", "dCodInt", "dDesProSer", "dCantProSer", "dPUniProSer", "dTotOpeItem",
    "dTotBruOpeItem", "dTasaIVA", "dLiqIVAItem", "dBasGravIVA",
];

/// One regex per scanned tag: optional namespace prefix, optional attributes,
/// text content up to the next `<`.
static TAG_PATTERNS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    SCANNED_TAGS
        .iter()
        .map(|&tag| {
            let pattern =
                format!(r"<(?:[\w.-]+:)?{tag}(?:\s[^>]*)?>([^<]*)</(?:[\w.-]+:)?{tag}>");
            (tag, Regex::new(&pattern).expect("static regex"))
        })
        .collect()
});

static CONTROL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bId="([^"]*)""#).expect("static regex"));

static ITEM_BLOCK: LazyLock<Regex> = LazyLock::new(|| block_regex("gCamItem"));

static ALTERNATE_ITEM_BLOCK: LazyLock<Regex> = LazyLock::new(|| block_regex("gCamIteGS07"));

static QR_GROSS_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"dTotGralOpe=(\d+)").expect("static regex"));

static QR_TAX_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"dTotIVA=(\d+)").expect("static regex"));

fn block_regex(tag: &str) -> Regex {
    Regex::new(&format!(
        r"(?s)<(?:[\w.-]+:)?{tag}(?:\s[^>]*)?>.*?</(?:[\w.-]+:)?{tag}>"
    ))
    .expect("static regex")
}

/// Trimmed, entity-decoded text of the first `<tag>` in `text`.
fn capture(text: &str, tag: &str) -> Option<String> {
    let re = TAG_PATTERNS.get(tag)?;
    let raw = re.captures(text)?.get(1)?.as_str();
    Some(unescape_html(raw.trim()).into_owned())
}

/// First non-empty capture over the tag variants.
fn capture_any(text: &str, tags: &[&str]) -> Option<String> {
    tags.iter()
        .filter_map(|tag| capture(text, tag))
        .find(|v| !v.is_empty())
}

fn field(text: &str, tag: &str) -> String {
    capture(text, tag).unwrap_or_default()
}

/// Third tier of the cascade. Always succeeds.
pub struct PatternScanDecode;

impl DecodeStrategy for PatternScanDecode {
    fn name(&self) -> &'static str {
        "pattern-scan"
    }

    fn attempt(&self, text: &str) -> Result<InvoiceDocument, RecoverableError> {
        Ok(scan_document(text))
    }
}

/// Recover what can be recovered from arbitrary text.
pub fn scan_document(text: &str) -> InvoiceDocument {
    let control_code = CONTROL_CODE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let establishment = field(text, "dEst");
    let expedition_point = field(text, "dPunExp");
    let document_number =
        compose_document_number(&establishment, &expedition_point, &field(text, "dNumDoc"));

    let qr_verification_url = capture(text, "dCarQR").and_then(|raw| clean_qr_url(&raw));
    let totals = scan_totals(text, qr_verification_url.as_deref());
    let line_items = scan_items(text);

    let document = InvoiceDocument {
        control_code,
        authorization_number: field(text, "dProtAut"),
        security_code: capture(text, "dCodSeg").as_deref().and_then(non_empty),
        issue_date: capture_any(text, ISSUE_DATE).unwrap_or_default(),
        document_type: field(text, "dDesTiDE"),
        document_number,
        establishment,
        expedition_point,
        emission_type: field(text, "dDesTipEmi"),
        operation_condition: field(text, "dDCondOpe"),
        issuer: scan_issuer(text),
        recipient: scan_recipient(text),
        totals,
        line_items,
        qr_verification_url,
    };

    tracing::info!(
        control_code = %document.control_code,
        issuer = %document.issuer.name,
        items = document.line_items.len(),
        gross_total = document.totals.gross_total,
        "document recovered by pattern scan"
    );
    document
}

fn scan_issuer(text: &str) -> PartyRecord {
    PartyRecord {
        tax_id: capture_any(text, ISSUER_RUC),
        check_digit: capture_any(text, ISSUER_DV),
        name: capture_any(text, ISSUER_NAME).unwrap_or_else(|| ISSUER_PLACEHOLDER.to_string()),
        address: capture(text, "dDirEmi").as_deref().and_then(non_empty),
        phone: field(text, "dTelEmi"),
        email: field(text, "dEmailE"),
        ..Default::default()
    }
}

fn scan_recipient(text: &str) -> PartyRecord {
    let mut party = PartyRecord {
        name: capture(text, "dNomRec")
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| RECIPIENT_PLACEHOLDER.to_string()),
        address: capture(text, "dDirRec").as_deref().and_then(non_empty),
        country: capture(text, "dDesPaisRe").as_deref().and_then(non_empty),
        phone: field(text, "dTelRec"),
        email: field(text, "dEmailRec"),
        ..Default::default()
    };

    match capture(text, "dRucRec").as_deref().and_then(non_empty) {
        Some(ruc) => {
            party.tax_id = Some(ruc);
            party.check_digit = capture(text, "dDVRec").as_deref().and_then(non_empty);
        }
        None => {
            party.id_number = capture_any(text, RECIPIENT_ID);
            if party.id_number.is_some() {
                party.id_type = Some(
                    capture(text, "dDTipIDRec")
                        .as_deref()
                        .and_then(non_empty)
                        .unwrap_or_else(|| DEFAULT_RECIPIENT_ID_TYPE.to_string()),
                );
            }
        }
    }
    party
}

fn scan_totals(text: &str, qr_url: Option<&str>) -> TotalsRecord {
    let amount = |tags: &[&str]| capture_any(text, tags).map_or(0, |v| amount_or_zero(&v));

    let mut gross_total = amount(GROSS_TOTAL);
    if gross_total == 0 {
        gross_total = qr_parameter(qr_url, &QR_GROSS_TOTAL);
    }
    let mut tax_total = amount(TAX_TOTAL);
    if tax_total == 0 {
        tax_total = qr_parameter(qr_url, &QR_TAX_TOTAL);
    }

    TotalsRecord {
        gross_total,
        tax_total,
        tax_5: amount(&["dIVA5"]),
        tax_10: amount(&["dIVA10"]),
        exempt_subtotal: amount(&["dSubExe"]),
        exonerated_subtotal: amount(&["dSubExo"]),
        currency: capture(text, "cMoneOpe")
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
    }
}

fn qr_parameter(qr_url: Option<&str>, re: &Regex) -> i64 {
    qr_url
        .and_then(|url| re.captures(url))
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}

fn scan_items(text: &str) -> Vec<LineItem> {
    let mut blocks: Vec<&str> = ITEM_BLOCK.find_iter(text).map(|m| m.as_str()).collect();
    if blocks.is_empty() {
        blocks = ALTERNATE_ITEM_BLOCK
            .find_iter(text)
            .map(|m| m.as_str())
            .collect();
    }
    tracing::debug!(blocks = blocks.len(), "item blocks found by pattern scan");

    blocks
        .into_iter()
        .enumerate()
        .filter_map(|(index, block)| match scan_item(block) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping unreadable line item");
                None
            }
        })
        .collect()
}

/// One item block. `Ok(None)` when the block has no description.
fn scan_item(block: &str) -> Result<Option<LineItem>, SifenError> {
    let Some(description) = capture(block, "dDesProSer").filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    let tax_amount = capture_any(block, ITEM_TAX)
        .map(|v| parse_amount(&v))
        .transpose()?;

    Ok(Some(LineItem {
        code: field(block, "dCodInt"),
        description,
        quantity: parse_decimal(&field(block, "dCantProSer"))?,
        unit_price: parse_decimal(&field(block, "dPUniProSer"))?,
        line_total: parse_amount(&capture_any(block, ITEM_TOTAL).unwrap_or_default())?,
        tax_rate_label: rate_label(&field(block, "dTasaIVA")),
        tax_amount,
    }))
}
