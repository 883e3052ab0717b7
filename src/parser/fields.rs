//! Field mapping shared by the structured and strict-tree strategies.
//!
//! Both strategies expose their decoded tree through [`FieldLookup`] and hand
//! it to [`assemble_document`], so the mapping from SIFEN element names to
//! [`InvoiceDocument`] fields lives in one place.

use crate::core::{
    DEFAULT_CURRENCY, InvoiceDocument, LineItem, PartyRecord, TotalsRecord, amount_or_zero,
    decimal_or_zero,
};

use super::unescape::unescape_html;

// Paths relative to `rDE`.
pub(crate) const AUTHORIZATION: &[&str] = &["dProtAut"];
pub(crate) const QR_URL: &[&str] = &["gCamFuFD", "dCarQR"];

// Paths relative to `DE`.
pub(crate) const SECURITY_CODE: &[&str] = &["gOpeDE", "dCodSeg"];
pub(crate) const EMISSION_TYPE: &[&str] = &["gOpeDE", "dDesTipEmi"];
pub(crate) const DOCUMENT_TYPE: &[&str] = &["gTimb", "dDesTiDE"];
pub(crate) const ESTABLISHMENT: &[&str] = &["gTimb", "dEst"];
pub(crate) const EXPEDITION_POINT: &[&str] = &["gTimb", "dPunExp"];
pub(crate) const SEQUENCE: &[&str] = &["gTimb", "dNumDoc"];
pub(crate) const ISSUE_DATE: &[&str] = &["gDatGralOpe", "dFeEmiDE"];
pub(crate) const CURRENCY: &[&str] = &["gDatGralOpe", "gOpeCom", "cMoneOpe"];
pub(crate) const OPERATION_CONDITION: &[&str] = &["gDtipDE", "gCamCond", "dDCondOpe"];
pub(crate) const ITEMS: &[&str] = &["gDtipDE", "gCamItem"];

const ISSUER: &str = "gEmis";
const RECIPIENT: &str = "gDatRec";
const GENERAL: &str = "gDatGralOpe";
const TOTALS: &str = "gTotSub";

// Paths relative to one `gCamItem`.
const ITEM_CODE: &[&str] = &["dCodInt"];
const ITEM_DESCRIPTION: &[&str] = &["dDesProSer"];
const ITEM_QUANTITY: &[&str] = &["dCantProSer"];
const ITEM_UNIT_PRICE: &[&str] = &["gValorItem", "dPUniProSer"];
const ITEM_TOTAL_NESTED: &[&str] = &["gValorItem", "gValorRestaItem", "dTotOpeItem"];
const ITEM_TOTAL: &[&str] = &["gValorItem", "dTotOpeItem"];
const ITEM_TAX_RATE: &[&str] = &["gCamIVA", "dTasaIVA"];
const ITEM_TAX_AMOUNT: &[&str] = &["gCamIVA", "dLiqIVAItem"];

/// Read access to a decoded element, by local-name path.
pub(crate) trait FieldLookup {
    /// Text at `path` below this node; empty when absent.
    fn text_at(&self, path: &[&str]) -> &str;

    /// Attribute value by local name; empty when absent.
    fn attribute(&self, name: &str) -> &str;

    /// Text at the first of `paths` that yields a non-empty value.
    fn first_text(&self, paths: &[&[&str]]) -> &str {
        paths
            .iter()
            .map(|p| self.text_at(p))
            .find(|t| !t.is_empty())
            .unwrap_or("")
    }
}

/// Build a document from the `rDE` node, its `DE` node and the item nodes.
///
/// `qr_verification_url` is located by the caller, which knows how to search
/// its own tree; pass it through [`clean_qr_url`] first.
pub(crate) fn assemble_document<'a, N, I>(
    rde: &N,
    de: &N,
    items: I,
    qr_verification_url: Option<String>,
) -> InvoiceDocument
where
    N: FieldLookup + 'a,
    I: IntoIterator<Item = &'a N>,
{
    let establishment = de.text_at(ESTABLISHMENT).to_string();
    let expedition_point = de.text_at(EXPEDITION_POINT).to_string();
    let document_number =
        compose_document_number(&establishment, &expedition_point, de.text_at(SEQUENCE));

    InvoiceDocument {
        control_code: de.attribute("Id").to_string(),
        authorization_number: rde.text_at(AUTHORIZATION).to_string(),
        security_code: non_empty(de.text_at(SECURITY_CODE)),
        issue_date: de.text_at(ISSUE_DATE).to_string(),
        document_type: de.text_at(DOCUMENT_TYPE).to_string(),
        document_number,
        establishment,
        expedition_point,
        emission_type: de.text_at(EMISSION_TYPE).to_string(),
        operation_condition: de.text_at(OPERATION_CONDITION).to_string(),
        issuer: issuer_from(de),
        recipient: recipient_from(de),
        totals: totals_from(de),
        line_items: items.into_iter().map(line_item_from).collect(),
        qr_verification_url,
    }
}

fn issuer_from<N: FieldLookup>(de: &N) -> PartyRecord {
    let field = |name: &str| de.text_at(&[GENERAL, ISSUER, name]);
    PartyRecord {
        tax_id: non_empty(field("dRucEm")),
        check_digit: non_empty(field("dDVEmi")),
        name: field("dNomEmi").to_string(),
        address: non_empty(field("dDirEmi")),
        phone: field("dTelEmi").to_string(),
        email: field("dEmailE").to_string(),
        ..Default::default()
    }
}

fn recipient_from<N: FieldLookup>(de: &N) -> PartyRecord {
    let field = |name: &str| de.text_at(&[GENERAL, RECIPIENT, name]);
    let mut party = PartyRecord {
        name: field("dNomRec").to_string(),
        address: non_empty(field("dDirRec")),
        country: non_empty(field("dDesPaisRe")),
        phone: field("dTelRec").to_string(),
        email: field("dEmailRec").to_string(),
        ..Default::default()
    };
    match non_empty(field("dRucRec")) {
        Some(ruc) => {
            party.tax_id = Some(ruc);
            party.check_digit = non_empty(field("dDVRec"));
        }
        None => {
            party.id_type = non_empty(field("dDTipIDRec"));
            party.id_number = non_empty(field("dNumIDRec"));
        }
    }
    party
}

fn totals_from<N: FieldLookup>(de: &N) -> TotalsRecord {
    let amount = |name: &str| amount_or_zero(de.text_at(&[TOTALS, name]));
    TotalsRecord {
        gross_total: amount("dTotGralOpe"),
        tax_total: amount("dTotIVA"),
        tax_5: amount("dIVA5"),
        tax_10: amount("dIVA10"),
        exempt_subtotal: amount("dSubExe"),
        exonerated_subtotal: amount("dSubExo"),
        currency: non_empty(de.text_at(CURRENCY)).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
    }
}

fn line_item_from<N: FieldLookup>(item: &N) -> LineItem {
    let tax_amount = item.text_at(ITEM_TAX_AMOUNT);
    LineItem {
        code: item.text_at(ITEM_CODE).to_string(),
        description: item.text_at(ITEM_DESCRIPTION).to_string(),
        quantity: decimal_or_zero(item.text_at(ITEM_QUANTITY)),
        unit_price: decimal_or_zero(item.text_at(ITEM_UNIT_PRICE)),
        line_total: amount_or_zero(item.first_text(&[ITEM_TOTAL_NESTED, ITEM_TOTAL])),
        tax_rate_label: rate_label(item.text_at(ITEM_TAX_RATE)),
        tax_amount: (!tax_amount.is_empty()).then(|| amount_or_zero(tax_amount)),
    }
}

/// `"<establishment>-<expedition point>-<sequence>"`, or empty unless all three are present.
pub(crate) fn compose_document_number(establishment: &str, point: &str, sequence: &str) -> String {
    if establishment.is_empty() || point.is_empty() || sequence.is_empty() {
        return String::new();
    }
    format!("{establishment}-{point}-{sequence}")
}

/// Normalise a raw `dCarQR` value to a URL with plain `&` separators.
pub(crate) fn clean_qr_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(unescape_html(raw).replace("&amp;", "&"))
}

/// `dTasaIVA` rendered as a label: `"10"` → `"10%"`.
pub(crate) fn rate_label(rate: &str) -> Option<String> {
    let rate = rate.trim();
    (!rate.is_empty()).then(|| format!("{rate}%"))
}

pub(crate) fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_number_needs_all_parts() {
        assert_eq!(compose_document_number("001", "002", "0000123"), "001-002-0000123");
        assert_eq!(compose_document_number("001", "", "0000123"), "");
    }

    #[test]
    fn qr_url_ends_with_plain_ampersands() {
        assert_eq!(
            clean_qr_url("https://q/?a=1&amp;amp;b=2&amp;c=3&d=4").as_deref(),
            Some("https://q/?a=1&b=2&c=3&d=4")
        );
        assert_eq!(clean_qr_url("   "), None);
    }

    #[test]
    fn rate_labels() {
        assert_eq!(rate_label("10").as_deref(), Some("10%"));
        assert_eq!(rate_label(""), None);
    }
}
