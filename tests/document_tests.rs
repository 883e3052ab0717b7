#![cfg(feature = "parser")]

mod common;

use common::*;
use rust_decimal_macros::dec;
use sifen::core::*;
use sifen::parser::scan::{ISSUER_PLACEHOLDER, RECIPIENT_PLACEHOLDER};
use sifen::parser::{
    BoundaryPolicy, clean_document_content, decode_document_traced, extract_document_fragment,
    parse_document_response,
};

fn assert_reference_document(doc: &InvoiceDocument) {
    assert_eq!(doc.control_code, CDC);
    assert_eq!(doc.control_code.len(), 44);
    assert_eq!(doc.security_code.as_deref(), Some("123456789"));
    assert_eq!(doc.issue_date, "2024-01-01T10:00:00");
    assert_eq!(doc.document_type, "Factura electrónica");
    assert_eq!(doc.document_number, "001-002-0000123");
    assert_eq!(doc.emission_type, "Normal");
    assert_eq!(doc.operation_condition, "Contado");

    assert_eq!(doc.issuer.name, "Acme Corp S.A.");
    assert_eq!(doc.issuer.full_tax_id().as_deref(), Some("80012345-6"));
    assert_eq!(doc.issuer.email, "facturas@acme.com.py");

    assert_eq!(doc.recipient.name, "Juan Pérez");
    assert_eq!(doc.recipient.tax_id, None);
    assert_eq!(doc.recipient.id_number.as_deref(), Some("1234567"));
    assert_eq!(doc.recipient.country.as_deref(), Some("Paraguay"));

    assert_eq!(doc.totals.gross_total, 10000);
    assert_eq!(doc.totals.tax_total, 909);
    assert_eq!(doc.totals.tax_10, 909);
    assert_eq!(doc.totals.currency, "PYG");

    assert_eq!(doc.line_items.len(), 1);
    let item = &doc.line_items[0];
    assert_eq!(item.code, "P-001");
    assert_eq!(item.description, "Servicio de consultoría");
    assert_eq!(item.quantity, dec!(1));
    assert_eq!(item.unit_price, dec!(10000));
    assert_eq!(item.line_total, 10000);
    assert_eq!(item.tax_rate_label.as_deref(), Some("10%"));
    assert_eq!(item.tax_amount, Some(909));

    assert_eq!(doc.qr_verification_url.as_deref(), Some(QR_URL));
}

#[test]
fn signed_document_is_fully_recovered() {
    let result = parse_document_response(&document_found()).unwrap();

    assert_eq!(result.response_code, "0422");
    assert_eq!(result.message, "CDC encontrado");
    assert!(result.is_success());

    let doc = result.payload.unwrap();
    assert_reference_document(&doc);
    assert_eq!(
        doc.issue_datetime().unwrap().to_string(),
        "2024-01-01 10:00:00"
    );
}

#[test]
fn qr_url_has_plain_ampersands() {
    let doc = parse_document_response(&document_found())
        .unwrap()
        .payload
        .unwrap();
    let url = doc.qr_verification_url.unwrap();

    assert!(url.contains("&Id="));
    assert!(!url.contains("&amp;"));
}

#[test]
fn escape_depth_does_not_change_the_result() {
    for levels in 1..=3 {
        let xml = document_response("0422", "CDC encontrado", &signed_document(), levels);
        let doc = parse_document_response(&xml).unwrap().payload.unwrap();
        assert_reference_document(&doc);
    }
}

#[test]
fn cleaned_content_keeps_the_qr_block_after_the_signature() {
    let cleaned = clean_document_content(&xml_escape(&signed_document()));
    let fragment = extract_document_fragment(&cleaned);

    assert_eq!(fragment.policy, BoundaryPolicy::NaturalClose);
    assert!(fragment.text.starts_with("<rDE"));
    assert!(fragment.text.ends_with("</rDE>"));
    assert!(fragment.text.contains("<gCamFuFD>"));
}

#[test]
fn bare_ampersands_route_past_the_structured_decoder() {
    let cleaned = clean_document_content(&xml_escape(&signed_document()));
    let fragment = extract_document_fragment(&cleaned);

    let (doc, strategy) = decode_document_traced(&fragment.text).unwrap();
    assert_eq!(strategy, "strict-tree");
    assert_reference_document(&doc);
}

#[test]
fn well_formed_document_uses_the_structured_decoder() {
    let document = format!(
        r#"<rDE xmlns="http://ekuatia.set.gov.py/sifen/xsd">{}<gCamFuFD><dCarQR>https://ekuatia.set.gov.py/consultas/qr?Id=1</dCarQR></gCamFuFD></rDE>"#,
        document_element()
    );
    let (doc, strategy) = decode_document_traced(&document).unwrap();

    assert_eq!(strategy, "structured");
    assert_eq!(doc.control_code, CDC);
    assert_eq!(doc.issuer.name, "Acme Corp S.A.");
    assert_eq!(doc.line_items.len(), 1);
    assert_eq!(
        doc.qr_verification_url.as_deref(),
        Some("https://ekuatia.set.gov.py/consultas/qr?Id=1")
    );
}

#[test]
fn missing_qr_block_after_signature() {
    let document = format!(
        r#"<rDE xmlns="http://ekuatia.set.gov.py/sifen/xsd"><dVerFor>150</dVerFor>{}{}</rDE>"#,
        document_element(),
        signature()
    );
    let xml = document_response("0422", "CDC encontrado", &document, 1);
    let doc = parse_document_response(&xml).unwrap().payload.unwrap();

    assert_eq!(doc.control_code, CDC);
    assert_eq!(doc.qr_verification_url, None);
    assert_eq!(doc.totals.gross_total, 10000);
}

#[test]
fn truncated_document_is_reconstructed() {
    let full = signed_document();
    let truncated = full.trim_end_matches("</rDE>");
    let cleaned = clean_document_content(&xml_escape(truncated));
    let fragment = extract_document_fragment(&cleaned);
    assert_eq!(fragment.policy, BoundaryPolicy::Reconstructed);
    assert!(fragment.text.ends_with("</rDE>"));

    let xml = document_response("0422", "CDC encontrado", truncated, 1);
    let doc = parse_document_response(&xml).unwrap().payload.unwrap();
    assert_reference_document(&doc);
}

#[test]
fn malformed_document_falls_through_to_pattern_scan() {
    let broken = signed_document().replace("</gEmis>", "</gEmisor>");
    let cleaned = clean_document_content(&xml_escape(&broken));
    let fragment = extract_document_fragment(&cleaned);

    let (doc, strategy) = decode_document_traced(&fragment.text).unwrap();
    assert_eq!(strategy, "pattern-scan");
    assert_reference_document(&doc);

    let xml = document_response("0422", "CDC encontrado", &broken, 2);
    let doc = parse_document_response(&xml).unwrap().payload.unwrap();
    assert_reference_document(&doc);
}

#[test]
fn pattern_scan_skips_a_corrupt_item_only() {
    let corrupt_item = "<gCamItem><dCodInt>P-002</dCodInt><dDesProSer>Roto</dDesProSer>\
        <dCantProSer>uno</dCantProSer><gValorItem><dPUniProSer>5000</dPUniProSer>\
        <gValorRestaItem><dTotOpeItem>5000</dTotOpeItem></gValorRestaItem></gValorItem></gCamItem>";
    let broken = signed_document()
        .replace("</gDtipDE>", &format!("{corrupt_item}</gDtipDE>"))
        .replace("</gEmis>", "</gEmisor>");
    let xml = document_response("0422", "CDC encontrado", &broken, 1);

    let doc = parse_document_response(&xml).unwrap().payload.unwrap();
    assert_eq!(doc.line_items.len(), 1);
    assert_eq!(doc.line_items[0].code, "P-001");
    assert_eq!(doc.issuer.name, "Acme Corp S.A.");
    assert_eq!(doc.totals.gross_total, 10000);
}

#[test]
fn garbage_content_still_yields_a_document() {
    let xml = document_response("0422", "CDC encontrado", "<<< nothing usable >>>", 1);
    let doc = parse_document_response(&xml).unwrap().payload.unwrap();

    assert_eq!(doc.control_code, "");
    assert_eq!(doc.issuer.name, ISSUER_PLACEHOLDER);
    assert_eq!(doc.recipient.name, RECIPIENT_PLACEHOLDER);
    assert!(doc.line_items.is_empty());
}

#[test]
fn not_found_carries_no_document() {
    let xml = envelope(
        r#"<ns2:rEnviConsDeResponse xmlns:ns2="http://ekuatia.set.gov.py/sifen/xsd"><ns2:dFecProc>2024-01-02T08:00:00</ns2:dFecProc><ns2:dCodRes>0420</ns2:dCodRes><ns2:dMsgRes>CDC inexistente</ns2:dMsgRes></ns2:rEnviConsDeResponse>"#,
    );
    let result = parse_document_response(&xml).unwrap();

    assert_eq!(result.response_code, "0420");
    assert_eq!(result.message, "CDC inexistente");
    assert!(result.payload.is_none());
    assert_eq!(result.status(), LookupStatus::NotFound);
}

#[test]
fn non_success_codes_ignore_embedded_content() {
    for (code, message, status) in [
        ("0420", "CDC inexistente", LookupStatus::NotFound),
        ("0421", "Sin permiso para consultar", LookupStatus::Forbidden),
    ] {
        let xml = document_response(code, message, &signed_document(), 1);
        let result = parse_document_response(&xml).unwrap();

        assert_eq!(result.response_code, code);
        assert_eq!(result.message, message);
        assert!(result.payload.is_none(), "code {code}");
        assert_eq!(result.status(), status);
    }
}

#[test]
fn found_without_content_is_a_shape_error() {
    let xml = envelope(
        r#"<ns2:rEnviConsDeResponse xmlns:ns2="http://ekuatia.set.gov.py/sifen/xsd"><ns2:dCodRes>0422</ns2:dCodRes><ns2:dMsgRes>CDC encontrado</ns2:dMsgRes></ns2:rEnviConsDeResponse>"#,
    );
    assert!(matches!(
        parse_document_response(&xml),
        Err(SifenError::ProtocolShape(_))
    ));
}

#[test]
fn document_serializes_for_a_rest_facade() {
    let doc = parse_document_response(&document_found())
        .unwrap()
        .payload
        .unwrap();
    let json = serde_json::to_value(&doc).unwrap();

    assert_eq!(json["control_code"], CDC);
    assert_eq!(json["totals"]["gross_total"], 10000);
    assert_eq!(json["line_items"][0]["quantity"], "1.0000");
}
