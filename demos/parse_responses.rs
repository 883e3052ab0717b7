//! Parse canned SIFEN responses and print what was recovered.
//!
//! Run with: `cargo run --example parse_responses`

use sifen::core::*;
use sifen::parser::{
    clean_document_content, decode_document_traced, extract_document_fragment,
    parse_document_response, parse_taxpayer_response,
};

const TAXPAYER: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body>
  <ns2:rResEnviConsRUC xmlns:ns2="http://ekuatia.set.gov.py/sifen/xsd">
    <ns2:dCodRes>0502</ns2:dCodRes><ns2:dMsgRes>RUC encontrado</ns2:dMsgRes>
    <ns2:xContRUC>
      <ns2:dRUCCons>80012345</ns2:dRUCCons><ns2:dRazCons>Acme Corp</ns2:dRazCons>
      <ns2:dCodEstCons>1</ns2:dCodEstCons><ns2:dDesEstCons>ACTIVO</ns2:dDesEstCons>
      <ns2:dRUCFactElec>S</ns2:dRUCFactElec>
    </ns2:xContRUC>
  </ns2:rResEnviConsRUC></env:Body></env:Envelope>"#;

const NOT_FOUND: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body>
  <ns2:rResEnviConsRUC xmlns:ns2="http://ekuatia.set.gov.py/sifen/xsd">
    <ns2:dCodRes>0500</ns2:dCodRes><ns2:dMsgRes>RUC no existe</ns2:dMsgRes>
  </ns2:rResEnviConsRUC></env:Body></env:Envelope>"#;

// Escaped twice: once by the SOAP layer, once more by SIFEN itself.
const DOCUMENT: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body>
  <ns2:rEnviConsDeResponse xmlns:ns2="http://ekuatia.set.gov.py/sifen/xsd">
    <ns2:dCodRes>0422</ns2:dCodRes><ns2:dMsgRes>CDC encontrado</ns2:dMsgRes>
    <ns2:xContenDE>&amp;lt;rDE&amp;gt;&amp;lt;DE Id=&amp;quot;01800123456001001000012322024010112345678901&amp;quot;&amp;gt;&amp;lt;gTimb&amp;gt;&amp;lt;dDesTiDE&amp;gt;Factura electrónica&amp;lt;/dDesTiDE&amp;gt;&amp;lt;dEst&amp;gt;001&amp;lt;/dEst&amp;gt;&amp;lt;dPunExp&amp;gt;001&amp;lt;/dPunExp&amp;gt;&amp;lt;dNumDoc&amp;gt;0000042&amp;lt;/dNumDoc&amp;gt;&amp;lt;/gTimb&amp;gt;&amp;lt;gDatGralOpe&amp;gt;&amp;lt;dFeEmiDE&amp;gt;2024-03-01T09:30:00&amp;lt;/dFeEmiDE&amp;gt;&amp;lt;gEmis&amp;gt;&amp;lt;dRucEm&amp;gt;80012345&amp;lt;/dRucEm&amp;gt;&amp;lt;dDVEmi&amp;gt;6&amp;lt;/dDVEmi&amp;gt;&amp;lt;dNomEmi&amp;gt;Acme Corp&amp;lt;/dNomEmi&amp;gt;&amp;lt;/gEmis&amp;gt;&amp;lt;gDatRec&amp;gt;&amp;lt;dRucRec&amp;gt;4567890&amp;lt;/dRucRec&amp;gt;&amp;lt;dDVRec&amp;gt;1&amp;lt;/dDVRec&amp;gt;&amp;lt;dNomRec&amp;gt;Cliente S.R.L.&amp;lt;/dNomRec&amp;gt;&amp;lt;/gDatRec&amp;gt;&amp;lt;/gDatGralOpe&amp;gt;&amp;lt;gTotSub&amp;gt;&amp;lt;dTotIVA&amp;gt;4545&amp;lt;/dTotIVA&amp;gt;&amp;lt;dTotGralOpe&amp;gt;50000&amp;lt;/dTotGralOpe&amp;gt;&amp;lt;/gTotSub&amp;gt;&amp;lt;/DE&amp;gt;&amp;lt;/rDE&amp;gt;</ns2:xContenDE>
  </ns2:rEnviConsDeResponse></env:Body></env:Envelope>"#;

fn main() -> Result<(), SifenError> {
    println!("=== Taxpayer ===");
    let result = parse_taxpayer_response(TAXPAYER)?;
    if let Some(taxpayer) = &result.payload {
        println!("  {} ({})", taxpayer.legal_name, taxpayer.id);
        println!("  status: {}", taxpayer.status_description);
        println!("  electronic biller: {}", taxpayer.is_electronic_biller);
    }

    println!("\n=== Not found ===");
    let result = parse_taxpayer_response(NOT_FOUND)?;
    println!(
        "  {} {:?} -> HTTP {}: {}",
        result.response_code,
        result.status(),
        result.status().http_status(),
        result.message
    );

    println!("\n=== Document ===");
    let result = parse_document_response(DOCUMENT)?;
    if let Some(doc) = &result.payload {
        println!("  {} {}", doc.document_type, doc.document_number);
        println!("  CDC: {}", doc.control_code);
        println!("  issued: {:?}", doc.issue_datetime());
        println!(
            "  from {} ({})",
            doc.issuer.name,
            doc.issuer.full_tax_id().unwrap_or_default()
        );
        println!(
            "  to {} ({})",
            doc.recipient.name,
            doc.recipient.full_tax_id().unwrap_or_default()
        );
        println!(
            "  total {} {} (IVA {})",
            doc.totals.gross_total, doc.totals.currency, doc.totals.tax_total
        );
    }

    println!("\n=== Damaged document ===");
    let damaged = "&lt;rDE&gt;&lt;DE Id=\"0180\"&gt;&lt;gEmis&gt;&lt;dNomEmi&gt;Acme Corp&lt;/dNomEmi&gt;\
                   &lt;/gEmisor&gt;&lt;dTotGralOpe&gt;1500&lt;/dTotGralOpe&gt;";
    let fragment = extract_document_fragment(&clean_document_content(damaged));
    let (doc, strategy) = decode_document_traced(&fragment.text)?;
    println!("  boundary: {:?}, decoded by: {strategy}", fragment.policy);
    println!(
        "  issuer: {}, total: {}",
        doc.issuer.name, doc.totals.gross_total
    );

    Ok(())
}
