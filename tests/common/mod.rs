//! Response fixtures shared by the integration tests.

#![allow(dead_code)]

pub const CDC: &str = "01800123456001001000012322024010112345678901";

pub const QR_URL: &str = "https://ekuatia.set.gov.py/consultas/qr?nVersion=150&Id=01800123456001001000012322024010112345678901&dFeEmiDE=323032342d30312d30315431303a30303a3030&dRucRec=&dNumIDRec=1234567&dTotGralOpe=10000&dTotIVA=909&cItems=1&DigestValue=6a4b&IdCSC=0001&cHashQR=ab12cd34";

/// Escape text for inclusion in XML content.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Header/><env:Body>{body}</env:Body></env:Envelope>"#
    )
}

pub fn taxpayer_response(code: &str, message: &str, content: &str) -> String {
    envelope(&format!(
        r#"<ns2:rResEnviConsRUC xmlns:ns2="http://ekuatia.set.gov.py/sifen/xsd"><ns2:dCodRes>{code}</ns2:dCodRes><ns2:dMsgRes>{message}</ns2:dMsgRes>{content}</ns2:rResEnviConsRUC>"#
    ))
}

pub fn taxpayer_found() -> String {
    taxpayer_response(
        "0502",
        "RUC encontrado",
        r#"<ns2:xContRUC>
             <ns2:dRUCCons>80012345</ns2:dRUCCons>
             <ns2:dRazCons>   Acme Corp   </ns2:dRazCons>
             <ns2:dCodEstCons>1</ns2:dCodEstCons>
             <ns2:dDesEstCons>ACTIVO</ns2:dDesEstCons>
             <ns2:dRUCFactElec>S</ns2:dRUCFactElec>
           </ns2:xContRUC>"#,
    )
}

/// The `DE` element of a one-item invoice to a recipient identified by cédula.
pub fn document_element() -> String {
    format!(
        r#"<DE Id="{CDC}">
<dDVId>1</dDVId><dFecFirma>2024-01-01T10:05:00</dFecFirma><dSisFact>1</dSisFact>
<gOpeDE><iTipEmi>1</iTipEmi><dDesTipEmi>Normal</dDesTipEmi><dCodSeg>123456789</dCodSeg></gOpeDE>
<gTimb><iTiDE>1</iTiDE><dDesTiDE>Factura electrónica</dDesTiDE><dNumTim>12345678</dNumTim><dEst>001</dEst><dPunExp>002</dPunExp><dNumDoc>0000123</dNumDoc></gTimb>
<gDatGralOpe><dFeEmiDE>2024-01-01T10:00:00</dFeEmiDE>
<gOpeCom><cMoneOpe>PYG</cMoneOpe></gOpeCom>
<gEmis><dRucEm>80012345</dRucEm><dDVEmi>6</dDVEmi><dNomEmi>Acme Corp S.A.</dNomEmi><dDirEmi>Av. Mcal. López 1234</dDirEmi><dTelEmi>021123456</dTelEmi><dEmailE>facturas@acme.com.py</dEmailE></gEmis>
<gDatRec><iNatRec>2</iNatRec><dDTipIDRec>Cédula paraguaya</dDTipIDRec><dNumIDRec>1234567</dNumIDRec><dNomRec>Juan Pérez</dNomRec><dDesPaisRe>Paraguay</dDesPaisRe></gDatRec>
</gDatGralOpe>
<gDtipDE><gCamCond><dDCondOpe>Contado</dDCondOpe></gCamCond>
<gCamItem><dCodInt>P-001</dCodInt><dDesProSer>Servicio de consultoría</dDesProSer><dCantProSer>1.0000</dCantProSer>
<gValorItem><dPUniProSer>10000.00000000</dPUniProSer><dTotBruOpeItem>10000</dTotBruOpeItem><gValorRestaItem><dTotOpeItem>10000</dTotOpeItem></gValorRestaItem></gValorItem>
<gCamIVA><dTasaIVA>10</dTasaIVA><dBasGravIVA>9091</dBasGravIVA><dLiqIVAItem>909</dLiqIVAItem></gCamIVA></gCamItem>
</gDtipDE>
<gTotSub><dSubExe>0</dSubExe><dSubExo>0</dSubExo><dSub10>10000</dSub10><dTotOpe>10000</dTotOpe><dIVA5>0</dIVA5><dIVA10>909</dIVA10><dTotIVA>909</dTotIVA><dTotGralOpe>10000</dTotGralOpe></gTotSub>
</DE>"#
    )
}

pub fn signature() -> String {
    format!(
        r##"<Signature xmlns="http://www.w3.org/2000/09/xmldsig#"><SignedInfo><Reference URI="#{CDC}"><DigestValue>akL0b3Zv</DigestValue></Reference></SignedInfo><SignatureValue>MIIBIjAN&#13;
BgkqhkiG9w0</SignatureValue></Signature>"##
    )
}

/// A signed `rDE` as SIFEN stores it: the QR block follows the signature.
pub fn signed_document() -> String {
    format!(
        r#"<rDE xmlns="http://ekuatia.set.gov.py/sifen/xsd" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dVerFor>150</dVerFor>{}{}<gCamFuFD><dCarQR>{}</dCarQR></gCamFuFD></rDE>"#,
        document_element(),
        signature(),
        xml_escape(QR_URL)
    )
}

/// A DTE response whose `xContenDE` carries `document` escaped `levels` times.
pub fn document_response(code: &str, message: &str, document: &str, levels: usize) -> String {
    let mut content = document.to_string();
    for _ in 0..levels {
        content = xml_escape(&content);
    }
    envelope(&format!(
        r#"<ns2:rEnviConsDeResponse xmlns:ns2="http://ekuatia.set.gov.py/sifen/xsd"><ns2:dFecProc>2024-01-02T08:00:00</ns2:dFecProc><ns2:dCodRes>{code}</ns2:dCodRes><ns2:dMsgRes>{message}</ns2:dMsgRes><ns2:xContenDE>{content}</ns2:xContenDE></ns2:rEnviConsDeResponse>"#
    ))
}

pub fn document_found() -> String {
    document_response("0422", "CDC encontrado", &signed_document(), 1)
}
