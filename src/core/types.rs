use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::codes::LookupStatus;

/// Outcome of one SIFEN query: the domain status plus the decoded record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult<T> {
    /// `dCodRes`: domain response code (e.g. "0502", "0422").
    pub response_code: String,
    /// `dMsgRes`: message passed through verbatim.
    pub message: String,
    /// Decoded record; present only on the success code.
    pub payload: Option<T>,
}

impl<T> LookupResult<T> {
    /// A result carrying no record (not found, no permission, ...).
    pub fn without_payload(response_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            response_code: response_code.into(),
            message: message.into(),
            payload: None,
        }
    }

    /// A success result carrying its record.
    pub fn with_payload(
        response_code: impl Into<String>,
        message: impl Into<String>,
        payload: T,
    ) -> Self {
        Self {
            response_code: response_code.into(),
            message: message.into(),
            payload: Some(payload),
        }
    }

    /// Classify the response code.
    pub fn status(&self) -> LookupStatus {
        LookupStatus::from_code(&self.response_code)
    }

    /// `true` when the code is one of the "found" codes.
    pub fn is_success(&self) -> bool {
        self.status() == LookupStatus::Found
    }
}

/// `xContRUC`: taxpayer data returned by the RUC lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxpayerRecord {
    /// `dRUCCons`: RUC without check digit.
    pub id: String,
    /// `dRazCons`: legal name, trimmed.
    pub legal_name: String,
    /// `dCodEstCons`: taxpayer status code.
    pub status_code: String,
    /// `dDesEstCons`: status description (e.g. "ACTIVO").
    pub status_description: String,
    /// `dRUCFactElec`: whether the taxpayer is enabled as an electronic biller.
    pub is_electronic_biller: bool,
}

/// `rDE`: an electronic tax document (DTE) as recovered from the lookup.
///
/// Only the identity fields (control code, party names) are load-bearing;
/// everything else defaults to an empty string or zero when the source omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    /// `DE/@Id`: 44-character control code (CDC).
    pub control_code: String,
    /// `dProtAut`: authorization protocol number.
    pub authorization_number: String,
    /// `gOpeDE/dCodSeg`: security code.
    pub security_code: Option<String>,
    /// `dFeEmiDE`: issue date-time as sent (ISO 8601 without zone).
    pub issue_date: String,
    /// `gTimb/dDesTiDE`: document type label (e.g. "Factura electrónica").
    pub document_type: String,
    /// `"<dEst>-<dPunExp>-<dNumDoc>"`, or empty when a part is missing.
    pub document_number: String,
    /// `gTimb/dEst`: establishment code.
    pub establishment: String,
    /// `gTimb/dPunExp`: expedition point.
    pub expedition_point: String,
    /// `gOpeDE/dDesTipEmi`: emission type label.
    pub emission_type: String,
    /// `gCamCond/dDCondOpe`: operation condition label (cash / credit).
    pub operation_condition: String,
    /// `gEmis`: issuer.
    pub issuer: PartyRecord,
    /// `gDatRec`: recipient.
    pub recipient: PartyRecord,
    /// `gTotSub`: document totals.
    pub totals: TotalsRecord,
    /// `gCamItem`: line items in document order.
    pub line_items: Vec<LineItem>,
    /// `gCamFuFD/dCarQR`: QR verification URL with plain `&` separators.
    pub qr_verification_url: Option<String>,
}

impl InvoiceDocument {
    /// Parse [`issue_date`](Self::issue_date) as a local date-time.
    ///
    /// Accepts `YYYY-MM-DDTHH:MM:SS` and bare `YYYY-MM-DD` (taken as midnight).
    pub fn issue_datetime(&self) -> Option<NaiveDateTime> {
        let raw = self.issue_date.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}

/// Issuer or recipient of a document.
///
/// A party is identified either by RUC + check digit (`tax_id`, `check_digit`)
/// or by a generic identity document (`id_type`, `id_number`), not both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyRecord {
    /// `dRucEm` / `dRucRec`: RUC without check digit.
    pub tax_id: Option<String>,
    /// `dDVEmi` / `dDVRec`: RUC check digit.
    pub check_digit: Option<String>,
    /// `dNomEmi` / `dNomRec`: name.
    pub name: String,
    /// `dDTipIDRec`: identity document type label.
    pub id_type: Option<String>,
    /// `dNumIDRec`: identity document number.
    pub id_number: Option<String>,
    /// `dDirEmi` / `dDirRec`: address.
    pub address: Option<String>,
    /// `dDesPaisRe`: country name.
    pub country: Option<String>,
    /// `dTelEmi`: phone, empty when absent.
    pub phone: String,
    /// `dEmailE`: email, empty when absent.
    pub email: String,
}

impl PartyRecord {
    /// RUC with its check digit, e.g. `"80012345-6"`.
    pub fn full_tax_id(&self) -> Option<String> {
        let ruc = self.tax_id.as_deref()?;
        match self.check_digit.as_deref() {
            Some(dv) if !dv.is_empty() => Some(format!("{ruc}-{dv}")),
            _ => Some(ruc.to_string()),
        }
    }
}

/// `gTotSub`: document totals in integer minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsRecord {
    /// `dTotGralOpe`: general operation total.
    pub gross_total: i64,
    /// `dTotIVA`: total VAT.
    pub tax_total: i64,
    /// `dIVA5`: VAT at 5%.
    pub tax_5: i64,
    /// `dIVA10`: VAT at 10%.
    pub tax_10: i64,
    /// `dSubExe`: exempt subtotal.
    pub exempt_subtotal: i64,
    /// `dSubExo`: exonerated subtotal.
    pub exonerated_subtotal: i64,
    /// `cMoneOpe`: ISO 4217 currency code.
    pub currency: String,
}

impl Default for TotalsRecord {
    fn default() -> Self {
        Self {
            gross_total: 0,
            tax_total: 0,
            tax_5: 0,
            tax_10: 0,
            exempt_subtotal: 0,
            exonerated_subtotal: 0,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Operation currency assumed when `cMoneOpe` is absent.
pub const DEFAULT_CURRENCY: &str = "PYG";

/// `gCamItem`: one document line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// `dCodInt`: internal product code.
    pub code: String,
    /// `dDesProSer`: product or service description.
    pub description: String,
    /// `dCantProSer`: quantity.
    pub quantity: Decimal,
    /// `dPUniProSer`: unit price.
    pub unit_price: Decimal,
    /// `dTotOpeItem`: line total in minor units.
    pub line_total: i64,
    /// `dTasaIVA` rendered as a percentage label (e.g. "10%").
    pub tax_rate_label: Option<String>,
    /// `dLiqIVAItem`: VAT amount for the line.
    pub tax_amount: Option<i64>,
}
