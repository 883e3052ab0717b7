use super::cache::LookupCache;
use super::config::SifenConfig;
use super::transport::{Query, RequestIdCounter, SoapRequest, Transport};
use crate::core::{InvoiceDocument, LookupResult, SifenError, TaxpayerRecord};
use crate::parser::{parse_document_response, parse_taxpayer_response};

/// Shortest accepted RUC (without check digit).
pub const RUC_MIN_LEN: usize = 5;
/// Longest accepted RUC (without check digit).
pub const RUC_MAX_LEN: usize = 8;
/// Length of a document control code.
pub const CDC_LEN: usize = 44;

/// Check a RUC lookup key: 5 to 8 ASCII digits, no check digit.
///
/// Returns the trimmed RUC.
pub fn validate_ruc(ruc: &str) -> Result<&str, SifenError> {
    let ruc = ruc.trim();
    if !(RUC_MIN_LEN..=RUC_MAX_LEN).contains(&ruc.len()) || !is_digits(ruc) {
        return Err(SifenError::InvalidInput(format!(
            "RUC must be {RUC_MIN_LEN}-{RUC_MAX_LEN} digits without check digit, got '{ruc}'"
        )));
    }
    Ok(ruc)
}

/// Check a CDC lookup key: exactly 44 ASCII digits.
///
/// Returns the trimmed CDC.
pub fn validate_cdc(cdc: &str) -> Result<&str, SifenError> {
    let cdc = cdc.trim();
    if cdc.len() != CDC_LEN || !is_digits(cdc) {
        return Err(SifenError::InvalidInput(format!(
            "CDC must be {CDC_LEN} digits, got {} characters",
            cdc.chars().count()
        )));
    }
    Ok(cdc)
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// RUC and DTE lookups: validate, consult the cache, call the transport,
/// parse, cache successful results.
#[derive(Debug)]
pub struct SifenService<T> {
    transport: T,
    config: SifenConfig,
    cache: LookupCache,
    request_ids: RequestIdCounter,
}

impl<T: Transport> SifenService<T> {
    /// A service with caches built from `config`.
    pub fn new(transport: T, config: SifenConfig) -> Self {
        let cache = LookupCache::new(&config);
        Self::with_cache(transport, config, cache)
    }

    /// A service sharing an existing cache.
    pub fn with_cache(transport: T, config: SifenConfig, cache: LookupCache) -> Self {
        Self {
            transport,
            config,
            cache,
            request_ids: RequestIdCounter::new(),
        }
    }

    pub fn config(&self) -> &SifenConfig {
        &self.config
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Look up a taxpayer by RUC.
    ///
    /// # Errors
    ///
    /// [`SifenError::InvalidInput`] before any request for a malformed RUC;
    /// transport and parse errors otherwise. Non-success codes are `Ok`.
    pub async fn lookup_taxpayer(&self, ruc: &str) -> Result<LookupResult<TaxpayerRecord>, SifenError> {
        let ruc = validate_ruc(ruc)?;
        if let Some(cached) = self.cache.taxpayer(ruc).await {
            return Ok(cached);
        }

        let request = self.request(Query::Taxpayer { ruc: ruc.to_string() });
        tracing::info!(request_id = request.request_id, ruc, "querying taxpayer");
        let body = self.transport.send(&request).await?;
        let result = parse_taxpayer_response(&body)?;

        if result.is_success() {
            self.cache.store_taxpayer(ruc, result.clone()).await;
        }
        Ok(result)
    }

    /// Look up an electronic document by CDC.
    ///
    /// # Errors
    ///
    /// [`SifenError::InvalidInput`] before any request for a malformed CDC;
    /// transport and parse errors otherwise. Non-success codes are `Ok`.
    pub async fn lookup_document(&self, cdc: &str) -> Result<LookupResult<InvoiceDocument>, SifenError> {
        let cdc = validate_cdc(cdc)?;
        if let Some(cached) = self.cache.document(cdc).await {
            return Ok(cached);
        }

        let request = self.request(Query::Document { cdc: cdc.to_string() });
        tracing::info!(request_id = request.request_id, cdc, "querying document");
        let body = self.transport.send(&request).await?;
        let result = parse_document_response(&body)?;

        if result.is_success() {
            self.cache.store_document(cdc, result.clone()).await;
        }
        Ok(result)
    }

    fn request(&self, query: Query) -> SoapRequest {
        SoapRequest {
            request_id: self.request_ids.next(),
            query,
        }
    }
}
