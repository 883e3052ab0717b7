//! Ordered decode strategies for the extracted document fragment.

use thiserror::Error;

use super::scan::PatternScanDecode;
use super::strict::StrictTreeDecode;
use super::structured::StructuredDecode;
use crate::core::{InvoiceDocument, SifenError};

/// A strategy failure that hands the fragment to the next strategy.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecoverableError {
    /// The fragment is not well-formed under this strategy's rules.
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// Well-formed, but no `DE` element below the named root.
    #[error("no DE element under <{0}>")]
    MissingDocument(String),
}

impl From<SifenError> for RecoverableError {
    fn from(err: SifenError) -> Self {
        match err {
            SifenError::MalformedXml(msg) => Self::MalformedXml(msg),
            other => Self::MalformedXml(other.to_string()),
        }
    }
}

impl From<RecoverableError> for SifenError {
    fn from(err: RecoverableError) -> Self {
        match err {
            RecoverableError::MalformedXml(msg) => Self::MalformedXml(msg),
            RecoverableError::MissingDocument(_) => Self::ProtocolShape(err.to_string()),
        }
    }
}

/// One way of turning the cleaned fragment into a document.
pub trait DecodeStrategy: Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn attempt(&self, text: &str) -> Result<InvoiceDocument, RecoverableError>;
}

/// Structured, then strict-tree, then pattern-scan.
pub const CASCADE: [&dyn DecodeStrategy; 3] =
    [&StructuredDecode, &StrictTreeDecode, &PatternScanDecode];

/// Decode a fragment with the default cascade.
pub fn decode_document(text: &str) -> Result<InvoiceDocument, SifenError> {
    decode_document_traced(text).map(|(document, _)| document)
}

/// [`decode_document`], also returning the name of the strategy that succeeded.
pub fn decode_document_traced(text: &str) -> Result<(InvoiceDocument, &'static str), SifenError> {
    decode_with(&CASCADE, text)
}

/// Run `strategies` in order until one succeeds.
///
/// When all of them fail, the last failure is returned.
pub fn decode_with(
    strategies: &[&dyn DecodeStrategy],
    text: &str,
) -> Result<(InvoiceDocument, &'static str), SifenError> {
    let mut last_error = None;
    for strategy in strategies {
        match strategy.attempt(text) {
            Ok(document) => {
                tracing::debug!(strategy = strategy.name(), "document decoded");
                return Ok((document, strategy.name()));
            }
            Err(e) => {
                tracing::warn!(
                    strategy = strategy.name(),
                    error = %e,
                    "decode strategy failed, falling through"
                );
                last_error = Some(e);
            }
        }
    }
    Err(last_error.map_or_else(
        || SifenError::MalformedXml("no decode strategy available".into()),
        SifenError::from,
    ))
}
