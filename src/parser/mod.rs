//! SIFEN SOAP response parsing.
//!
//! The taxpayer (RUC) response is a plain envelope. The document (DTE)
//! response embeds the signed `rDE` as escaped text inside `xContenDE`, and
//! that text is routinely escaped several times over, truncated, or carries
//! the supplementary `gCamFuFD` block after the signature. Decoding it runs
//! through four stages:
//!
//! 1. [`unescape::clean_document_content`] normalises the escaping;
//! 2. [`boundary::extract_document_fragment`] cuts out the `rDE` element;
//! 3. [`cascade::decode_document`] tries [`structured`], [`strict`] and
//!    [`scan`] in that order, each one more forgiving than the last;
//! 4. the result is wrapped in a [`LookupResult`](crate::core::LookupResult).
//!
//! ```
//! use sifen::parser::parse_taxpayer_response;
//!
//! let xml = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body>
//!   <ns2:rResEnviConsRUC xmlns:ns2="http://ekuatia.set.gov.py/sifen/xsd">
//!     <ns2:dCodRes>0500</ns2:dCodRes><ns2:dMsgRes>RUC no existe</ns2:dMsgRes>
//!   </ns2:rResEnviConsRUC></env:Body></env:Envelope>"#;
//!
//! let result = parse_taxpayer_response(xml).unwrap();
//! assert_eq!(result.response_code, "0500");
//! assert!(result.payload.is_none());
//! ```

pub mod boundary;
pub mod cascade;
mod fields;
mod response;
pub mod scan;
pub mod strict;
pub mod structured;
pub mod tree;
pub mod unescape;

pub use boundary::{BoundaryPolicy, Fragment, extract_document_fragment};
pub use cascade::{DecodeStrategy, RecoverableError, decode_document, decode_document_traced};
pub use response::{parse_document_response, parse_taxpayer_response};
pub use unescape::clean_document_content;

/// Namespace of the SIFEN response bodies.
pub const SIFEN_NS: &str = "http://ekuatia.set.gov.py/sifen/xsd";
