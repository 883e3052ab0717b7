//! # sifen
//!
//! Client-side library for the consultation services of SIFEN, Paraguay's
//! e-invoicing platform: taxpayer (RUC) lookups and electronic document (DTE)
//! lookups.
//!
//! The heart of the crate is a tolerant response parser. DTE responses embed
//! the signed document as escaped text that is frequently escaped several
//! times over, truncated, or structured inconsistently across document
//! variants; [`parser`] recovers as much of it as it can through an ordered
//! cascade of decoders.
//!
//! Monetary totals are integer guaraní amounts; quantities and unit prices use
//! [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use sifen::parser::parse_taxpayer_response;
//!
//! let xml = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body>
//!   <ns2:rResEnviConsRUC xmlns:ns2="http://ekuatia.set.gov.py/sifen/xsd">
//!     <ns2:dCodRes>0502</ns2:dCodRes><ns2:dMsgRes>RUC encontrado</ns2:dMsgRes>
//!     <ns2:xContRUC>
//!       <ns2:dRUCCons>80012345</ns2:dRUCCons><ns2:dRazCons> Acme Corp </ns2:dRazCons>
//!       <ns2:dCodEstCons>1</ns2:dCodEstCons><ns2:dDesEstCons>ACTIVO</ns2:dDesEstCons>
//!       <ns2:dRUCFactElec>S</ns2:dRUCFactElec>
//!     </ns2:xContRUC>
//!   </ns2:rResEnviConsRUC></env:Body></env:Envelope>"#;
//!
//! let result = parse_taxpayer_response(xml).unwrap();
//! let taxpayer = result.payload.unwrap();
//! assert_eq!(taxpayer.legal_name, "Acme Corp");
//! assert!(taxpayer.is_electronic_biller);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Lookup types, response codes, errors, numeric coercion |
//! | `parser` (default) | SOAP envelope parsing, unescape pipeline, DTE decode cascade |
//! | `service` | Config, TTL cache, transport seam, lookup orchestration |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "parser")]
pub mod parser;

#[cfg(feature = "service")]
pub mod service;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
