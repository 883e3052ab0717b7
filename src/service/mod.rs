//! Lookup orchestration around an external SOAP transport.
//!
//! The crate does not build or sign SOAP requests; a [`Transport`]
//! implementation does. [`SifenService`] validates the lookup key, serves
//! repeated lookups from a [`LookupCache`], and parses whatever the transport
//! returns.
//!
//! # Example
//!
//! ```ignore
//! use sifen::service::*;
//!
//! struct Http { /* reqwest client with identity */ }
//!
//! impl Transport for Http {
//!     async fn send(&self, request: &SoapRequest) -> Result<String, sifen::SifenError> {
//!         // build the envelope for request.query, POST it, return the body
//!         # unimplemented!()
//!     }
//! }
//!
//! let service = SifenService::new(Http { }, SifenConfig::from_env()?);
//! let taxpayer = service.lookup_taxpayer("80012345").await?;
//! ```

mod cache;
mod client;
mod config;
mod transport;

pub use cache::{EntityKind, LookupCache, cache_key};
pub use client::{CDC_LEN, RUC_MAX_LEN, RUC_MIN_LEN, SifenService, validate_cdc, validate_ruc};
pub use config::{Environment, SifenConfig};
pub use transport::{Query, RequestIdCounter, SoapRequest, Transport};
