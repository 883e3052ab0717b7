use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::core::SifenError;

/// What to ask SIFEN for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// RUC consultation, RUC without check digit.
    Taxpayer { ruc: String },
    /// DTE consultation by 44-digit control code.
    Document { cdc: String },
}

/// One consultation call. The transport turns it into a SOAP body (`dId` is
/// `request_id`) and signs the request with its client certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapRequest {
    pub request_id: u64,
    pub query: Query,
}

/// Sends a consultation to SIFEN and returns the raw response body.
///
/// Implementations own the HTTP client, the certificate and the timeout
/// ([`SifenConfig::request_timeout`](super::SifenConfig::request_timeout)).
/// Network, TLS and HTTP failures map to [`SifenError::Transport`].
pub trait Transport: Send + Sync {
    fn send(&self, request: &SoapRequest) -> impl Future<Output = Result<String, SifenError>> + Send;
}

/// Monotonic source of `dId` values, owned by one client.
#[derive(Debug)]
pub struct RequestIdCounter(AtomicU64);

impl RequestIdCounter {
    /// Seeded from the current Unix timestamp, so ids keep increasing across restarts.
    pub fn new() -> Self {
        Self::starting_at(u64::try_from(Utc::now().timestamp()).unwrap_or(0))
    }

    /// The first [`next`](Self::next) returns `seed + 1`.
    pub fn starting_at(seed: u64) -> Self {
        Self(AtomicU64::new(seed))
    }

    /// Increment, then return the new value.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }
}

impl Default for RequestIdCounter {
    fn default() -> Self {
        Self::new()
    }
}
