//! SIFEN response codes (`dCodRes`) for the consultation services.

use serde::{Deserialize, Serialize};

/// RUC lookup: taxpayer does not exist.
pub const TAXPAYER_NOT_FOUND: &str = "0500";
/// RUC lookup: caller lacks permission.
pub const TAXPAYER_FORBIDDEN: &str = "0501";
/// RUC lookup: taxpayer found.
pub const TAXPAYER_FOUND: &str = "0502";

/// DTE lookup: document does not exist or was rejected.
pub const DOCUMENT_NOT_FOUND: &str = "0420";
/// DTE lookup: caller lacks permission.
pub const DOCUMENT_FORBIDDEN: &str = "0421";
/// DTE lookup: document found.
pub const DOCUMENT_FOUND: &str = "0422";

/// Coarse classification of a response code, for mapping to HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupStatus {
    /// 0502 / 0422
    Found,
    /// 0500 / 0420
    NotFound,
    /// 0501 / 0421
    Forbidden,
    /// Any code this crate does not know.
    Other,
}

impl LookupStatus {
    /// Classify a `dCodRes` value from either lookup service.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            TAXPAYER_FOUND | DOCUMENT_FOUND => Self::Found,
            TAXPAYER_NOT_FOUND | DOCUMENT_NOT_FOUND => Self::NotFound,
            TAXPAYER_FORBIDDEN | DOCUMENT_FORBIDDEN => Self::Forbidden,
            _ => Self::Other,
        }
    }

    /// HTTP status a REST façade should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Found | Self::Other => 200,
            Self::NotFound => 404,
            Self::Forbidden => 403,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_codes() {
        assert_eq!(LookupStatus::from_code("0502"), LookupStatus::Found);
        assert_eq!(LookupStatus::from_code("0422"), LookupStatus::Found);
        assert_eq!(LookupStatus::from_code("0500"), LookupStatus::NotFound);
        assert_eq!(LookupStatus::from_code("0420"), LookupStatus::NotFound);
        assert_eq!(LookupStatus::from_code("0501"), LookupStatus::Forbidden);
        assert_eq!(LookupStatus::from_code(" 0421 "), LookupStatus::Forbidden);
        assert_eq!(LookupStatus::from_code("0160"), LookupStatus::Other);
    }

    #[test]
    fn http_mapping() {
        assert_eq!(LookupStatus::NotFound.http_status(), 404);
        assert_eq!(LookupStatus::Forbidden.http_status(), 403);
        assert_eq!(LookupStatus::Found.http_status(), 200);
    }
}
