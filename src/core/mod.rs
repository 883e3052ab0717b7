//! Core lookup types, response codes, errors, and numeric coercion.
//!
//! This module holds the value types every parse call produces. It carries no
//! XML handling of its own and compiles without optional dependencies.

pub mod codes;
pub mod coerce;
mod error;
mod types;

pub use codes::LookupStatus;
pub use coerce::{amount_or_zero, decimal_or_zero, parse_amount, parse_decimal};
pub use error::*;
pub use types::*;
