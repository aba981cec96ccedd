//! Core types for Opaline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod country;
pub mod id;
pub mod money;

pub use country::{CountryCode, CountryCodeError};
pub use id::*;
pub use money::{CurrencyCode, Money, UnknownCurrency};
