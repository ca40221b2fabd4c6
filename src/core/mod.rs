//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use currency::{Amount, CurrencyCode};
pub use error::RateError;
pub use rates::{ApiKey, ConversionResult, ExchangeRateProvider, PairQuote, RateSet};
