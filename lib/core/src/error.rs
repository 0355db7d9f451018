//! Error handling foundation for token-bridge.
//!
//! Each crate defines its own error enum in its own error module and
//! returns it wrapped in a rootcause [`Report`].

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
