//! Error handling foundation for the trellis workspace.
//!
//! Only the `Result` type alias lives here. Each crate defines its own
//! domain error types in its own error module and uses rootcause's
//! `.context()` to add layer-appropriate context on the way up.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
