//! Supported languages for the batch client.
//!
//! - `registry`: every language code the client accepts, with English names
//! - `language`: `Language`, a code validated against the registry
//!
//! The gateway itself does not consult the registry; it forwards whatever two
//! characters the caller sends.

mod language;
mod registry;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
