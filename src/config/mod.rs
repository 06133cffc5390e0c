//! Configuration for the sitewatch CLI.
//!
//! Settings resolve in order: built-in defaults, then the JSON config
//! file under the home directory, then environment variables. Validation
//! only checks that an API key is present; everything else has a usable
//! default.

mod builder;
mod constants;
mod defaults;
mod environment;
mod loader;
mod types;
mod validation;

pub use types::{Config, LlmProvider, LlmSettings, ModelSettings};
