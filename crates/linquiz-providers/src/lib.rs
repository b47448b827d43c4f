//! linquiz-providers — text generation backends and configuration.
//!
//! Implements the `TextGenerator` trait for the Anthropic Messages API,
//! plus a mock for tests, and resolves the optional API credential.

pub mod anthropic;
pub mod config;
pub mod mock;

pub use config::{create_provider, load_config, resolve_api_key, LinquizConfig};
pub use linquiz_core::error::ProviderError;
