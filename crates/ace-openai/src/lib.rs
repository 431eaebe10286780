//! OpenAI-compatible completion provider for ACE.
//!
//! [`OpenAiClient`] implements `ace_core::CompletionProvider` over the
//! `/chat/completions` endpoint in JSON-object mode. Any server speaking the
//! same protocol works through [`OpenAiConfig::base_url`].

pub mod client;
pub mod config;

pub use client::OpenAiClient;
pub use config::{OpenAiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
