//! Completion provider contract.
//!
//! The pipeline never talks to a model directly. It hands a fully rendered
//! request string to a [`CompletionProvider`] and receives the reply already
//! decoded into a JSON object map. Implementations own transport, auth and
//! timeouts; the pipeline performs no retries.

use async_trait::async_trait;

/// Decoded provider reply: a JSON object's field/value map.
pub type ResponseMap = serde_json::Map<String, serde_json::Value>;

/// Result type for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Failures surfaced by a completion provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("provider misconfigured: {0}")]
    Configuration(String),
}

/// A hosted language model that answers with a JSON object.
///
/// Contract:
/// - A reply that is not a JSON object decodes to an empty map, not an error.
/// - Network, timeout, status and auth failures are `ProviderError`s.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &str) -> ProviderResult<ResponseMap>;
}

#[async_trait]
impl<P: CompletionProvider + ?Sized> CompletionProvider for std::sync::Arc<P> {
    async fn complete(&self, request: &str) -> ProviderResult<ResponseMap> {
        (**self).complete(request).await
    }
}

/// Decode raw reply text into a `ResponseMap`.
///
/// Anything that is not a JSON object (invalid JSON, arrays, scalars, empty
/// text) yields an empty map.
pub fn decode_reply(text: &str) -> ResponseMap {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => ResponseMap::new(),
    }
}
