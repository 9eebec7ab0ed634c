//! Model traits

use super::types::{ModelError, ModelRequest, ModelResponse};
use async_trait::async_trait;

/// Trait for model provider implementations
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send a chat request to the model provider
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;

    /// Build a sibling provider bound to a different credential.
    ///
    /// The retry controller owns the rotation cursor; providers stay
    /// immutable and are replaced wholesale on rotation.
    fn with_credential(&self, credential: &str) -> Self
    where
        Self: Sized;
}
