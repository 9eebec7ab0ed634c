//! Model types - request, response, and error taxonomy

use crate::domain::ChatMessage;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub content: String,
}

impl ModelResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider '{provider}' requires an API key")]
    MissingApiKey { provider: String },
    #[error("provider '{provider}' rate limited the request")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },
    #[error("provider '{provider}' rejected the API key")]
    InvalidCredential { provider: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' returned status {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ModelError {
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after,
        }
    }

    pub fn invalid_credential(provider: impl Into<String>) -> Self {
        Self::InvalidCredential {
            provider: provider.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn api(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// User-facing summary for console output.
    pub fn user_message(&self) -> String {
        match self {
            ModelError::MissingApiKey { provider } => {
                format!("Provider '{provider}' requires an API key. Check your environment.")
            }
            ModelError::RateLimited { provider, .. } => {
                format!("Provider '{provider}' is rate limiting requests. Try again later.")
            }
            ModelError::InvalidCredential { provider } => {
                format!("Provider '{provider}' rejected the configured API key.")
            }
            ModelError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not connect to provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("Request to provider '{provider}' timed out.")
                } else {
                    format!("Network error while calling provider '{provider}'.")
                }
            }
            ModelError::Api {
                provider, status, ..
            } => {
                format!("Request to provider '{provider}' failed with status {status}.")
            }
            ModelError::InvalidResponse { provider, .. } => {
                format!("Provider '{provider}' returned a response that could not be read.")
            }
        }
    }
}
