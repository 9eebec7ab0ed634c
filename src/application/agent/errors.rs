use crate::infrastructure::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("model produced an unrecognized step kind: {0}")]
    UnrecognizedStep(String),
    #[error("every configured credential was rejected")]
    CredentialsExhausted,
    #[error("no credentials configured")]
    NoCredentials,
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Model(err) => err.user_message(),
            AgentError::UnrecognizedStep(kind) => {
                format!("The model produced a step kind this agent does not understand ({kind}).")
            }
            AgentError::CredentialsExhausted => {
                "All configured API keys were rejected. Check your credentials.".to_string()
            }
            AgentError::NoCredentials => {
                "No API keys configured. Set GEMINI_API_KEY or GEMINI_API_KEY_1..N.".to_string()
            }
        }
    }
}
