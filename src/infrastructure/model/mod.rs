pub mod adapter;
pub mod gemini;
pub mod traits;
pub mod types;

pub use gemini::{DEFAULT_ENDPOINT, GeminiClient};
pub use traits::ModelProvider;
pub use types::{ModelError, ModelRequest, ModelResponse};
