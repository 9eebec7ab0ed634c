//! Gemini client implementation

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use super::adapter::to_gemini_format;
use super::traits::ModelProvider;
use super::types::{ModelError, ModelRequest, ModelResponse};

const PROVIDER_ID: &str = "gemini";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_API_PATH: &str = "v1beta/models";

/// Gemini client for Google AI.
///
/// Rotation builds a sibling client bound to another key via
/// [`ModelProvider::with_credential`]; the reqwest connection pool is shared.
#[derive(Clone)]
pub struct GeminiClient {
    endpoint: String,
    api_path: String,
    api_key: String,
    http: Client,
}

impl GeminiClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_path: DEFAULT_API_PATH.to_string(),
            api_key: api_key.into(),
            http: Client::new(),
        }
    }

    fn build_model_url(&self, model: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        format!("{base}/{}/{model}:generateContent", self.api_path)
    }

    fn require_api_key(&self) -> Result<&str, ModelError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(ModelError::missing_api_key(PROVIDER_ID));
        }
        Ok(key)
    }
}

#[async_trait]
impl ModelProvider for GeminiClient {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let api_key = self.require_api_key()?;
        let url = format!("{}?key={api_key}", self.build_model_url(&request.model));
        let (system_text, contents) = to_gemini_format(&request.messages);

        let mut payload = json!({
            "contents": contents,
            "generationConfig": {
                "responseMimeType": "application/json"
            }
        });

        if let Some(system) = system_text {
            payload["system_instruction"] = json!({
                "parts": [{"text": system}]
            });
        }

        info!(
            model = request.model.as_str(),
            messages = request.messages.len(),
            "Sending request to Gemini"
        );

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ModelError::network(PROVIDER_ID, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::network(PROVIDER_ID, e))?;

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::invalid_response(PROVIDER_ID, e.to_string()))?;
        debug!("Received response from Gemini");

        // An empty candidate list maps to an empty reply; the step decoder
        // treats that as transient rather than a protocol fault.
        Ok(ModelResponse::new(extract_text(parsed)))
    }

    fn with_credential(&self, credential: &str) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            api_path: self.api_path.clone(),
            api_key: credential.to_string(),
            http: self.http.clone(),
        }
    }
}

/// Map a non-success HTTP exchange onto the retry taxonomy.
///
/// 429 carries an optional google.rpc RetryInfo delay; 400 with reason
/// API_KEY_INVALID marks the credential itself as bad. Everything else is
/// surfaced as-is and treated as fatal by the loop.
fn classify_failure(status: StatusCode, body: &str) -> ModelError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            ModelError::rate_limited(PROVIDER_ID, parse_retry_delay(body))
        }
        StatusCode::BAD_REQUEST if failure_reason(body).as_deref() == Some("API_KEY_INVALID") => {
            ModelError::invalid_credential(PROVIDER_ID)
        }
        other => ModelError::api(
            PROVIDER_ID,
            other.as_u16(),
            failure_message(body).unwrap_or_else(|| truncate(body, 200)),
        ),
    }
}

fn error_details(body: &str) -> Vec<Value> {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.get("details")?.as_array().cloned())
        .unwrap_or_default()
}

fn failure_reason(body: &str) -> Option<String> {
    error_details(body)
        .iter()
        .find_map(|detail| detail.get("reason")?.as_str().map(str::to_string))
}

fn failure_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Pull the server-suggested delay out of a RetryInfo detail ("37s" form).
fn parse_retry_delay(body: &str) -> Option<Duration> {
    let details = error_details(body);
    let retry_info = details.iter().find(|detail| {
        detail
            .get("@type")
            .and_then(Value::as_str)
            .is_some_and(|t| t.ends_with("RetryInfo"))
    })?;
    let delay = retry_info.get("retryDelay")?.as_str()?;
    let seconds: u64 = delay.trim_end_matches('s').parse().ok()?;
    Some(Duration::from_secs(seconds))
}

fn extract_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .flat_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .unwrap_or_default()
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE_LIMIT_BODY: &str = r#"{
        "error": {
            "code": 429,
            "message": "Resource has been exhausted",
            "details": [
                {
                    "@type": "type.googleapis.com/google.rpc.RetryInfo",
                    "retryDelay": "37s"
                }
            ]
        }
    }"#;

    const INVALID_KEY_BODY: &str = r#"{
        "error": {
            "code": 400,
            "message": "API key not valid",
            "details": [
                {
                    "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                    "reason": "API_KEY_INVALID"
                }
            ]
        }
    }"#;

    #[test]
    fn classifies_rate_limit_with_retry_delay() {
        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_BODY);
        match err {
            ModelError::RateLimited { retry_after, .. } => {
                assert_eq!(retry_after, Some(Duration::from_secs(37)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rate_limit_without_details_has_no_delay() {
        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, "{}");
        match err {
            ModelError::RateLimited { retry_after, .. } => assert!(retry_after.is_none()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn classifies_invalid_api_key() {
        let err = classify_failure(StatusCode::BAD_REQUEST, INVALID_KEY_BODY);
        assert!(matches!(err, ModelError::InvalidCredential { .. }));
    }

    #[test]
    fn other_bad_requests_stay_api_errors() {
        let body = r#"{"error":{"code":400,"message":"unsupported field"}}"#;
        let err = classify_failure(StatusCode::BAD_REQUEST, body);
        match err {
            ModelError::Api {
                status, message, ..
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "unsupported field");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn extracts_first_candidate_text() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "{\"step\":\"think\"}"}]}}
            ]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(parsed), "{\"step\":\"think\"}");
    }

    #[test]
    fn missing_candidates_extract_to_empty() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(parsed), "");
    }

    #[test]
    fn builds_model_url_from_endpoint() {
        let client = GeminiClient::new("https://example.test/", "k");
        assert_eq!(
            client.build_model_url("gemini-1.5-flash"),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
