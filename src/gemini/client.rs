use crate::{
    config::GeneratorConfig,
    error::{GenerationError, Result},
    gemini::ImageGenerator,
    models::GenerationRequest,
};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

const ERROR_BODY_LIMIT: usize = 300;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| GenerationError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn build_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            header::HeaderValue::from_str(&self.api_key)
                .map_err(|_| GenerationError::ConfigError("API key is not a valid header".into()))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value> {
        log::debug!("Invoking model: {}", request.model);

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .headers(self.build_headers()?)
            .json(&request.to_body())
            .send()
            .await
            .map_err(|e| GenerationError::RequestError(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GenerationError::ResponseError(format!("Invalid JSON response: {}", e)))
    }
}

/// Maps a non-success HTTP status onto the error taxonomy.
pub(crate) fn status_error(status: StatusCode, body: &str) -> GenerationError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::AuthError(message),
        StatusCode::TOO_MANY_REQUESTS => GenerationError::QuotaError(message),
        _ => GenerationError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

/// Prefers the API's `error.message` field, otherwise a truncated raw body.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match parsed {
        Some(message) => message,
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.chars().take(ERROR_BODY_LIMIT).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = GeneratorConfig::new()
            .with_api_key("k")
            .with_base_url("http://localhost:8080/");
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("gemini-2.5-flash-image"),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            GeminiClient::new(&GeneratorConfig::new()),
            Err(GenerationError::ConfigError(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error": {"code": 429, "message": "Resource exhausted"}}"#;
        match status_error(StatusCode::TOO_MANY_REQUESTS, body) {
            GenerationError::QuotaError(msg) => assert_eq!(msg, "Resource exhausted"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, ""),
            GenerationError::AuthError(_)
        ));
        match status_error(StatusCode::BAD_GATEWAY, "upstream down") {
            GenerationError::ApiError { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
