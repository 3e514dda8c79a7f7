use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response contained no text")]
    MissingText,
}

/// Single-shot text generation
#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InsightError>;
}

/// Gemini `generateContent` over HTTPS
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl InsightProvider for GeminiProvider {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InsightError> {
        let api_key = self.api_key.as_deref().ok_or(InsightError::MissingApiKey)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let res = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(InsightError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = res.json().await?;
        extract_text(parsed)
    }
}

/// Join the text parts of the first candidate
fn extract_text(response: GenerateResponse) -> Result<String, InsightError> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .ok_or(InsightError::MissingText)?;

    let texts: Vec<String> = content.parts.into_iter().filter_map(|part| part.text).collect();
    if texts.is_empty() {
        return Err(InsightError::MissingText);
    }
    Ok(texts.concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<String, InsightError> {
        extract_text(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn test_extracts_joined_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Take 800 IU."},{"text":" Daily."}]}}]}"#;
        assert_eq!(parse(body).unwrap(), "Take 800 IU. Daily.");
    }

    #[test]
    fn test_missing_text() {
        assert!(matches!(parse(r#"{"candidates":[]}"#), Err(InsightError::MissingText)));
        assert!(matches!(parse(r#"{}"#), Err(InsightError::MissingText)));
        assert!(matches!(
            parse(r#"{"candidates":[{"content":{"parts":[{}]}}]}"#),
            Err(InsightError::MissingText)
        ));
    }

    #[test]
    fn test_blank_text_is_not_missing() {
        assert_eq!(parse(r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#).unwrap(), "");
    }

    #[tokio::test]
    async fn test_no_key_fails_without_network() {
        let provider = GeminiProvider::new("http://127.0.0.1:9".to_string(), None);
        let result = provider.generate("gemini-3-flash-preview", "hi").await;
        assert!(matches!(result, Err(InsightError::MissingApiKey)));
    }
}
