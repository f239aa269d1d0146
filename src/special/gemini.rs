//! Google Gemini client (blocking, runs on the search thread)

use super::{LanguageModel, SpecialError};
use crate::config::GeminiConfig;
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, api_key: &str) -> Result<Self, SpecialError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// The key travels in the `x-goog-api-key` header, never in the URL.
    fn request(&self, prompt: &str) -> RequestBuilder {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.0 }
        });
        self.client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
fn reply_text(response: GenerateResponse) -> Option<String> {
    let candidate = response.candidates?.into_iter().next()?;
    let text: String = candidate
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

impl LanguageModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String, SpecialError> {
        debug!("Gemini request: model={}, prompt={} bytes", self.model, prompt.len());
        let resp = self.request(prompt).send()?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(SpecialError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response: GenerateResponse = resp.json()?;
        let text = reply_text(response).ok_or(SpecialError::EmptyReply)?;
        debug!("Gemini reply: {} bytes", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[
                {"content":{"parts":[{"text":"{\"房間數\":"},{"text":"3}"}]}},
                {"content":{"parts":[{"text":"ignored"}]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(reply_text(response).as_deref(), Some("{\"房間數\":3}"));
    }

    #[test]
    fn blocked_or_empty_reply_has_no_text() {
        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(reply_text(blocked), None);

        let empty: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .unwrap();
        assert_eq!(reply_text(empty), None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = GeminiConfig {
            base_url: "http://localhost:9/v1beta/".to_string(),
            ..Default::default()
        };
        let client = GeminiClient::new(&config, " key ").unwrap();
        assert_eq!(client.base_url, "http://localhost:9/v1beta");
        assert_eq!(client.api_key, "key");
        assert_eq!(client.name(), "gemini-2.0-flash");
    }

    #[test]
    fn api_key_is_sent_as_header() {
        let config = GeminiConfig {
            base_url: "http://localhost:9/v1beta".to_string(),
            ..Default::default()
        };
        let client = GeminiClient::new(&config, "secret").unwrap();
        let request = client.request("三房").build().unwrap();

        assert_eq!(
            request.url().as_str(),
            "http://localhost:9/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert!(request.url().query().is_none());
        assert_eq!(request.headers()["x-goog-api-key"], "secret");

        let body: serde_json::Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "三房");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
    }
}
