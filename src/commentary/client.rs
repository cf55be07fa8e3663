//! Generative-language REST client for match commentary

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{build_prompt, Commentator, CommentaryError};
use crate::config::CommentaryConfig;
use crate::game::MatchResult;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate; empty when absent
    fn first_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default()
    }
}

/// Commentary over HTTP. Without an API key every call reports
/// `MissingCredential` and no request is made.
#[derive(Clone)]
pub struct HttpCommentator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpCommentator {
    pub fn new(config: &CommentaryConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

impl Commentator for HttpCommentator {
    async fn commentate(&self, result: &MatchResult) -> Result<String, CommentaryError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(CommentaryError::MissingCredential)?;

        let prompt = build_prompt(result);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: &prompt }],
            }],
        };

        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", key)])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(CommentaryError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CommentaryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(CommentaryError::Parse)?;
        Ok(parsed.first_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(api_key: Option<&str>) -> CommentaryConfig {
        CommentaryConfig {
            api_key: api_key.map(str::to_string),
            base_url: "https://example.invalid/".into(),
            model: "announcer-1".into(),
            timeout: Duration::from_secs(8),
        }
    }

    #[test]
    fn builds_generate_url() {
        let client = HttpCommentator::new(&config(Some("k")));
        assert_eq!(
            client.generate_url(),
            "https://example.invalid/v1beta/models/announcer-1:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_short_circuits() {
        let client = HttpCommentator::new(&config(None));
        let err = tokio_test::assert_err!(client.commentate(&MatchResult::sample()).await);
        assert!(matches!(err, CommentaryError::MissingCredential));
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hype" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "contents": [{ "parts": [{ "text": "hype" }] }] })
        );
    }

    #[test]
    fn extracts_first_candidate_text() {
        let raw = r#"{
            "candidates": [
                { "content": { "parts": [
                    { "text": "K.O.! What a combo!" },
                    { "text": "ignored" }
                ] } },
                { "content": { "parts": [{ "text": "second" }] } }
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.first_text(), "K.O.! What a combo!");
    }

    #[test]
    fn missing_candidates_give_empty_text() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.first_text(), "");

        let parsed: GenerateResponse =
            serde_json::from_str(r#"{ "candidates": [{ "finishReason": "SAFETY" }] }"#).unwrap();
        assert_eq!(parsed.first_text(), "");
    }
}
