use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use super::AnswerClient;
use crate::config::AnswerConfig;
use crate::core::EncodedImage;
use crate::core::error::AnswerError;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Image { inline_data: InlineData },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// `generateContent` client for the Gemini REST API.
pub struct GeminiClient {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(endpoint: &str, model: &str, api_key: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Reads the API key from the environment variable named in the config.
    pub fn from_config(cfg: &AnswerConfig) -> Result<Self, AnswerError> {
        let api_key = std::env::var(&cfg.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AnswerError::MissingApiKey {
                var: cfg.api_key_env.clone(),
            })?;
        Ok(Self::new(
            &cfg.endpoint,
            &cfg.model,
            &api_key,
            Duration::from_secs(cfg.timeout_secs),
        ))
    }

    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

/// Images first, in the given order, then the question as the last part.
pub fn request_body(question: &str, images: &[EncodedImage]) -> Result<String, AnswerError> {
    let mut parts: Vec<Part<'_>> = images
        .iter()
        .map(|image| Part::Image {
            inline_data: InlineData {
                mime_type: image.media_type.as_mime(),
                data: general_purpose::STANDARD.encode(&image.data),
            },
        })
        .collect();
    parts.push(Part::Text { text: question });

    let request = GenerateRequest {
        contents: vec![Content { role: "user", parts }],
    };
    serde_json::to_string(&request).map_err(|e| AnswerError::Decode(e.to_string()))
}

/// Concatenated text parts of the first candidate.
pub fn parse_response(body: &str) -> Result<String, AnswerError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| AnswerError::Decode(e.to_string()))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnswerError::EmptyResponse);
    }
    Ok(text)
}

impl AnswerClient for GeminiClient {
    fn answer(&self, question: &str, images: &[EncodedImage]) -> Result<String, AnswerError> {
        let body = request_body(question, images)?;
        log::debug!(
            "[gemini] POST {} ({} images, {} bytes)",
            self.url(),
            images.len(),
            body.len()
        );

        let response = match self
            .agent
            .post(&self.url())
            .set("x-goog-api-key", &self.api_key)
            .set("Content-Type", "application/json")
            .send_string(&body)
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(AnswerError::Status { code, body });
            }
            Err(e) => return Err(AnswerError::Transport(e.to_string())),
        };

        let text = response
            .into_string()
            .map_err(|e| AnswerError::Transport(e.to_string()))?;
        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_layout() {
        let images = vec![
            EncodedImage::jpeg(vec![1, 2, 3]),
            EncodedImage::jpeg(vec![4, 5, 6]),
        ];
        let body = request_body("where are my keys?", &images).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[0]["inline_data"]["data"], "AQID");
        assert_eq!(parts[1]["inline_data"]["data"], "BAUG");
        assert_eq!(parts[2]["text"], "where are my keys?");
        assert_eq!(json["contents"][0]["role"], "user");
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"On the "},{"text":"desk."}]}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "On the desk.");
    }

    #[test]
    fn test_parse_response_without_text() {
        assert!(matches!(
            parse_response(r#"{"candidates":[]}"#),
            Err(AnswerError::EmptyResponse)
        ));
        assert!(matches!(
            parse_response("not json"),
            Err(AnswerError::Decode(_))
        ));
    }

    #[test]
    fn test_url() {
        let client = GeminiClient::new(
            "https://example.test/v1beta/",
            "gemini-2.0-flash",
            "key",
            Duration::from_secs(5),
        );
        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_missing_api_key() {
        let cfg = AnswerConfig {
            api_key_env: "RECALL_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..AnswerConfig::default()
        };
        assert!(matches!(
            GeminiClient::from_config(&cfg),
            Err(AnswerError::MissingApiKey { .. })
        ));
    }
}
