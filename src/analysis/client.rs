//! Gemini `generateContent` REST client

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{GenerateRequest, VisionApiError, VisionModel};
use crate::config::AnalyzerSettings;

/// HTTP client for the hosted multimodal model
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client; an empty key is rejected up front
    pub fn new(settings: &AnalyzerSettings, api_key: impl Into<String>) -> Result<Self, VisionApiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(VisionApiError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, VisionApiError> {
        let data = base64::engine::general_purpose::STANDARD.encode(&request.image.bytes);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: request.prompt },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.image.mime,
                            data,
                        },
                    },
                ],
            }],
            generation_config: request
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        };

        info!("Calling {} ({} image bytes)", request.model, request.image.bytes.len());
        let response = self
            .http
            .post(self.url(request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionApiError::Status { status, body });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.text();
        debug!("{} returned {} characters", request.model, text.len());
        if text.trim().is_empty() {
            return Err(VisionApiError::EmptyResponse);
        }
        Ok(text)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
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
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, concatenated
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ImageInput;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(endpoint: &str) -> AnalyzerSettings {
        AnalyzerSettings {
            endpoint: endpoint.to_string(),
            timeout_secs: 5,
            ..AnalyzerSettings::default()
        }
    }

    fn image() -> ImageInput {
        ImageInput {
            bytes: vec![1, 2, 3],
            mime: "image/png",
        }
    }

    fn request<'a>(image: &'a ImageInput, temperature: Option<f32>) -> GenerateRequest<'a> {
        GenerateRequest {
            model: "test-model",
            prompt: "describe",
            image,
            temperature,
        }
    }

    #[test]
    fn test_missing_key_rejected() {
        let result = GeminiClient::new(&AnalyzerSettings::default(), "  ");
        assert!(matches!(result, Err(VisionApiError::MissingApiKey)));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "a"}, {"text": "b"}]}}]
        }))
        .unwrap();
        assert_eq!(parsed.text(), "ab");

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.text(), "");
    }

    #[tokio::test]
    async fn test_generate_sends_image_and_reads_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/test-model:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "# Question\nWhat?"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&settings(&server.uri()), "secret").unwrap();
        let img = image();
        let text = client.generate(request(&img, Some(0.2))).await.unwrap();
        assert_eq!(text, "# Question\nWhat?");

        let received = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&received[0].body).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "describe");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "AQID");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_generate_without_temperature_omits_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&settings(&server.uri()), "k").unwrap();
        let img = image();
        client.generate(request(&img, None)).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&received[0].body).unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&settings(&server.uri()), "k").unwrap();
        let img = image();
        let err = client.generate(request(&img, None)).await.unwrap_err();
        match err {
            VisionApiError::Status { status, body } => {
                assert_eq!(status.as_u16(), 403);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&settings(&server.uri()), "k").unwrap();
        let img = image();
        let err = client.generate(request(&img, None)).await.unwrap_err();
        assert!(matches!(err, VisionApiError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_context_is_sent_in_analysis_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Which area is the backbone?"}]}}]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        let settings = settings(&server.uri());
        let client = GeminiClient::new(&settings, "k").unwrap();

        crate::analysis::Analyzer::new(&client, &settings)
            .analyze(&path, "Area 0 is the backbone")
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&received[1].body).unwrap();
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("Area 0 is the backbone"));
        assert!(prompt.contains("'Which area is the backbone?'"));
    }
}
