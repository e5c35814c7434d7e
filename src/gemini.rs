use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::error::{Result, VidscribeError};
use crate::provider::{AnalyzeOptions, VideoAnalyzer};
use crate::source::VideoSource;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Single-call multimodal adapter: the whole video travels inline with the
/// instruction prompt, and the model answers with all three sections at once.
pub struct GeminiAnalyzer {
    api_key: String,
    model: String,
    client: reqwest::Client,
    /// Override base URL for testing.
    base_url: String,
}

impl GeminiAnalyzer {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self::with_base_url(api_key, model, GEMINI_BASE_URL.to_string())
    }

    /// Create with a custom base URL (for tests / mock servers).
    pub fn with_base_url(api_key: String, model: Option<String>, base_url: String) -> Self {
        Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.into()),
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

/// The model is asked for a JSON object matching `AnalysisResult` rather than
/// labeled prose; `AnalysisResult::from_response_text` still tolerates the
/// labeled form if the model ignores the instruction.
fn build_prompt(target_language: &str) -> String {
    format!(
        "Analyze the video content and return a JSON object with exactly these three string fields:\n\
         \"transcription\": the full English transcription of the spoken words in the video.\n\
         \"translation\": the transcription translated into simple, easy-to-understand {target_language}.\n\
         \"summary\": a detailed summary of the translation explaining its core meaning, written in {target_language}.\n\
         Return only the JSON object."
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Gemini error response body.
#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl VideoAnalyzer for GeminiAnalyzer {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn analyze(&self, video: &VideoSource, opts: &AnalyzeOptions) -> Result<AnalysisResult> {
        let encoded = BASE64_STANDARD.encode(&video.bytes);
        tracing::debug!(bytes = video.bytes.len(), encoded = encoded.len(), "video inlined");

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part {
                        text: Some(build_prompt(&opts.target_language)),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: video.mime_type.to_string(),
                            data: encoded,
                        }),
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
            }),
        };

        eprintln!("Analyzing video and generating insights…");
        // API key goes in a header so it never shows up in logged URLs.
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let hint = match status.as_u16() {
                400 | 401 | 403 => " (check the API key)",
                429 => " (rate limited or out of quota)",
                _ => "",
            };
            let api_msg = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(VidscribeError::Provider(format!(
                "Gemini HTTP {status}{hint}: {api_msg}"
            )));
        }

        let payload: GenerateContentResponse = serde_json::from_str(&body)?;

        if let Some(reason) = payload.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(VidscribeError::Provider(format!(
                "content blocked by Gemini safety filters: {reason}"
            )));
        }

        let text = payload
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.is_empty())
            .ok_or_else(|| VidscribeError::Provider("empty response from Gemini".to_string()))?;

        Ok(AnalysisResult::from_response_text(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PLACEHOLDER;
    use serde_json::json;

    fn dummy_video() -> VideoSource {
        VideoSource {
            file_name: "clip.mp4".to_string(),
            mime_type: "video/mp4",
            bytes: vec![0u8; 16],
        }
    }

    fn candidate_body(text: &str) -> String {
        json!({
            "candidates": [
                { "content": { "role": "model", "parts": [ { "text": text } ] } }
            ]
        })
        .to_string()
    }

    const MODEL_PATH: &str = "/models/gemini-2.5-flash:generateContent";

    #[tokio::test]
    async fn structured_response_is_parsed() {
        let mut server = mockito::Server::new_async().await;
        let inner = json!({
            "transcription": "hello there",
            "translation": "ওহে",
            "summary": "a greeting"
        })
        .to_string();
        let mock = server
            .mock("POST", MODEL_PATH)
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(candidate_body(&inner))
            .create_async()
            .await;

        let analyzer = GeminiAnalyzer::with_base_url("test-key".into(), None, server.url());
        let result = analyzer
            .analyze(&dummy_video(), &AnalyzeOptions::default())
            .await
            .expect("analysis should succeed");

        assert_eq!(result.transcription, "hello there");
        assert_eq!(result.translation, "ওহে");
        assert_eq!(result.summary, "a greeting");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn labeled_free_text_falls_back_to_label_parse() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_body(candidate_body(
                "1. Transcription:\nhi\n\n2. Translation:\nsalut\n\n3. Summary:\na greeting",
            ))
            .create_async()
            .await;

        let analyzer = GeminiAnalyzer::with_base_url("test-key".into(), None, server.url());
        let result = analyzer
            .analyze(&dummy_video(), &AnalyzeOptions::default())
            .await
            .unwrap();

        assert_eq!(result.transcription, "hi");
        assert_eq!(result.translation, "salut");
        assert_eq!(result.summary, "a greeting");
    }

    #[tokio::test]
    async fn unlabeled_prose_degrades_to_placeholders() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_body(candidate_body("the model rambled instead"))
            .create_async()
            .await;

        let analyzer = GeminiAnalyzer::with_base_url("test-key".into(), None, server.url());
        let result = analyzer
            .analyze(&dummy_video(), &AnalyzeOptions::default())
            .await
            .unwrap();

        assert_eq!(result.transcription, PLACEHOLDER);
        assert_eq!(result.translation, PLACEHOLDER);
        assert_eq!(result.summary, PLACEHOLDER);
    }

    #[tokio::test]
    async fn auth_error_surfaces_api_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", MODEL_PATH)
            .with_status(401)
            .with_body(r#"{"error":{"message":"API key not valid","status":"UNAUTHENTICATED"}}"#)
            .create_async()
            .await;

        let analyzer = GeminiAnalyzer::with_base_url("bad-key".into(), None, server.url());
        let err = analyzer
            .analyze(&dummy_video(), &AnalyzeOptions::default())
            .await
            .expect_err("should fail on 401");

        let msg = err.to_string();
        assert!(msg.contains("401"), "expected status in: {msg}");
        assert!(msg.contains("API key not valid"), "expected API message in: {msg}");
    }

    #[tokio::test]
    async fn safety_block_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let analyzer = GeminiAnalyzer::with_base_url("test-key".into(), None, server.url());
        let err = analyzer
            .analyze(&dummy_video(), &AnalyzeOptions::default())
            .await
            .expect_err("blocked content should not yield a result");

        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn empty_candidates_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let analyzer = GeminiAnalyzer::with_base_url("test-key".into(), None, server.url());
        let err = analyzer
            .analyze(&dummy_video(), &AnalyzeOptions::default())
            .await
            .expect_err("no candidates should be an error");

        assert!(err.to_string().contains("empty response"));
    }
}
