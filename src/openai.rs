use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    AudioInput, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    CreateTranscriptionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::analysis::AnalysisResult;
use crate::error::{Result, VidscribeError};
use crate::provider::{AnalyzeOptions, VideoAnalyzer};
use crate::source::VideoSource;

const TRANSCRIPTION_MODEL: &str = "whisper-1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
const STAGE_TIMEOUT: Duration = Duration::from_secs(300);

/// Three-call pipeline adapter: Whisper transcription, then a chat call to
/// translate, then a chat call to summarize. Each stage feeds the next; a
/// stage failure aborts the rest and discards partial results.
pub struct OpenAiAnalyzer {
    client: Client<OpenAIConfig>,
    chat_model: String,
}

impl OpenAiAnalyzer {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self::with_config(OpenAIConfig::new().with_api_key(api_key), model)
    }

    /// Create against a custom API base (for tests / mock servers).
    pub fn with_api_base(api_key: String, model: Option<String>, api_base: String) -> Self {
        Self::with_config(
            OpenAIConfig::new().with_api_key(api_key).with_api_base(api_base),
            model,
        )
    }

    fn with_config(config: OpenAIConfig, model: Option<String>) -> Self {
        Self {
            client: Client::with_config(config),
            chat_model: model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.into()),
        }
    }

    async fn transcribe(&self, video: &VideoSource) -> Result<String> {
        // Whisper accepts the video container directly; the bytes go up
        // in-memory, so no temporary file is written.
        let request = CreateTranscriptionRequestArgs::default()
            .model(TRANSCRIPTION_MODEL)
            .file(AudioInput::from_vec_u8(
                video.file_name.clone(),
                video.bytes.clone(),
            ))
            .language("en")
            .build()?;

        let response = timeout_stage("transcription", self.client.audio().transcribe(request)).await?;
        Ok(response.text)
    }

    async fn chat(&self, system: String, user: String) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.chat_model.as_str())
            .max_tokens(2048_u32)
            .messages([
                ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(system)
                        .build()?,
                ),
                ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(user)
                        .build()?,
                ),
            ])
            .build()?;

        let response = timeout_stage("chat", self.client.chat().create(request)).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| VidscribeError::Provider("empty choices in chat response".to_string()))?;
        choice
            .message
            .content
            .ok_or_else(|| VidscribeError::Provider("no content in chat response".to_string()))
    }
}

async fn timeout_stage<T, E, F>(stage: &str, fut: F) -> Result<T>
where
    F: std::future::Future<Output = std::result::Result<T, E>>,
    VidscribeError: From<E>,
{
    tokio::time::timeout(STAGE_TIMEOUT, fut)
        .await
        .map_err(|_| VidscribeError::Provider(format!("{stage} request timed out")))?
        .map_err(VidscribeError::from)
}

#[async_trait]
impl VideoAnalyzer for OpenAiAnalyzer {
    fn name(&self) -> &str {
        "openai"
    }

    async fn analyze(&self, video: &VideoSource, opts: &AnalyzeOptions) -> Result<AnalysisResult> {
        let lang = &opts.target_language;

        eprintln!("Step 1/3: Transcribing audio with Whisper…");
        let transcription = self.transcribe(video).await?;
        tracing::debug!(chars = transcription.len(), "transcription complete");

        eprintln!("Step 2/3: Translating to {lang}…");
        let translation = self
            .chat(
                format!(
                    "You are a professional translator. Translate the given English text \
                     into simple, easy-to-understand {lang}. Reply with only the translated \
                     {lang} text."
                ),
                transcription.clone(),
            )
            .await?;

        eprintln!("Step 3/3: Summarizing and explaining the meaning…");
        let summary = self
            .chat(
                format!(
                    "Based on the given {lang} text, provide a detailed summary and explain \
                     its core meaning, in {lang}."
                ),
                translation.clone(),
            )
            .await?;

        Ok(AnalysisResult {
            transcription,
            translation,
            summary,
        })
    }
}
