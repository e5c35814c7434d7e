use async_trait::async_trait;
use clap::ValueEnum;

use crate::analysis::AnalysisResult;
use crate::error::{Result, VidscribeError};
use crate::gemini::GeminiAnalyzer;
use crate::openai::OpenAiAnalyzer;
use crate::source::VideoSource;

/// Per-run knobs shared by both adapters.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Language for the translation and summary sections.
    pub target_language: String,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            target_language: "Bengali".to_string(),
        }
    }
}

#[async_trait]
pub trait VideoAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    /// Produce the three-part analysis for one video. A failure discards any
    /// partial results.
    async fn analyze(&self, video: &VideoSource, opts: &AnalyzeOptions) -> Result<AnalysisResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// Google Gemini: one multimodal call (faster)
    Gemini,
    /// OpenAI: Whisper transcription plus chat translation and summary
    /// (more detailed)
    #[value(name = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Resolve the credential before any network call: an explicit (non-empty)
/// flag wins, then the provider's environment variable.
pub fn resolve_api_key(kind: ProviderKind, flag: Option<String>) -> Result<String> {
    resolve_from(flag, kind.api_key_env())
}

fn resolve_from(flag: Option<String>, env_var: &str) -> Result<String> {
    if let Some(key) = flag {
        if !key.is_empty() {
            return Ok(key);
        }
    }
    match std::env::var(env_var) {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(VidscribeError::MissingApiKey {
            env_var: env_var.to_string(),
        }),
    }
}

pub fn create_analyzer(
    kind: ProviderKind,
    api_key: String,
    model: Option<String>,
) -> Box<dyn VideoAnalyzer> {
    match kind {
        ProviderKind::Gemini => Box::new(GeminiAnalyzer::new(api_key, model)),
        ProviderKind::OpenAi => Box::new(OpenAiAnalyzer::new(api_key, model)),
    }
}
