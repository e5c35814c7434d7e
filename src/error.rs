use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidscribeError {
    #[error("Unsupported video format \"{0}\" (expected mp4, mov, webm, or mkv)")]
    UnsupportedFormat(String),

    #[error("Video is {actual_mb:.2} MB; the limit is {limit_mb} MB")]
    VideoTooLarge { actual_mb: f64, limit_mb: u64 },

    #[error("API key not found: pass --api-key or set {env_var}")]
    MissingApiKey { env_var: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    OpenAi(#[from] async_openai::error::OpenAIError),
}

pub type Result<T> = std::result::Result<T, VidscribeError>;
