mod analysis;
mod error;
mod gemini;
mod openai;
mod provider;
mod source;

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use provider::{AnalyzeOptions, ProviderKind};

#[derive(Parser)]
#[command(name = "vidscribe")]
#[command(
    about = "Transcribe, translate, and summarize a video with a hosted AI provider",
    long_about = None
)]
struct Cli {
    /// Video file to analyze (mp4, mov, webm, or mkv; up to 200 MB)
    input_file: PathBuf,

    /// AI provider to use
    #[arg(short, long, value_enum, default_value = "gemini")]
    provider: ProviderKind,

    /// API key (falls back to GEMINI_API_KEY / OPENAI_API_KEY, after .env)
    #[arg(long)]
    api_key: Option<String>,

    /// Language for the translation and summary
    #[arg(short, long, default_value = "Bengali")]
    target_language: String,

    /// Model override (provider-specific)
    #[arg(long)]
    model: Option<String>,

    /// Write the combined results to this text file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the result as JSON instead of text panels
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let video = source::load(&cli.input_file)?;
    eprintln!("File: {} ({:.2} MB)", video.file_name, video.size_mb());

    let api_key = provider::resolve_api_key(cli.provider, cli.api_key.clone())?;
    let analyzer = provider::create_analyzer(cli.provider, api_key, cli.model.clone());
    tracing::debug!(provider = analyzer.name(), "analyzer selected");

    let opts = AnalyzeOptions {
        target_language: cli.target_language.clone(),
    };
    let result = analyzer.analyze(&video, &opts).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("1. Transcription\n{}\n", result.transcription);
        println!("2. Translation ({})\n{}\n", cli.target_language, result.translation);
        println!("3. Summary & Meaning\n{}", result.summary);
    }

    if let Some(path) = &cli.output {
        fs::write(path, result.combined_export())?;
        eprintln!("Saved results to {}", path.display());
    }

    Ok(())
}
