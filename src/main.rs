use anyhow::{Context, Result};
use clap::Parser;
use manga_shorts::api::elevenlabs::ElevenLabsNarrator;
use manga_shorts::api::youtube::YouTubeClient;
use manga_shorts::config::{Config, YouTubeCredentials};
use manga_shorts::downstream::Publisher;
use manga_shorts::fetch::HttpFetcher;
use manga_shorts::ffmpeg::FfmpegComposer;
use manga_shorts::init;
use manga_shorts::pipeline::{Pipeline, PipelineSettings, RunOutcome};
use std::path::PathBuf;
use tracing::{info, warn};

/// Scrape today's trending manga, record it, and publish a narrated short.
#[derive(Parser, Debug)]
#[command(name = "manga-shorts", version)]
struct Cli {
    /// JSON config file; defaults are used when it does not exist.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Listing page to scrape instead of `target_url`.
    #[arg(long)]
    target_url: Option<String>,

    /// Ledger file instead of `ledger_path`.
    #[arg(long)]
    ledger: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init::init_logging();
    let cli = Cli::parse();

    let mut cfg = Config::load_or_default(&cli.config).await?;
    if let Some(url) = cli.target_url {
        cfg.target_url = url;
    }
    if let Some(ledger) = cli.ledger {
        cfg.ledger_path = ledger;
    }

    init::ensure_work_dir(&cfg.work_dir).await?;
    if !init::check_ffmpeg().await {
        warn!("FFmpeg not found in PATH. Please install FFmpeg.");
    }

    let fetcher = HttpFetcher::new(&cfg.user_agent)?;
    let api_client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let narrator = ElevenLabsNarrator::new(api_client.clone(), &cfg.elevenlabs_key, &cfg.eleven_model_id);
    let composer = FfmpegComposer;

    let youtube = match YouTubeCredentials::from_env() {
        Ok(creds) => Some(YouTubeClient::new(api_client, creds)),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "Publishing disabled");
            None
        }
    };

    let pipeline = Pipeline::new(
        PipelineSettings::from(&cfg),
        &fetcher,
        &narrator,
        &composer,
        youtube.as_ref().map(|yt| yt as &dyn Publisher),
    );

    match pipeline.run().await? {
        RunOutcome::Aborted(err) => info!(error = %err, "No candidate this run"),
        RunOutcome::AlreadyPublished { title } => info!(%title, "Nothing new"),
        RunOutcome::Completed(done) => {
            for failure in &done.failures {
                warn!(stage = %failure.stage, cause = %format!("{:#}", failure.cause()), "Stage failed");
            }
            info!(
                title = %done.record.title,
                video_id = done.video_id.as_deref().unwrap_or("-"),
                commented = done.commented,
                failures = done.failures.len(),
                "Run complete"
            );
        }
    }

    Ok(())
}
