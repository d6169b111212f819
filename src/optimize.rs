use anyhow::{Context, Result};
use clap::Parser;
use manga_shorts::api::youtube::YouTubeClient;
use manga_shorts::channel::optimize_channel;
use manga_shorts::config::YouTubeCredentials;
use manga_shorts::init;
use tracing::{info, warn};

/// Rewrite channel description and keywords from recent search traffic.
#[derive(Parser, Debug)]
#[command(name = "channel-optimizer", version)]
struct Cli {
    /// Print the new branding instead of updating the channel.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init::init_logging();
    let cli = Cli::parse();

    let creds = match YouTubeCredentials::from_env() {
        Ok(creds) => creds,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "Nothing to do without YouTube credentials");
            return Ok(());
        }
    };

    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let youtube = YouTubeClient::new(client, creds);

    let today = chrono::Local::now().date_naive();
    let branding = optimize_channel(&youtube, today, cli.dry_run).await?;

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&branding.settings)?);
    }
    info!(channel = %branding.id, "Channel optimizer finished");
    Ok(())
}
