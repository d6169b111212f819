use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing_subscriber::{EnvFilter, fmt};

/// `RUST_LOG` wins; otherwise everything at `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

pub async fn ensure_work_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create work dir {}", dir.display()))?;
        tracing::info!(path = %dir.display(), "Created work directory");
    }
    Ok(())
}

pub async fn check_ffmpeg() -> bool {
    match tokio::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
