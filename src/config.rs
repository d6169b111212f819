use crate::fetch::DEFAULT_USER_AGENT;
use crate::sanitize::DESCRIPTION_MAX_CHARS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const YOUTUBE_TOKEN_ENV: &str = "YOUTUBE_TOKEN_JSON";
pub const ELEVENLABS_KEY_ENV: &str = "ELEVENLABS_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target_url: String,
    pub website_url: String,
    pub ledger_path: PathBuf,
    /// Holds `cover.jpg`, `voice.mp3` and `short.mp4`.
    pub work_dir: PathBuf,
    pub user_agent: String,
    pub description_max_chars: usize,
    #[serde(rename = "elevenlabs_api_key")]
    pub elevenlabs_key: String,
    pub eleven_voice_id: String,
    pub eleven_model_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "https://asuracomic.net/".to_string(),
            website_url: "https://YOUR_USERNAME.github.io/manga-empire/".to_string(),
            ledger_path: PathBuf::from("database.json"),
            work_dir: PathBuf::from("."),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            description_max_chars: DESCRIPTION_MAX_CHARS,
            elevenlabs_key: String::new(),
            eleven_voice_id: default_voice_id(),
            eleven_model_id: default_model_id(),
        }
    }
}

fn default_voice_id() -> String {
    "JBFqnCBsd6RMkjVDRZzb".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let mut config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file means defaults.
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if fs::metadata(&path).await.is_ok() {
            return Self::load(path).await;
        }
        tracing::warn!(path = %path.as_ref().display(), "Config file not found; using defaults");
        let mut config = Config::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if self.elevenlabs_key.is_empty() {
            if let Ok(key) = std::env::var(ELEVENLABS_KEY_ENV) {
                self.elevenlabs_key = key;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.target_url.trim().is_empty() {
            anyhow::bail!("config: target_url missing");
        }
        url::Url::parse(&self.target_url)
            .with_context(|| format!("config: target_url is not a URL: {}", self.target_url))?;
        if self.description_max_chars == 0 {
            anyhow::bail!("config: description_max_chars must be positive");
        }
        Ok(())
    }

    pub fn cover_path(&self) -> PathBuf {
        self.work_dir.join("cover.jpg")
    }

    pub fn narration_path(&self) -> PathBuf {
        self.work_dir.join("voice.mp3")
    }

    pub fn video_path(&self) -> PathBuf {
        self.work_dir.join("short.mp4")
    }
}

/// OAuth "authorized user" blob for the YouTube APIs.
#[derive(Clone, Deserialize)]
pub struct YouTubeCredentials {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for YouTubeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeCredentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl YouTubeCredentials {
    pub fn from_json(text: &str) -> Result<Self> {
        let creds: YouTubeCredentials =
            serde_json::from_str(text).context("Failed to parse YouTube token JSON")?;
        if creds.token.is_none() && !creds.can_refresh() {
            anyhow::bail!("YouTube token JSON has neither an access token nor refresh credentials");
        }
        Ok(creds)
    }

    /// Reads `YOUTUBE_TOKEN_JSON`.
    pub fn from_env() -> Result<Self> {
        let text = std::env::var(YOUTUBE_TOKEN_ENV)
            .with_context(|| format!("No token found in {}", YOUTUBE_TOKEN_ENV))?;
        Self::from_json(&text)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }
}
