use crate::downstream::Narrator;
use crate::logw;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tokio::fs;

const API_BASE: &str = "https://api.elevenlabs.io";

pub struct ElevenLabsNarrator {
    client: Client,
    api_key: String,
    model_id: String,
    base_url: String,
}

impl ElevenLabsNarrator {
    pub fn new(client: Client, api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model_id: model_id.into(),
            base_url: API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Narrator for ElevenLabsNarrator {
    async fn narrate(&self, text: &str, voice: &str, out_audio: &Path) -> Result<()> {
        if self.api_key.is_empty() {
            anyhow::bail!("elevenlabs_api_key missing");
        }

        let url = format!(
            "{}/v1/text-to-speech/{}?output_format=mp3_44100_128",
            self.base_url.trim_end_matches('/'),
            voice
        );

        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
        });

        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(300))
            .send()
            .await
            .context("ElevenLabs request failed")?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            logw(format!("ElevenLabs TTS failed HTTP {}", status));
            anyhow::bail!("ElevenLabs TTS failed HTTP {}", status);
        }

        let bytes = resp.bytes().await.context("ElevenLabs response read failed")?;
        if let Some(parent) = out_audio.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
        }
        fs::write(out_audio, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", out_audio.display()))?;

        Ok(())
    }
}
