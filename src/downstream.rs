use crate::metadata::VideoMetadata;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Text-to-speech: writes an audio file for `text` spoken by `voice`.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, text: &str, voice: &str, out_audio: &Path) -> Result<()>;
}

/// Renders a still image plus narration into a vertical video.
#[async_trait]
pub trait Composer: Send + Sync {
    async fn compose(&self, image: &Path, audio: &Path, out_video: &Path) -> Result<()>;
}

/// Video host. Both calls are best-effort.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the platform's id for the new video.
    async fn upload(&self, video: &Path, meta: &VideoMetadata) -> Result<String>;

    async fn comment(&self, video_id: &str, text: &str) -> Result<()>;
}
