use crate::downstream::Composer;
use crate::{logi, logw};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

pub const SHORT_WIDTH: u32 = 1080;
pub const SHORT_HEIGHT: u32 = 1920;
pub const SHORT_FPS: u32 = 24;
/// Extra second of picture after the narration ends.
const TAIL_SECONDS: f64 = 1.0;
/// Zoom growth per output frame, capped at [`MAX_ZOOM`].
const ZOOM_PER_FRAME: f64 = 0.0015;
const MAX_ZOOM: f64 = 1.5;

/// Runs a tool to completion, surfacing the tail of its stderr on failure.
async fn run_cmd(args: &[String]) -> Result<()> {
    let Some((program, rest)) = args.split_first() else {
        anyhow::bail!("Empty command line");
    };

    let output = Command::new(program)
        .args(rest)
        .output()
        .await
        .with_context(|| format!("Could not start {program}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
        anyhow::bail!(
            "{program} exited with {}: {}",
            output.status,
            tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
        );
    }
    Ok(())
}

/// Length of the narration track in seconds.
pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-show_entries", "format=duration"])
        .args(["-of", "csv=p=0"])
        .arg(path)
        .output()
        .await
        .context("Could not start ffprobe")?;

    if !output.status.success() {
        anyhow::bail!("ffprobe could not read {}", path.display());
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs > 0.1 => Ok(secs),
        _ => anyhow::bail!("{} has no usable duration ({:?})", path.display(), raw.trim()),
    }
}

/// Fill 1080x1920 (scale up, centre crop), then a slow centred zoom.
pub fn short_filter() -> String {
    format!(
        "[0:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},\
         zoompan=z='min(1+{step}*on,{max})':d=1:x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={w}x{h}:fps={fps},\
         format=yuv420p[v]",
        w = SHORT_WIDTH,
        h = SHORT_HEIGHT,
        step = ZOOM_PER_FRAME,
        max = MAX_ZOOM,
        fps = SHORT_FPS,
    )
}

pub fn render_short_args(image: &Path, audio: &Path, duration_s: f64, out_mp4: &Path) -> Vec<String> {
    let image = image.display().to_string();
    let audio = audio.display().to_string();
    let filter = short_filter();
    let duration = format!("{duration_s:.3}");
    let fps = SHORT_FPS.to_string();
    let out = out_mp4.display().to_string();

    [
        "ffmpeg",
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-loop",
        "1",
        "-i",
        image.as_str(),
        "-i",
        audio.as_str(),
        "-filter_complex",
        filter.as_str(),
        "-map",
        "[v]",
        "-map",
        "1:a",
        "-t",
        duration.as_str(),
        "-r",
        fps.as_str(),
        "-c:v",
        "libx264",
        "-preset",
        "veryfast",
        "-crf",
        "22",
        "-c:a",
        "aac",
        "-b:a",
        "192k",
        "-movflags",
        "+faststart",
        out.as_str(),
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

pub async fn ffmpeg_render_short(image: &Path, audio: &Path, out_mp4: &Path) -> Result<()> {
    let narration = ffprobe_duration_seconds(audio)
        .await
        .with_context(|| format!("Bad narration duration: {}", audio.display()))?;
    let total = narration + TAIL_SECONDS;

    logi(format!(
        "Rendering {}x{} short ({:.2}s) -> {}",
        SHORT_WIDTH,
        SHORT_HEIGHT,
        total,
        out_mp4.display()
    ));
    if let Err(err) = run_cmd(&render_short_args(image, audio, total, out_mp4)).await {
        logw(format!("Vertical render failed: {}", err));
        return Err(err);
    }

    if !out_mp4.exists() {
        anyhow::bail!("ffmpeg finished but {} is missing", out_mp4.display());
    }
    Ok(())
}

pub struct FfmpegComposer;

#[async_trait]
impl Composer for FfmpegComposer {
    async fn compose(&self, image: &Path, audio: &Path, out_video: &Path) -> Result<()> {
        ffmpeg_render_short(image, audio, out_video).await
    }
}
