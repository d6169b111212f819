use crate::config::Config;
use crate::downstream::{Composer, Narrator, Publisher};
use crate::error::{DownstreamError, PersistenceError, ScrapeError, Stage};
use crate::extract::extract_candidate;
use crate::fetch::PageFetcher;
use crate::init::ensure_work_dir;
use crate::ledger::JsonLedger;
use crate::metadata::{narration_script, pinned_comment, video_metadata};
use crate::record::CandidateRecord;
use crate::{loge, logi, logok, logw};
use anyhow::Context;
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub target_url: String,
    pub website_url: String,
    pub ledger_path: PathBuf,
    pub voice: String,
    pub description_max_chars: usize,
    pub cover_path: PathBuf,
    pub narration_path: PathBuf,
    pub video_path: PathBuf,
}

impl From<&Config> for PipelineSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            target_url: cfg.target_url.clone(),
            website_url: cfg.website_url.clone(),
            ledger_path: cfg.ledger_path.clone(),
            voice: cfg.eleven_voice_id.clone(),
            description_max_chars: cfg.description_max_chars,
            cover_path: cfg.cover_path(),
            narration_path: cfg.narration_path(),
            video_path: cfg.video_path(),
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// Fetch or extraction failed; nothing was written.
    Aborted(ScrapeError),
    AlreadyPublished { title: String },
    /// The candidate was recorded; downstream stages ran best-effort.
    Completed(Completion),
}

#[derive(Debug)]
pub struct Completion {
    pub record: CandidateRecord,
    pub video_id: Option<String>,
    pub commented: bool,
    pub failures: Vec<DownstreamError>,
}

pub struct Pipeline<'a> {
    settings: PipelineSettings,
    fetcher: &'a dyn PageFetcher,
    narrator: &'a dyn Narrator,
    composer: &'a dyn Composer,
    publisher: Option<&'a dyn Publisher>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: PipelineSettings,
        fetcher: &'a dyn PageFetcher,
        narrator: &'a dyn Narrator,
        composer: &'a dyn Composer,
        publisher: Option<&'a dyn Publisher>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            narrator,
            composer,
            publisher,
        }
    }

    /// Only ledger I/O errors escape; everything else ends up in the outcome.
    pub async fn run(&self) -> Result<RunOutcome, PersistenceError> {
        let target = &self.settings.target_url;

        logi(format!("Scraping {}...", target));
        let listing = match self.fetcher.fetch_text(target).await {
            Ok(html) => html,
            Err(err) => {
                loge(format!("Scrape Error: {}", err));
                return Ok(RunOutcome::Aborted(err.into()));
            }
        };

        let record = match extract_candidate(
            self.fetcher,
            &listing,
            target,
            self.settings.description_max_chars,
        )
        .await
        {
            Ok(record) => record,
            Err(err) => {
                loge(format!("Scrape Error: {}", err));
                return Ok(RunOutcome::Aborted(err));
            }
        };
        logok(format!("Found: {} ({})", record.title, record.link));

        let mut ledger = JsonLedger::load(&self.settings.ledger_path).await?;
        if ledger.contains(&record.title) {
            logw(format!("Already done today: {}", record.title));
            return Ok(RunOutcome::AlreadyPublished { title: record.title });
        }

        // Recorded before publishing; later failures never remove it.
        ledger.prepend_and_persist(record.clone()).await?;
        logok(format!(
            "Database Updated: {} ({} entries)",
            ledger.path().display(),
            ledger.len()
        ));

        let mut completion = Completion {
            record,
            video_id: None,
            commented: false,
            failures: Vec::new(),
        };

        if let Err(err) = self.compose(&completion.record).await {
            loge(err.to_string());
            completion.failures.push(err);
            return Ok(RunOutcome::Completed(completion));
        }

        let Some(publisher) = self.publisher else {
            let err = DownstreamError::new(
                Stage::Publish,
                anyhow::anyhow!("no YouTube credentials configured"),
            );
            loge(format!("Upload failed: {}", err));
            completion.failures.push(err);
            return Ok(RunOutcome::Completed(completion));
        };

        let meta = video_metadata(&completion.record, &self.settings.website_url);
        let video_id = match publisher.upload(&self.settings.video_path, &meta).await {
            Ok(id) => id,
            Err(cause) => {
                let err = DownstreamError::new(Stage::Publish, cause);
                loge(format!("Upload failed: {}", err));
                completion.failures.push(err);
                return Ok(RunOutcome::Completed(completion));
            }
        };
        completion.video_id = Some(video_id.clone());

        let comment = pinned_comment(&completion.record, &self.settings.website_url);
        match publisher.comment(&video_id, &comment).await {
            Ok(()) => {
                completion.commented = true;
                logok("Comment Posted.".to_string());
            }
            Err(cause) => {
                let err = DownstreamError::new(Stage::Comment, cause);
                logw(format!("Comment Error: {}", err));
                completion.failures.push(err);
            }
        }

        Ok(RunOutcome::Completed(completion))
    }

    /// Cover download, narration, render. The first failure stops the rest.
    async fn compose(&self, record: &CandidateRecord) -> Result<(), DownstreamError> {
        let s = &self.settings;
        logi("Generating Video...".to_string());

        if let Some(dir) = s.video_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_work_dir(dir)
                .await
                .map_err(|e| DownstreamError::new(Stage::Compose, e))?;
        }

        let cover = self
            .fetcher
            .fetch_bytes(&record.image)
            .await
            .context("Cover download failed")
            .map_err(|e| DownstreamError::new(Stage::Compose, e))?;
        fs::write(&s.cover_path, &cover)
            .await
            .with_context(|| format!("Failed to write {}", s.cover_path.display()))
            .map_err(|e| DownstreamError::new(Stage::Compose, e))?;

        let script = narration_script(record);
        self.narrator
            .narrate(&script, &s.voice, &s.narration_path)
            .await
            .map_err(|e| DownstreamError::new(Stage::Narrate, e))?;

        self.composer
            .compose(&s.cover_path, &s.narration_path, &s.video_path)
            .await
            .map_err(|e| DownstreamError::new(Stage::Compose, e))?;

        logok(format!("Video Ready: {}", s.video_path.display()));
        Ok(())
    }
}
