use anyhow::Result;
use async_trait::async_trait;
use manga_shorts::downstream::{Composer, Narrator, Publisher};
use manga_shorts::error::{NetworkError, ScrapeError, Stage};
use manga_shorts::extract::FALLBACK_DESCRIPTION;
use manga_shorts::fetch::PageFetcher;
use manga_shorts::ledger::JsonLedger;
use manga_shorts::metadata::VideoMetadata;
use manga_shorts::pipeline::{Pipeline, PipelineSettings, RunOutcome};
use manga_shorts::record::CandidateRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

const LISTING_URL: &str = "https://asura.test/";
const DETAIL_URL: &str = "https://asura.test/series/solo-max-level-newbie";
const COVER_URL: &str = "https://x/cover.png";
const TITLE: &str = "Solo Max-Level Newbie";

#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FakeSite {
    fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    fn file(mut self, url: &str, bytes: &[u8]) -> Self {
        self.files.insert(url.to_string(), bytes.to_vec());
        self
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch_text(&self, url: &str) -> Result<String, NetworkError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or(NetworkError::Status {
            url: url.to_string(),
            status: 404,
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.files.get(url).cloned().ok_or(NetworkError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

#[derive(Default)]
struct FakeNarrator {
    fail: bool,
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Narrator for FakeNarrator {
    async fn narrate(&self, text: &str, voice: &str, out_audio: &Path) -> Result<()> {
        self.calls.lock().unwrap().push((text.to_string(), voice.to_string()));
        if self.fail {
            anyhow::bail!("TTS quota exceeded");
        }
        tokio::fs::write(out_audio, b"mp3").await?;
        Ok(())
    }
}

#[derive(Default)]
struct FakeComposer {
    calls: Mutex<usize>,
}

#[async_trait]
impl Composer for FakeComposer {
    async fn compose(&self, image: &Path, audio: &Path, out_video: &Path) -> Result<()> {
        *self.calls.lock().unwrap() += 1;
        assert!(image.exists(), "cover must be downloaded before composing");
        assert!(audio.exists(), "narration must exist before composing");
        tokio::fs::write(out_video, b"mp4").await?;
        Ok(())
    }
}

#[derive(Default)]
struct FakePublisher {
    fail_upload: bool,
    fail_comment: bool,
    uploads: Mutex<Vec<VideoMetadata>>,
    comments: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn upload(&self, video: &Path, meta: &VideoMetadata) -> Result<String> {
        assert!(video.exists());
        self.uploads.lock().unwrap().push(meta.clone());
        if self.fail_upload {
            anyhow::bail!("quotaExceeded");
        }
        Ok("vid-001".to_string())
    }

    async fn comment(&self, video_id: &str, text: &str) -> Result<()> {
        self.comments
            .lock()
            .unwrap()
            .push((video_id.to_string(), text.to_string()));
        if self.fail_comment {
            anyhow::bail!("commentsDisabled");
        }
        Ok(())
    }
}

fn listing(block_class: &str) -> String {
    format!(
        r#"<html><body>
            <div class="{block_class}">
                <a href="/series/solo-max-level-newbie" title="{TITLE}"><img src="/t.png"></a>
            </div>
        </body></html>"#
    )
}

/// 400 characters of words separated by mixed whitespace runs.
fn messy_synopsis() -> String {
    let gaps = ["  ", "\n\t", " \r\n ", "\t"];
    let mut text = String::new();
    let mut i = 0;
    while text.len() < 400 {
        text.push_str("Hunter");
        text.push_str(gaps[i % gaps.len()]);
        i += 1;
    }
    text.truncate(400);
    text
}

fn detail(synopsis: Option<&str>) -> String {
    let synopsis = synopsis
        .map(|s| format!(r#"<div class="entry-content"><p>{s}</p></div>"#))
        .unwrap_or_default();
    format!(r#"<html><body><div class="thumb"><img src="{COVER_URL}"></div>{synopsis}</body></html>"#)
}

fn site(block_class: &str, synopsis: Option<&str>) -> FakeSite {
    FakeSite::default()
        .page(LISTING_URL, listing(block_class))
        .page(DETAIL_URL, detail(synopsis))
        .file(COVER_URL, b"\x89PNG")
}

fn settings(dir: &TempDir) -> PipelineSettings {
    PipelineSettings {
        target_url: LISTING_URL.to_string(),
        website_url: "https://me.github.io/manga-empire/".to_string(),
        ledger_path: dir.path().join("database.json"),
        voice: "JBFqnCBsd6RMkjVDRZzb".to_string(),
        description_max_chars: 250,
        cover_path: dir.path().join("cover.jpg"),
        narration_path: dir.path().join("voice.mp3"),
        video_path: dir.path().join("short.mp4"),
    }
}

fn ledger_path(dir: &TempDir) -> PathBuf {
    dir.path().join("database.json")
}

#[tokio::test]
async fn first_run_publishes_and_second_run_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let synopsis = messy_synopsis();
    let site = site("bsl", Some(&synopsis));
    let narrator = FakeNarrator::default();
    let composer = FakeComposer::default();
    let publisher = FakePublisher::default();
    let pipeline = Pipeline::new(settings(&dir), &site, &narrator, &composer, Some(&publisher));

    let first = pipeline.run().await.unwrap();
    let RunOutcome::Completed(done) = first else {
        panic!("expected completion, got {first:?}");
    };
    let expected_description: String = "Hunter ".repeat(60).chars().take(250).collect();
    assert_eq!(
        done.record,
        CandidateRecord {
            title: TITLE.to_string(),
            link: DETAIL_URL.to_string(),
            image: COVER_URL.to_string(),
            description: expected_description,
        }
    );
    assert_eq!(done.video_id.as_deref(), Some("vid-001"));
    assert!(done.commented);
    assert!(done.failures.is_empty());

    let ledger = JsonLedger::load(ledger_path(&dir)).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.records()[0], done.record);

    let uploads = publisher.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].title, "Solo Max-Level Newbie is S-RANK Material 🤯 #shorts");
    assert_eq!(
        publisher.comments.lock().unwrap()[0],
        (
            "vid-001".to_string(),
            "🔥 Read Solo Max-Level Newbie here: https://me.github.io/manga-empire/".to_string()
        )
    );
    let narrated = narrator.calls.lock().unwrap()[0].clone();
    assert!(narrated.0.contains("read Solo Max-Level Newbie."));
    assert_eq!(narrated.1, "JBFqnCBsd6RMkjVDRZzb");

    let before = std::fs::read(ledger_path(&dir)).unwrap();
    let second = pipeline.run().await.unwrap();
    assert!(matches!(second, RunOutcome::AlreadyPublished { ref title } if title == TITLE));
    assert_eq!(std::fs::read(ledger_path(&dir)).unwrap(), before);
    assert_eq!(narrator.calls.lock().unwrap().len(), 1);
    assert_eq!(*composer.calls.lock().unwrap(), 1);
    assert_eq!(publisher.uploads.lock().unwrap().len(), 1);
    assert_eq!(publisher.comments.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn known_title_in_existing_ledger_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = JsonLedger::load(ledger_path(&dir)).await.unwrap();
    ledger
        .prepend_and_persist(CandidateRecord {
            title: TITLE.to_string(),
            link: "https://old.test/".to_string(),
            image: "https://old.test/c.png".to_string(),
            description: "from last week".to_string(),
        })
        .await
        .unwrap();
    let before = std::fs::read(ledger_path(&dir)).unwrap();

    let site = site("bsl", Some("New synopsis"));
    let narrator = FakeNarrator::default();
    let composer = FakeComposer::default();
    let publisher = FakePublisher::default();
    let outcome = Pipeline::new(settings(&dir), &site, &narrator, &composer, Some(&publisher))
        .run()
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::AlreadyPublished { .. }));
    assert_eq!(std::fs::read(ledger_path(&dir)).unwrap(), before);
    assert!(narrator.calls.lock().unwrap().is_empty());
    assert_eq!(*composer.calls.lock().unwrap(), 0);
    assert!(publisher.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn secondary_marker_yields_same_record() {
    let primary_dir = tempfile::tempdir().unwrap();
    let secondary_dir = tempfile::tempdir().unwrap();
    let narrator = FakeNarrator::default();
    let composer = FakeComposer::default();
    let publisher = FakePublisher::default();

    let primary_site = site("bsl", Some("Same synopsis"));
    let secondary_site = site("uta", Some("Same synopsis"));
    let primary = Pipeline::new(settings(&primary_dir), &primary_site, &narrator, &composer, Some(&publisher))
        .run()
        .await
        .unwrap();
    let secondary = Pipeline::new(settings(&secondary_dir), &secondary_site, &narrator, &composer, Some(&publisher))
        .run()
        .await
        .unwrap();

    match (primary, secondary) {
        (RunOutcome::Completed(a), RunOutcome::Completed(b)) => assert_eq!(a.record, b.record),
        other => panic!("both runs should complete: {other:?}"),
    }
}

#[tokio::test]
async fn missing_synopsis_uses_fallback_description() {
    let dir = tempfile::tempdir().unwrap();
    let site = site("bsl", None);
    let narrator = FakeNarrator::default();
    let composer = FakeComposer::default();
    let publisher = FakePublisher::default();

    let outcome = Pipeline::new(settings(&dir), &site, &narrator, &composer, Some(&publisher))
        .run()
        .await
        .unwrap();
    let RunOutcome::Completed(done) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(done.record.description, FALLBACK_DESCRIPTION);
}

#[tokio::test]
async fn unreachable_listing_aborts_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let site = FakeSite::default();
    let narrator = FakeNarrator::default();
    let composer = FakeComposer::default();

    let outcome = Pipeline::new(settings(&dir), &site, &narrator, &composer, None)
        .run()
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::Aborted(ScrapeError::Network(NetworkError::Status { status: 404, .. }))
    ));
    assert!(!ledger_path(&dir).exists());
}

#[tokio::test]
async fn listing_without_card_aborts_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let site = FakeSite::default().page(LISTING_URL, "<html><body><p>Down for maintenance</p></body></html>");
    let narrator = FakeNarrator::default();
    let composer = FakeComposer::default();

    let outcome = Pipeline::new(settings(&dir), &site, &narrator, &composer, None)
        .run()
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Aborted(ScrapeError::Extraction(_))));
    assert!(!ledger_path(&dir).exists());
    assert_eq!(site.requests.lock().unwrap().as_slice(), [LISTING_URL]);
}

#[tokio::test]
async fn failed_upload_keeps_ledger_entry_and_skips_comment() {
    let dir = tempfile::tempdir().unwrap();
    let site = site("bsl", Some("Synopsis"));
    let narrator = FakeNarrator::default();
    let composer = FakeComposer::default();
    let publisher = FakePublisher {
        fail_upload: true,
        ..Default::default()
    };

    let outcome = Pipeline::new(settings(&dir), &site, &narrator, &composer, Some(&publisher))
        .run()
        .await
        .unwrap();
    let RunOutcome::Completed(done) = outcome else {
        panic!("expected completion");
    };

    assert!(done.video_id.is_none());
    assert_eq!(done.failures.len(), 1);
    assert_eq!(done.failures[0].stage, Stage::Publish);
    assert!(publisher.comments.lock().unwrap().is_empty());

    let ledger = JsonLedger::load(ledger_path(&dir)).await.unwrap();
    assert!(ledger.contains(TITLE));
}

#[tokio::test]
async fn failed_narration_stops_composition_and_publication() {
    let dir = tempfile::tempdir().unwrap();
    let site = site("bsl", Some("Synopsis"));
    let narrator = FakeNarrator {
        fail: true,
        ..Default::default()
    };
    let composer = FakeComposer::default();
    let publisher = FakePublisher::default();

    let outcome = Pipeline::new(settings(&dir), &site, &narrator, &composer, Some(&publisher))
        .run()
        .await
        .unwrap();
    let RunOutcome::Completed(done) = outcome else {
        panic!("expected completion");
    };

    assert_eq!(done.failures.len(), 1);
    assert_eq!(done.failures[0].stage, Stage::Narrate);
    assert_eq!(*composer.calls.lock().unwrap(), 0);
    assert!(publisher.uploads.lock().unwrap().is_empty());
    assert!(JsonLedger::load(ledger_path(&dir)).await.unwrap().contains(TITLE));
}

#[tokio::test]
async fn missing_cover_is_a_composition_failure() {
    let dir = tempfile::tempdir().unwrap();
    let site = FakeSite::default()
        .page(LISTING_URL, listing("bsl"))
        .page(DETAIL_URL, detail(Some("Synopsis")));
    let narrator = FakeNarrator::default();
    let composer = FakeComposer::default();
    let publisher = FakePublisher::default();

    let outcome = Pipeline::new(settings(&dir), &site, &narrator, &composer, Some(&publisher))
        .run()
        .await
        .unwrap();
    let RunOutcome::Completed(done) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(done.failures[0].stage, Stage::Compose);
    assert!(narrator.calls.lock().unwrap().is_empty());
    assert!(publisher.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn without_publisher_the_video_is_still_rendered() {
    let dir = tempfile::tempdir().unwrap();
    let site = site("bsl", Some("Synopsis"));
    let narrator = FakeNarrator::default();
    let composer = FakeComposer::default();

    let outcome = Pipeline::new(settings(&dir), &site, &narrator, &composer, None)
        .run()
        .await
        .unwrap();
    let RunOutcome::Completed(done) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(*composer.calls.lock().unwrap(), 1);
    assert!(dir.path().join("short.mp4").exists());
    assert_eq!(done.failures.len(), 1);
    assert_eq!(done.failures[0].stage, Stage::Publish);
}

#[tokio::test]
async fn failed_comment_is_reported_after_upload() {
    let dir = tempfile::tempdir().unwrap();
    let site = site("bsl", Some("Synopsis"));
    let narrator = FakeNarrator::default();
    let composer = FakeComposer::default();
    let publisher = FakePublisher {
        fail_comment: true,
        ..Default::default()
    };

    let outcome = Pipeline::new(settings(&dir), &site, &narrator, &composer, Some(&publisher))
        .run()
        .await
        .unwrap();
    let RunOutcome::Completed(done) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(done.video_id.as_deref(), Some("vid-001"));
    assert!(!done.commented);
    assert_eq!(done.failures.len(), 1);
    assert_eq!(done.failures[0].stage, Stage::Comment);
}
