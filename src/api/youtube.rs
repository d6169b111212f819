use crate::channel::{BrandingSettings, ChannelApi, ChannelBranding};
use crate::config::YouTubeCredentials;
use crate::downstream::Publisher;
use crate::metadata::{VIDEO_CATEGORY_ID, VideoMetadata};
use crate::{logi, logok};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tokio::fs;
use tokio::sync::OnceCell;

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub data: String,
    pub upload: String,
    pub analytics: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            data: "https://www.googleapis.com/youtube/v3".to_string(),
            upload: "https://www.googleapis.com/upload/youtube/v3".to_string(),
            analytics: "https://youtubeanalytics.googleapis.com/v2".to_string(),
        }
    }
}

pub struct YouTubeClient {
    client: Client,
    credentials: Option<YouTubeCredentials>,
    access_token: OnceCell<String>,
    endpoints: Endpoints,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Deserialize)]
struct ReportResponse {
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    id: String,
    #[serde(default)]
    branding_settings: BrandingSettings,
}

#[derive(Deserialize)]
struct ChannelList {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

async fn ensure_success(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let raw = resp.text().await.unwrap_or_default();
    let snippet = raw.chars().take(800).collect::<String>();
    anyhow::bail!("{} failed HTTP {}: {}", what, status.as_u16(), snippet)
}

impl YouTubeClient {
    /// No network traffic until the first API call.
    pub fn new(client: Client, credentials: YouTubeCredentials) -> Self {
        Self {
            client,
            credentials: Some(credentials),
            access_token: OnceCell::new(),
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_token(client: Client, access_token: impl Into<String>) -> Self {
        Self {
            client,
            credentials: None,
            access_token: OnceCell::new_with(Some(access_token.into())),
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Refreshes once per process when refresh credentials exist, otherwise
    /// uses the stored access token as is.
    async fn access_token(&self) -> Result<&str> {
        let token = self
            .access_token
            .get_or_try_init(|| async {
                let creds = self
                    .credentials
                    .as_ref()
                    .context("No YouTube credentials")?;
                if creds.can_refresh() {
                    refresh_access_token(&self.client, creds).await
                } else {
                    creds
                        .token
                        .clone()
                        .context("YouTube credentials carry no access token")
                }
            })
            .await?;
        Ok(token.as_str())
    }
}

async fn refresh_access_token(client: &Client, creds: &YouTubeCredentials) -> Result<String> {
    let mut form = vec![("grant_type", "refresh_token")];
    if let (Some(id), Some(secret), Some(refresh)) =
        (&creds.client_id, &creds.client_secret, &creds.refresh_token)
    {
        form.push(("client_id", id.as_str()));
        form.push(("client_secret", secret.as_str()));
        form.push(("refresh_token", refresh.as_str()));
    }

    let resp = client
        .post(&creds.token_uri)
        .form(&form)
        .send()
        .await
        .context("OAuth token refresh request failed")?;
    let token: TokenResponse = ensure_success(resp, "OAuth token refresh")
        .await?
        .json()
        .await
        .context("OAuth token response parse failed")?;
    Ok(token.access_token)
}

#[async_trait]
impl Publisher for YouTubeClient {
    async fn upload(&self, video: &Path, meta: &VideoMetadata) -> Result<String> {
        logi(format!("Uploading: {}", meta.title));
        let bytes = fs::read(video)
            .await
            .with_context(|| format!("Failed to read {}", video.display()))?;

        let body = json!({
            "snippet": {
                "title": meta.title,
                "description": meta.description,
                "tags": meta.tags,
                "categoryId": VIDEO_CATEGORY_ID,
            },
            "status": {
                "privacyStatus": "public",
                "selfDeclaredMadeForKids": false,
            },
        });

        let resp = self
            .client
            .post(format!("{}/videos", self.endpoints.upload))
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(self.access_token().await?)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", bytes.len().to_string())
            .json(&body)
            .send()
            .await
            .context("YouTube upload session request failed")?;
        let resp = ensure_success(resp, "YouTube upload session").await?;
        let session = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .context("YouTube upload session has no Location header")?;

        let resp = self
            .client
            .put(session)
            .bearer_auth(self.access_token().await?)
            .header(CONTENT_TYPE, "video/mp4")
            .body(bytes)
            .send()
            .await
            .context("YouTube upload request failed")?;
        let video: IdOnly = ensure_success(resp, "YouTube upload")
            .await?
            .json()
            .await
            .context("YouTube upload response parse failed")?;

        logok(format!("Uploaded video id {}", video.id));
        Ok(video.id)
    }

    async fn comment(&self, video_id: &str, text: &str) -> Result<()> {
        let body = json!({
            "snippet": {
                "videoId": video_id,
                "topLevelComment": {"snippet": {"textOriginal": text}},
            }
        });
        let resp = self
            .client
            .post(format!("{}/commentThreads", self.endpoints.data))
            .query(&[("part", "snippet")])
            .bearer_auth(self.access_token().await?)
            .json(&body)
            .send()
            .await
            .context("YouTube comment request failed")?;
        ensure_success(resp, "YouTube comment").await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelApi for YouTubeClient {
    async fn top_search_terms(&self, start: NaiveDate, end: NaiveDate, max: usize) -> Result<Vec<String>> {
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        let max = max.to_string();
        let resp = self
            .client
            .get(format!("{}/reports", self.endpoints.analytics))
            .query(&[
                ("ids", "channel==MINE"),
                ("startDate", start.as_str()),
                ("endDate", end.as_str()),
                ("metrics", "views"),
                ("dimensions", "insightTrafficSourceDetail"),
                ("filters", "insightTrafficSourceType==YT_SEARCH"),
                ("sort", "-views"),
                ("maxResults", max.as_str()),
            ])
            .bearer_auth(self.access_token().await?)
            .send()
            .await
            .context("YouTube Analytics request failed")?;
        let report: ReportResponse = ensure_success(resp, "YouTube Analytics")
            .await?
            .json()
            .await
            .context("YouTube Analytics response parse failed")?;

        Ok(report
            .rows
            .iter()
            .filter_map(|row| row.first()?.as_str().map(str::to_string))
            .collect())
    }

    async fn channel_branding(&self) -> Result<ChannelBranding> {
        let resp = self
            .client
            .get(format!("{}/channels", self.endpoints.data))
            .query(&[("mine", "true"), ("part", "brandingSettings,id")])
            .bearer_auth(self.access_token().await?)
            .send()
            .await
            .context("YouTube channel list request failed")?;
        let list: ChannelList = ensure_success(resp, "YouTube channel list")
            .await?
            .json()
            .await
            .context("YouTube channel list parse failed")?;

        let item = list
            .items
            .into_iter()
            .next()
            .context("No channel found for these credentials")?;
        Ok(ChannelBranding {
            id: item.id,
            settings: item.branding_settings,
        })
    }

    async fn update_branding(&self, branding: &ChannelBranding) -> Result<()> {
        let body = json!({
            "id": branding.id,
            "brandingSettings": branding.settings,
        });
        let resp = self
            .client
            .put(format!("{}/channels", self.endpoints.data))
            .query(&[("part", "brandingSettings")])
            .bearer_auth(self.access_token().await?)
            .json(&body)
            .send()
            .await
            .context("YouTube channel update request failed")?;
        ensure_success(resp, "YouTube channel update").await?;
        Ok(())
    }
}
