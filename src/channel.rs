use crate::{logi, logok, logw};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ANALYTICS_WINDOW_DAYS: i64 = 30;
pub const MAX_SEARCH_TERMS: usize = 15;
pub const MAX_CHANNEL_KEYWORDS: usize = 15;
const TRENDING_IN_DESCRIPTION: usize = 5;

pub const CORE_KEYWORDS: &[&str] = &["manhwa", "manga", "webtoon", "s rank manga", "recommendations"];

pub const BASE_DESCRIPTION: &str = "Welcome to S Rank Manga. 🕵️‍♂️
Your hub for the best Manga, Manhwa, and Webtoon recommendations.
✅ Action, Fantasy & Isekai
✅ Underrated Hidden Gems
Subscribe to level up your reading list.
";

/// `brandingSettings` of a channel. Fields this tool does not touch are kept
/// verbatim so an update never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandingSettings {
    #[serde(default)]
    pub channel: ChannelSettings,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBranding {
    pub id: String,
    pub settings: BrandingSettings,
}

#[async_trait]
pub trait ChannelApi: Send + Sync {
    /// Search terms that brought the most views in `[start, end]`, best first.
    async fn top_search_terms(&self, start: NaiveDate, end: NaiveDate, max: usize) -> Result<Vec<String>>;

    async fn channel_branding(&self) -> Result<ChannelBranding>;

    async fn update_branding(&self, branding: &ChannelBranding) -> Result<()>;
}

/// Core keywords first, then search terms; first occurrence wins; capped.
pub fn merge_keywords(search_terms: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for term in CORE_KEYWORDS
        .iter()
        .map(|t| t.to_string())
        .chain(search_terms.iter().map(|t| t.trim().to_string()))
    {
        if term.is_empty() || merged.contains(&term) {
            continue;
        }
        merged.push(term);
        if merged.len() == MAX_CHANNEL_KEYWORDS {
            break;
        }
    }
    merged
}

pub fn format_keywords(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|k| format!("\"{}\"", k.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn channel_description(search_terms: &[String]) -> String {
    let trending = search_terms
        .iter()
        .take(TRENDING_IN_DESCRIPTION)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{BASE_DESCRIPTION}\n\n🔥 Trending Searches: {trending}")
}

pub fn apply_search_terms(settings: &mut BrandingSettings, search_terms: &[String]) {
    settings.channel.keywords = Some(format_keywords(&merge_keywords(search_terms)));
    settings.channel.description = Some(channel_description(search_terms));
}

/// Reads analytics, rewrites branding, and pushes it unless `dry_run`.
pub async fn optimize_channel(api: &dyn ChannelApi, today: NaiveDate, dry_run: bool) -> Result<ChannelBranding> {
    let start = today - Duration::days(ANALYTICS_WINDOW_DAYS);
    let terms = match api.top_search_terms(start, today, MAX_SEARCH_TERMS).await {
        Ok(terms) => terms,
        Err(err) => {
            logw(format!("Analytics query failed ({:#}); continuing without search terms", err));
            Vec::new()
        }
    };
    logi(format!("Top search terms ({}..{}): {}", start, today, terms.len()));

    let mut branding = api.channel_branding().await?;
    apply_search_terms(&mut branding.settings, &terms);

    if dry_run {
        logi("Dry run: channel branding not updated".to_string());
    } else {
        api.update_branding(&branding).await?;
        logok("Channel SEO Optimized.".to_string());
    }
    Ok(branding)
}
