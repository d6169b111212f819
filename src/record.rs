use serde::{Deserialize, Serialize};

/// One trending entry as scraped from the listing site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub title: String,
    pub link: String,
    pub image: String,
    #[serde(rename = "desc", alias = "description")]
    pub description: String,
}
