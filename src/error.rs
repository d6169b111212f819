use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no content found on {url}")]
    NoContent { url: String },

    #[error("featured entry on {url} has no {attribute}")]
    MissingAttribute { url: String, attribute: &'static str },

    #[error("no cover image found on {url}")]
    MissingImage { url: String },

    #[error("invalid selector `{0}`")]
    Selector(String),
}

/// Anything that stops a run before a candidate is known.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("ledger I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger {} is not a JSON record array: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Narrate,
    Compose,
    Publish,
    Comment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Narrate => "narration",
            Stage::Compose => "composition",
            Stage::Publish => "publishing",
            Stage::Comment => "comment",
        };
        f.write_str(name)
    }
}

/// A failure in one of the collaborators after the ledger write.
#[derive(Debug, Error)]
#[error("{stage} failed: {cause:#}")]
pub struct DownstreamError {
    pub stage: Stage,
    cause: anyhow::Error,
}

impl DownstreamError {
    pub fn new(stage: Stage, cause: anyhow::Error) -> Self {
        Self { stage, cause }
    }

    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }
}
