use crate::error::PersistenceError;
use crate::record::CandidateRecord;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug)]
pub struct JsonLedger {
    path: PathBuf,
    records: Vec<CandidateRecord>,
}

impl JsonLedger {
    /// Reads the ledger, creating it as `[]` when the file does not exist yet.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await.map_err(|source| PersistenceError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            let ledger = Self {
                path,
                records: Vec::new(),
            };
            ledger.persist().await?;
            return Ok(ledger);
        }

        let text = fs::read_to_string(&path).await.map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;
        let records = serde_json::from_str(&text).map_err(|source| PersistenceError::Json {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exact, case-sensitive title match.
    pub fn contains(&self, title: &str) -> bool {
        self.records.iter().any(|r| r.title == title)
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub async fn prepend_and_persist(&mut self, record: CandidateRecord) -> Result<(), PersistenceError> {
        self.records.insert(0, record);
        self.persist().await
    }

    // Full rewrite, not atomic.
    async fn persist(&self) -> Result<(), PersistenceError> {
        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.records
            .serialize(&mut ser)
            .map_err(|source| PersistenceError::Json {
                path: self.path.clone(),
                source,
            })?;

        fs::write(&self.path, buf).await.map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
