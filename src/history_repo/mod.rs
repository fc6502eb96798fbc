// Durable snapshot history: one file holding the full ordered sequence of aggregates.
// Encoding is inferred on load by trying each codec in turn (columnar, then CSV).
// Writes go to a sibling temp file and are renamed over the target.
//
// Inspecting the file: `cargo run --bin dump_history -- [PATH] [LIMIT]`.

pub mod aggregation;
mod blob;
pub mod codec;
pub mod gate;
pub mod reader;

pub use codec::{CodecError, CodecKind, SnapshotCodec};

use crate::models::AggregateRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no codec could persist history to {path}: {last}")]
    AllCodecsFailed { path: String, last: String },
}

/// How a `load` ended. Records are empty for every variant except `Loaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Missing,
    Unreadable,
    Corrupt,
    Loaded(CodecKind),
}

#[derive(Debug, Clone)]
pub struct LoadedHistory {
    pub records: Vec<AggregateRecord>,
    pub outcome: LoadOutcome,
}

impl LoadedHistory {
    fn empty(outcome: LoadOutcome) -> Self {
        Self {
            records: Vec::new(),
            outcome,
        }
    }
}

pub struct HistoryStore {
    path: PathBuf,
    codecs: Vec<Box<dyn SnapshotCodec>>,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_codecs(path, codec::default_chain())
    }

    pub fn with_codecs(path: impl Into<PathBuf>, codecs: Vec<Box<dyn SnapshotCodec>>) -> Self {
        Self {
            path: path.into(),
            codecs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole history. Never fails: absent or undecodable files read as empty.
    #[instrument(skip(self), fields(repo = "history", operation = "load"))]
    pub async fn load(&self) -> LoadedHistory {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return LoadedHistory::empty(LoadOutcome::Missing);
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "history unreadable, treating as empty");
                return LoadedHistory::empty(LoadOutcome::Unreadable);
            }
        };

        for codec in &self.codecs {
            match codec.decode(&bytes) {
                Ok(records) => {
                    return LoadedHistory {
                        records,
                        outcome: LoadOutcome::Loaded(codec.kind()),
                    };
                }
                Err(e) => {
                    tracing::debug!(codec = %codec.kind(), error = %e, "history decode failed");
                }
            }
        }
        tracing::warn!(
            path = %self.path.display(),
            bytes = bytes.len(),
            "history corrupt in every known format, treating as empty"
        );
        LoadedHistory::empty(LoadOutcome::Corrupt)
    }

    /// Replaces the file with `records`, using the first codec that encodes and writes.
    #[instrument(skip(self, records), fields(repo = "history", operation = "save", records_count = records.len()))]
    pub async fn save(&self, records: &[AggregateRecord]) -> Result<CodecKind, StoreError> {
        let mut last = String::from("no codecs configured");
        for codec in &self.codecs {
            let bytes = match codec.encode(records) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(codec = %codec.kind(), error = %e, "history encode failed, trying next codec");
                    last = e.to_string();
                    continue;
                }
            };
            match self.write_replace(&bytes).await {
                Ok(()) => return Ok(codec.kind()),
                Err(e) => {
                    tracing::warn!(codec = %codec.kind(), error = %e, "history write failed, trying next codec");
                    last = e.to_string();
                }
            }
        }
        Err(StoreError::AllCodecsFailed {
            path: self.path.display().to_string(),
            last,
        })
    }

    /// load + push + save. The only mutating entry point.
    #[instrument(skip(self, record), fields(repo = "history", operation = "append"))]
    pub async fn append(&self, record: AggregateRecord) -> Result<CodecKind, StoreError> {
        let loaded = self.load().await;
        self.append_loaded(loaded, record).await
    }

    /// Append onto a history the caller already loaded, so a gate check and the write
    /// share one read.
    #[instrument(skip(self, loaded, record), fields(repo = "history", operation = "append_loaded"))]
    pub async fn append_loaded(
        &self,
        loaded: LoadedHistory,
        record: AggregateRecord,
    ) -> Result<CodecKind, StoreError> {
        let LoadedHistory {
            mut records,
            outcome,
        } = loaded;
        if matches!(outcome, LoadOutcome::Corrupt | LoadOutcome::Unreadable) {
            tracing::warn!(?outcome, "appending over unusable history; previous contents are dropped");
        }
        records.push(record);
        self.save(&records).await
    }

    async fn write_replace(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.temp_path();
        let result = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        result
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
