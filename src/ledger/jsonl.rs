//! Append-only JSON-lines ledger file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::LedgerError;
use crate::ledger::{Ledger, LedgerEvent};

/// Writes one JSON object per line; lines from concurrent payments never interleave.
#[derive(Debug)]
pub struct JsonLinesLedger {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesLedger {
    /// Open (or create) `path` for appending.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        tracing::info!(path = ?path, "Ledger file opened");

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Ledger for JsonLinesLedger {
    async fn append(&self, event: LedgerEvent) -> Result<(), LedgerError> {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
