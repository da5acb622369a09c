//! Append-only TSV error log.
//!
//! Failures worth a follow-up (a manifest that would not parse, an item a
//! store refused to serve) are appended to a tab-separated log so a batch
//! run over thousands of roots can be triaged afterwards. One line per
//! failure: timestamp, CID, name, code, message.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::store::Result;

/// Failure category recorded in the log's `code` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCode {
    /// The input data was malformed or incomplete.
    DataError,
    /// The store failed to serve a request.
    StoreError,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::DataError => "DATA_ERROR",
            FailureCode::StoreError => "STORE_ERROR",
        }
    }
}

/// Writer handle for the error log.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one failure record. Tabs and newlines inside fields are
    /// replaced with spaces to keep the file one-record-per-line.
    pub async fn record(
        &self,
        cid: &str,
        name: &str,
        code: FailureCode,
        message: &str,
    ) -> Result<()> {
        let line = format!(
            "{}\t{}\t{}\t{}\t{}\n",
            Utc::now().to_rfc3339(),
            sanitize(cid),
            sanitize(name),
            code.as_str(),
            sanitize(message),
        );
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        debug!(path = %self.path.display(), code = code.as_str(), "recorded failure");
        Ok(())
    }
}

fn sanitize(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}
