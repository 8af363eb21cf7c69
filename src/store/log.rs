use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::message::Submission;

/// Receipt timestamp (UTC, microsecond precision) used as the entry key.
/// Fixed width, so lexical key order is arrival order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f%:z";

/// The whole log file. Entries written by something else are kept as-is.
pub type Log = Map<String, Value>;

/// JSON file holding every stored submission keyed by receipt time.
///
/// Each append reads and rewrites the whole file. Only one store may write a
/// given file; there is no locking.
#[derive(Debug, Clone)]
pub struct MessageLog {
    path: PathBuf,
}

impl MessageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the log. A missing file is an empty log. So is one that is not
    /// valid JSON or whose top level is not an object, after a warning; its
    /// content is replaced on the next append.
    pub async fn load(&self) -> Result<Log, StoreError> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Log::new()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<Value>(&content) {
            Ok(Value::Object(log)) => Ok(log),
            Ok(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Message log is not a JSON object, starting from an empty log"
                );
                Ok(Log::new())
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Message log is corrupt, starting from an empty log: {err}"
                );
                Ok(Log::new())
            }
        }
    }

    /// Stored submissions in arrival order. Entries that are not flat
    /// string maps stay in the file but are skipped here.
    pub async fn entries(&self) -> Result<Vec<(String, Submission)>, StoreError> {
        let entries = self
            .load()
            .await?
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value(value) {
                Ok(submission) => Some((key, submission)),
                Err(err) => {
                    tracing::debug!(key = %key, "Skipping foreign log entry: {err}");
                    None
                }
            })
            .collect();
        Ok(entries)
    }

    /// Store a submission received now. Returns its key.
    pub async fn append(&self, submission: &Submission) -> Result<String, StoreError> {
        self.append_at(Utc::now(), submission).await
    }

    pub async fn append_at(
        &self,
        received_at: DateTime<Utc>,
        submission: &Submission,
    ) -> Result<String, StoreError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut log = self.load().await?;
        let key = unique_key(&log, received_at);
        log.insert(key.clone(), serde_json::to_value(submission)?);

        let body = serde_json::to_vec_pretty(&log)?;
        tokio::fs::write(&self.path, body).await?;

        Ok(key)
    }
}

fn unique_key(log: &Log, received_at: DateTime<Utc>) -> String {
    let mut at = received_at;
    loop {
        let key = at.format(TIMESTAMP_FORMAT).to_string();
        if !log.contains_key(&key) {
            return key;
        }
        at += TimeDelta::microseconds(1);
    }
}
