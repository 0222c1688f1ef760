//! Round result sinks.

use std::path::{Path, PathBuf};

use invigil_protocol::RoundRecord;
use invigil_room::{ResultSink, SinkError};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::InvigilError;

/// Appends one JSON line per finished round to a file.
///
/// `record` only serializes and queues the line; a background task owns
/// the file and does the writing, so room actors never block on disk.
pub struct JsonlResultSink {
    path: PathBuf,
    lines: mpsc::UnboundedSender<Vec<u8>>,
    writer: JoinHandle<()>,
}

impl JsonlResultSink {
    /// Opens (or creates) `path` for appending and starts the writer.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, InvigilError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        info!(path = %path.display(), "round results appended to file");

        let (lines, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let log_path = path.clone();
        let writer = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                let written = match file.write_all(&line).await {
                    Ok(()) => file.flush().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = written {
                    warn!(path = %log_path.display(), error = %e, "failed to append round result");
                }
            }
        });

        Ok(Self {
            path,
            lines,
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stops accepting records and waits until every queued line is written.
    pub async fn close(self) {
        drop(self.lines);
        let _ = self.writer.await;
    }
}

impl ResultSink for JsonlResultSink {
    fn record(&self, record: &RoundRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record).map_err(std::io::Error::from)?;
        line.push(b'\n');
        self.lines.send(line).map_err(|_| SinkError::Closed)
    }
}

/// Writes finished rounds to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogResultSink;

impl ResultSink for LogResultSink {
    fn record(&self, record: &RoundRecord) -> Result<(), SinkError> {
        info!(
            room_code = %record.room_code,
            winner_role = %record.winner_role,
            result_type = %record.result_type,
            "round recorded"
        );
        Ok(())
    }
}
