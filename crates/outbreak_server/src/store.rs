//! JSON-file-backed record store.
//!
//! The full record table is read into memory when the store opens and
//! every store request rewrites the file from a snapshot. Snapshots are
//! serialized on the caller's thread but written by a detached task, so
//! the tick loop never waits on disk. Fetches resolve from the in-memory
//! table into the completion outbox, keeping the same drain-next-tick
//! shape as the in-process store in `outbreak_core`.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use outbreak_core::session::{ParticipantId, PersistId};
use outbreak_core::store::{FetchCompletion, PersistentRecord, RecordStore};

/// Errors that can occur while opening a record file.
#[derive(Debug, Error)]
pub enum StoreOpenError {
    /// Failed to read the file. Carries the path and the OS error text.
    #[error("IO error reading '{0}': {1}")]
    Io(String, String),
}

enum WriteJob {
    Snapshot(String),
    Flush(oneshot::Sender<()>),
}

struct Inner {
    records: HashMap<PersistId, PersistentRecord>,
    outbox: Vec<FetchCompletion>,
}

/// A record store persisted to one JSON file.
///
/// Cloning yields another handle to the same table, so the host can keep
/// one handle for flushing and inspection while the mode owns a boxed
/// one. All handles share the writer channel; the file is rewritten
/// after every store request.
#[derive(Clone)]
pub struct JsonRecordStore {
    inner: Arc<Mutex<Inner>>,
    writer: mpsc::UnboundedSender<WriteJob>,
}

impl JsonRecordStore {
    /// Open the record file and start the writer task.
    ///
    /// A missing file starts an empty table. A corrupt file logs an error
    /// and starts empty too; the in-memory table stays authoritative and
    /// the next store request rewrites the file. Only a read failure on a
    /// present file is an error.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreOpenError> {
        let path = path.into();
        let records: HashMap<PersistId, PersistentRecord> =
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => match serde_json::from_str(&text) {
                    Ok(records) => records,
                    Err(error) => {
                        error!(%error, path = %path.display(), "record file is corrupt, starting empty");
                        HashMap::new()
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
                Err(e) => {
                    return Err(StoreOpenError::Io(path.display().to_string(), e.to_string()))
                }
            };
        info!(records = records.len(), path = %path.display(), "record store opened");

        let (writer, mut jobs) = mpsc::unbounded_channel::<WriteJob>();
        tokio::spawn(async move {
            while let Some(job) = jobs.recv().await {
                match job {
                    WriteJob::Snapshot(snapshot) => {
                        if let Err(error) = tokio::fs::write(&path, snapshot).await {
                            error!(%error, path = %path.display(), "record write failed");
                        }
                    }
                    WriteJob::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
            debug!("record writer stopped");
        });

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                records,
                outbox: Vec::new(),
            })),
            writer,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Wait until every write queued so far has hit the disk.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.writer.send(WriteJob::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Look up a record directly, bypassing the fetch pipeline.
    #[must_use]
    pub fn stored(&self, id: PersistId) -> Option<PersistentRecord> {
        self.lock().records.get(&id).cloned()
    }

    fn queue_snapshot(&self, records: &HashMap<PersistId, PersistentRecord>) {
        let snapshot = match serde_json::to_string_pretty(records) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                error!(%error, "record serialization failed, write skipped");
                return;
            }
        };
        if self.writer.send(WriteJob::Snapshot(snapshot)).is_err() {
            error!("record writer is gone, write dropped");
        }
    }
}

impl RecordStore for JsonRecordStore {
    fn request_fetch(&mut self, participant: ParticipantId, id: PersistId) {
        let mut inner = self.lock();
        let record = inner.records.get(&id).cloned();
        debug!(%participant, %id, found = record.is_some(), "record fetch");
        inner.outbox.push(FetchCompletion {
            participant,
            record,
        });
    }

    fn request_store(&mut self, id: PersistId, record: PersistentRecord) {
        let mut inner = self.lock();
        inner.records.insert(id, record);
        self.queue_snapshot(&inner.records);
    }

    fn drain_completions(&mut self) -> Vec<FetchCompletion> {
        std::mem::take(&mut self.lock().outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use outbreak_core::store::SavedLoadout;

    fn record(role: &str) -> PersistentRecord {
        PersistentRecord {
            defender_role: Some(role.to_string()),
            infected_role: None,
            auto_rebuy: true,
            loadout: SavedLoadout::default(),
        }
    }

    #[tokio::test]
    async fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = JsonRecordStore::open(dir.path().join("records.json"))
            .await
            .expect("open");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_flush_reopen_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("records.json");

        let mut store = JsonRecordStore::open(&path).await.expect("open");
        store.request_store(PersistId(9001), record("human_runner"));
        store.flush().await;
        drop(store);

        let reopened = JsonRecordStore::open(&path).await.expect("reopen");
        assert_eq!(reopened.len(), 1);
        let stored = reopened.stored(PersistId(9001)).expect("record survives");
        assert_eq!(stored.defender_role.as_deref(), Some("human_runner"));
    }

    #[tokio::test]
    async fn test_fetch_resolves_on_drain() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = JsonRecordStore::open(dir.path().join("records.json"))
            .await
            .expect("open");
        store.request_store(PersistId(7), record("human_default"));

        let participant = ParticipantId(3);
        store.request_fetch(participant, PersistId(7));
        store.request_fetch(participant, PersistId(8));

        let completions = store.drain_completions();
        assert_eq!(completions.len(), 2);
        assert_eq!(completions[0].participant, participant);
        assert!(completions[0].record.is_some());
        assert!(completions[1].record.is_none(), "unknown id resolves to none");
        assert!(store.drain_completions().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("records.json");
        std::fs::write(&path, "not json").expect("write");

        let store = JsonRecordStore::open(&path).await.expect("open");
        assert_eq!(store.len(), 0);

        // The next store request replaces the corrupt file outright.
        let mut handle = store.clone();
        handle.request_store(PersistId(5), PersistentRecord::default());
        store.flush().await;
        let reopened = JsonRecordStore::open(&path).await.expect("reopen");
        assert_eq!(reopened.len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_the_table() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = JsonRecordStore::open(dir.path().join("records.json"))
            .await
            .expect("open");
        let mut handle = store.clone();

        handle.request_store(PersistId(42), record("human_default"));
        handle.flush().await;

        assert_eq!(store.len(), 1);
        assert!(store.stored(PersistId(42)).is_some());
    }
}
