//! Persisted record store for captured selections and their conversions.
//!
//! Two parallel collections live in one JSON document on disk: `selectedTexts`
//! (raw captures) and `convertedTexts` (their converted counterparts, joined by
//! id). Reads and read-modify-write cycles can interleave badly when issued
//! straight from event handlers, so a dedicated worker task owns the file and
//! receives requests over a channel; one request is processed to completion,
//! with its own read, before the next starts. Callers hold a cheap cloneable
//! handle and await replies over oneshot channels.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Label reported by `list_all` for selections that have no conversion yet.
pub const ORIGINAL_LABEL: &str = "Original";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Record store worker is no longer running")]
    Closed,
}

/// A captured span of text. Immutable after creation except via deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub id: String,
    #[serde(rename = "str")]
    pub text: String,
}

/// A converted counterpart of a selection. `id` always equals the id of the
/// selection it derives from; at most one conversion exists per selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub id: String,
    #[serde(rename = "str")]
    pub text: String,
    #[serde(rename = "cn")]
    pub transform_name: String,
}

/// One row of `list_all`: the effective text (converted if a conversion
/// exists, raw otherwise) and the effective label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedRecord {
    pub id: String,
    pub text: String,
    pub label: String,
}

/// The persisted document. Both keys default to empty when absent so a missing
/// or freshly-created file reads as an empty store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordDocument {
    #[serde(rename = "selectedTexts", default)]
    selected_texts: Vec<SelectionRecord>,
    #[serde(rename = "convertedTexts", default)]
    converted_texts: Vec<ConversionRecord>,
}

enum StoreRequest {
    AppendSelection {
        text: String,
        resp: oneshot::Sender<Result<SelectionRecord, StoreError>>,
    },
    UpsertConversion {
        id: String,
        text: String,
        transform_name: String,
        resp: oneshot::Sender<Result<ConversionRecord, StoreError>>,
    },
    DeleteById {
        id: String,
        resp: oneshot::Sender<Result<(), StoreError>>,
    },
    ClearAll {
        resp: oneshot::Sender<Result<(), StoreError>>,
    },
    ListAll {
        resp: oneshot::Sender<Result<Vec<ListedRecord>, StoreError>>,
    },
    GetSelection {
        id: String,
        resp: oneshot::Sender<Result<Option<SelectionRecord>, StoreError>>,
    },
    ConvertedTexts {
        resp: oneshot::Sender<Result<Vec<ConversionRecord>, StoreError>>,
    },
}

/// Handle to the store worker. Cloning shares the same worker and queue.
#[derive(Clone)]
pub struct RecordStore {
    tx: mpsc::Sender<StoreRequest>,
}

impl RecordStore {
    /// Spawns the worker that owns the records file at `path`. Must be called
    /// from within a tokio runtime. The file is created on first write.
    pub fn open(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(run_worker(path, rx));
        Self { tx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, StoreError>>) -> StoreRequest,
    ) -> Result<T, StoreError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(build(resp_tx))
            .await
            .map_err(|_| StoreError::Closed)?;
        resp_rx.await.map_err(|_| StoreError::Closed)?
    }

    /// Generates a fresh id, persists a new selection record, and returns it.
    pub async fn append_selection(&self, text: String) -> Result<SelectionRecord, StoreError> {
        self.request(|resp| StoreRequest::AppendSelection { text, resp })
            .await
    }

    /// Replaces the conversion with `id` in place, preserving its position, or
    /// appends a new one if none exists.
    pub async fn upsert_conversion(
        &self,
        id: String,
        text: String,
        transform_name: String,
    ) -> Result<ConversionRecord, StoreError> {
        self.request(|resp| StoreRequest::UpsertConversion {
            id,
            text,
            transform_name,
            resp,
        })
        .await
    }

    /// Removes the selection and any conversion sharing `id` in one write.
    /// A no-op, not an error, if the id is absent.
    pub async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        self.request(|resp| StoreRequest::DeleteById { id, resp })
            .await
    }

    /// Empties both collections.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        self.request(|resp| StoreRequest::ClearAll { resp }).await
    }

    /// Lists every selection in insertion order with its effective text and
    /// label (`"Original"` when no conversion exists).
    pub async fn list_all(&self) -> Result<Vec<ListedRecord>, StoreError> {
        self.request(|resp| StoreRequest::ListAll { resp }).await
    }

    /// Looks a selection up by id.
    pub async fn get_selection(&self, id: &str) -> Result<Option<SelectionRecord>, StoreError> {
        let id = id.to_string();
        self.request(|resp| StoreRequest::GetSelection { id, resp })
            .await
    }

    /// The full converted collection, in insertion order. Used by the export
    /// collaborator.
    pub async fn converted_texts(&self) -> Result<Vec<ConversionRecord>, StoreError> {
        self.request(|resp| StoreRequest::ConvertedTexts { resp })
            .await
    }
}

async fn run_worker(path: PathBuf, mut rx: mpsc::Receiver<StoreRequest>) {
    debug!(path = %path.display(), "Record store worker started");
    while let Some(req) = rx.recv().await {
        match req {
            StoreRequest::AppendSelection { text, resp } => {
                let _ = resp.send(append_selection(&path, text).await);
            }
            StoreRequest::UpsertConversion {
                id,
                text,
                transform_name,
                resp,
            } => {
                let _ = resp.send(upsert_conversion(&path, id, text, transform_name).await);
            }
            StoreRequest::DeleteById { id, resp } => {
                let _ = resp.send(delete_by_id(&path, &id).await);
            }
            StoreRequest::ClearAll { resp } => {
                let _ = resp.send(clear_all(&path).await);
            }
            StoreRequest::ListAll { resp } => {
                let _ = resp.send(list_all(&path).await);
            }
            StoreRequest::GetSelection { id, resp } => {
                let _ = resp.send(get_selection(&path, &id).await);
            }
            StoreRequest::ConvertedTexts { resp } => {
                let _ = resp.send(converted_texts(&path).await);
            }
        }
    }
    debug!(path = %path.display(), "Record store worker stopped");
}

/// Id format: `{millis-since-epoch}-{random disambiguator}`. Unique enough for
/// a single persistence lifetime; not cryptographically guaranteed.
fn generate_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{timestamp}-{}", nanoid::nanoid!(6))
}

async fn load_document(path: &Path) -> Result<RecordDocument, StoreError> {
    match fs::read_to_string(path).await {
        Ok(data) => Ok(serde_json::from_str(&data)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Ok(RecordDocument::default())
        }
        Err(err) => Err(err.into()),
    }
}

/// Writes the whole document to a sibling temp file and renames it over the
/// records file, so a failed write never leaves a half-applied document.
async fn save_document(path: &Path, doc: &RecordDocument) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let data = serde_json::to_string_pretty(doc)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn append_selection(path: &Path, text: String) -> Result<SelectionRecord, StoreError> {
    let mut doc = load_document(path).await?;
    let record = SelectionRecord {
        id: generate_id(),
        text,
    };
    doc.selected_texts.push(record.clone());
    save_document(path, &doc).await?;
    debug!(id = %record.id, "Selection appended");
    Ok(record)
}

async fn upsert_conversion(
    path: &Path,
    id: String,
    text: String,
    transform_name: String,
) -> Result<ConversionRecord, StoreError> {
    let mut doc = load_document(path).await?;
    let record = ConversionRecord {
        id,
        text,
        transform_name,
    };
    match doc.converted_texts.iter_mut().find(|c| c.id == record.id) {
        Some(existing) => *existing = record.clone(),
        None => doc.converted_texts.push(record.clone()),
    }
    save_document(path, &doc).await?;
    debug!(id = %record.id, transform = %record.transform_name, "Conversion upserted");
    Ok(record)
}

async fn delete_by_id(path: &Path, id: &str) -> Result<(), StoreError> {
    let mut doc = load_document(path).await?;
    let before = doc.selected_texts.len() + doc.converted_texts.len();
    doc.selected_texts.retain(|s| s.id != id);
    doc.converted_texts.retain(|c| c.id != id);
    if doc.selected_texts.len() + doc.converted_texts.len() == before {
        // Absent id: nothing to remove, skip the write.
        return Ok(());
    }
    save_document(path, &doc).await?;
    debug!(id, "Record pair deleted");
    Ok(())
}

async fn clear_all(path: &Path) -> Result<(), StoreError> {
    save_document(path, &RecordDocument::default()).await?;
    debug!("Record store cleared");
    Ok(())
}

async fn list_all(path: &Path) -> Result<Vec<ListedRecord>, StoreError> {
    let doc = load_document(path).await?;
    Ok(doc
        .selected_texts
        .iter()
        .map(|sel| {
            match doc.converted_texts.iter().find(|c| c.id == sel.id) {
                Some(conv) => ListedRecord {
                    id: sel.id.clone(),
                    text: conv.text.clone(),
                    label: conv.transform_name.clone(),
                },
                None => ListedRecord {
                    id: sel.id.clone(),
                    text: sel.text.clone(),
                    label: ORIGINAL_LABEL.to_string(),
                },
            }
        })
        .collect())
}

async fn get_selection(path: &Path, id: &str) -> Result<Option<SelectionRecord>, StoreError> {
    let doc = load_document(path).await?;
    Ok(doc.selected_texts.iter().find(|s| s.id == id).cloned())
}

async fn converted_texts(path: &Path) -> Result<Vec<ConversionRecord>, StoreError> {
    let doc = load_document(path).await?;
    Ok(doc.converted_texts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_records_path() -> PathBuf {
        std::env::temp_dir().join(format!("caseclip-store-test-{}.json", nanoid::nanoid!(8)))
    }

    async fn cleanup(path: &Path) {
        let _ = fs::remove_file(path).await;
    }

    #[tokio::test]
    async fn test_append_and_list_preserves_insertion_order() {
        let path = temp_records_path();
        let store = RecordStore::open(path.clone());

        let first = store.append_selection("one".to_string()).await.unwrap();
        let second = store.append_selection("two".to_string()).await.unwrap();
        assert_ne!(first.id, second.id);

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[0].text, "one");
        assert_eq!(listed[0].label, ORIGINAL_LABEL);
        assert_eq!(listed[1].id, second.id);

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place_and_is_idempotent() {
        let path = temp_records_path();
        let store = RecordStore::open(path.clone());

        let a = store.append_selection("Alpha".to_string()).await.unwrap();
        let b = store.append_selection("Beta".to_string()).await.unwrap();
        store
            .upsert_conversion(a.id.clone(), "alpha".to_string(), "Lowercase".to_string())
            .await
            .unwrap();
        store
            .upsert_conversion(b.id.clone(), "BETA".to_string(), "Uppercase".to_string())
            .await
            .unwrap();

        // Replacing the first conversion keeps its position ahead of the second.
        store
            .upsert_conversion(a.id.clone(), "ALPHA".to_string(), "Uppercase".to_string())
            .await
            .unwrap();
        let converted = store.converted_texts().await.unwrap();
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].id, a.id);
        assert_eq!(converted[0].text, "ALPHA");
        assert_eq!(converted[0].transform_name, "Uppercase");

        // Repeating the identical upsert changes nothing.
        store
            .upsert_conversion(a.id.clone(), "ALPHA".to_string(), "Uppercase".to_string())
            .await
            .unwrap();
        assert_eq!(store.converted_texts().await.unwrap(), converted);

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_delete_removes_both_collections_and_ignores_absent_ids() {
        let path = temp_records_path();
        let store = RecordStore::open(path.clone());

        let record = store.append_selection("Hello".to_string()).await.unwrap();
        store
            .upsert_conversion(record.id.clone(), "hello".to_string(), "Lowercase".to_string())
            .await
            .unwrap();

        store.delete_by_id(&record.id).await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.converted_texts().await.unwrap().is_empty());

        // Deleting an id that was never present is a no-op, not an error.
        store.delete_by_id("1234-zzz").await.unwrap();
        store.delete_by_id(&record.id).await.unwrap();

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_clear_all_empties_everything() {
        let path = temp_records_path();
        let store = RecordStore::open(path.clone());

        let record = store.append_selection("text".to_string()).await.unwrap();
        store
            .upsert_conversion(record.id, "TEXT".to_string(), "Uppercase".to_string())
            .await
            .unwrap();
        store.clear_all().await.unwrap();

        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.converted_texts().await.unwrap().is_empty());

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty_store() {
        let path = temp_records_path();
        let store = RecordStore::open(path.clone());
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.get_selection("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_records_survive_reopening() {
        let path = temp_records_path();
        let id = {
            let store = RecordStore::open(path.clone());
            let record = store.append_selection("persist me".to_string()).await.unwrap();
            store
                .upsert_conversion(
                    record.id.clone(),
                    "persist_me".to_string(),
                    "Snake Case".to_string(),
                )
                .await
                .unwrap();
            record.id
        };

        let reopened = RecordStore::open(path.clone());
        let listed = reopened.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].text, "persist_me");
        assert_eq!(listed[0].label, "Snake Case");

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_interleaved_mutations_lose_no_updates() {
        let path = temp_records_path();
        let store = RecordStore::open(path.clone());

        let a = store.append_selection("first".to_string()).await.unwrap();
        let b = store.append_selection("second".to_string()).await.unwrap();

        // Issued concurrently; the worker queue serializes the two
        // read-modify-write cycles so neither write clobbers the other.
        let (ra, rb) = tokio::join!(
            store.upsert_conversion(a.id.clone(), "FIRST".to_string(), "Uppercase".to_string()),
            store.upsert_conversion(b.id.clone(), "SECOND".to_string(), "Uppercase".to_string()),
        );
        ra.unwrap();
        rb.unwrap();

        let converted = store.converted_texts().await.unwrap();
        assert_eq!(converted.len(), 2);

        cleanup(&path).await;
    }

    #[test]
    fn test_generated_ids_have_timestamp_and_disambiguator() {
        let id = generate_id();
        let (timestamp, suffix) = id.split_once('-').expect("id has a dash");
        assert!(timestamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), 6);
        assert_ne!(generate_id(), id);
    }

    #[test]
    fn test_document_defaults_when_keys_are_absent() {
        let doc: RecordDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.selected_texts.is_empty());
        assert!(doc.converted_texts.is_empty());

        let doc: RecordDocument = serde_json::from_str(
            r#"{"selectedTexts":[{"id":"1-a","str":"x"}],"convertedTexts":[{"id":"1-a","str":"X","cn":"Uppercase"}]}"#,
        )
        .unwrap();
        assert_eq!(doc.selected_texts[0].text, "x");
        assert_eq!(doc.converted_texts[0].transform_name, "Uppercase");
    }
}
