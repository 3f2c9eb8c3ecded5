//! Conversion orchestration and the call contract the presentation layer drives.
//!
//! `App` owns the record store handle and the single active-selection slot (the
//! one record currently staged for conversion). UI events — select, convert,
//! delete, clear, capture — all come through here; no other component writes
//! persisted state. `convert` is the only path that creates or updates
//! conversion records.

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::store::{
    ConversionRecord, ListedRecord, RecordStore, SelectionRecord, StoreError,
};
use crate::transforms;

#[derive(Debug, Error)]
pub enum AppError {
    /// User pressed a conversion button with nothing staged. Reported to the
    /// user; no state changes.
    #[error("No text is selected. Select a text first.")]
    NoActiveSelection,
    /// The staged id no longer exists in the store (e.g. the UI raced a
    /// deletion).
    #[error("No record with id {0}")]
    RecordNotFound(String),
    /// Nothing to export. Reported to the user; no state changes.
    #[error("There are no converted texts to download.")]
    NothingToDownload,
    /// A conversion name outside the closed catalog. The catalog is fixed, so
    /// this is a defect in the caller rather than bad user input.
    #[error("Unknown conversion name: {0}")]
    UnknownTransform(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Export failed: {0}")]
    Export(#[from] std::io::Error),
}

pub struct App {
    store: RecordStore,
    active: Mutex<Option<SelectionRecord>>,
}

impl App {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            active: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Appends a captured selection. Called when the selection trigger fires.
    pub async fn append_selection(&self, text: String) -> Result<SelectionRecord, AppError> {
        let record = self.store.append_selection(text).await?;
        info!(id = %record.id, len = record.text.len(), "Selection captured");
        Ok(record)
    }

    /// Stages the selection with `id` for conversion, replacing whatever was
    /// staged before, and returns it for display.
    pub async fn set_active_selection(&self, id: &str) -> Result<SelectionRecord, AppError> {
        let record = self
            .store
            .get_selection(id)
            .await?
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;
        let mut active = self.active.lock().await;
        *active = Some(record.clone());
        debug!(id = %record.id, "Selection staged for conversion");
        Ok(record)
    }

    /// The currently staged selection, if any.
    pub async fn active_selection(&self) -> Option<SelectionRecord> {
        self.active.lock().await.clone()
    }

    /// Applies the named conversion to the active selection, stores the
    /// result, and unstages the selection. The slot lock is held across the
    /// store write so a convert finishes before a competing convert, delete,
    /// or clear touches the slot. On failure the slot is left as it was.
    pub async fn convert(&self, transform_name: &str) -> Result<ConversionRecord, AppError> {
        let mut active = self.active.lock().await;
        let Some(selection) = active.clone() else {
            debug!(transform_name, "Convert requested with no active selection");
            return Err(AppError::NoActiveSelection);
        };
        let Some(conversion) = transforms::lookup(transform_name) else {
            error!(transform_name, "Conversion name is not in the catalog");
            return Err(AppError::UnknownTransform(transform_name.to_string()));
        };

        let converted = (conversion.transform)(&selection.text);
        let record = self
            .store
            .upsert_conversion(selection.id, converted, conversion.name.to_string())
            .await?;
        *active = None;
        info!(id = %record.id, transform = conversion.name, "Conversion stored");
        Ok(record)
    }

    /// Deletes the selection and any conversion sharing `id`. Unstages the
    /// active selection if it referenced the deleted record.
    pub async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        let mut active = self.active.lock().await;
        self.store.delete_by_id(id).await?;
        if active.as_ref().is_some_and(|sel| sel.id == id) {
            *active = None;
        }
        Ok(())
    }

    /// Empties both collections and unstages the active selection.
    pub async fn clear_all(&self) -> Result<(), AppError> {
        let mut active = self.active.lock().await;
        self.store.clear_all().await?;
        *active = None;
        Ok(())
    }

    /// Every selection in insertion order with its effective text and label.
    pub async fn list_all(&self) -> Result<Vec<ListedRecord>, AppError> {
        Ok(self.store.list_all().await?)
    }
}
