//! Export collaborator: writes every converted text to a single file.
//!
//! The exported file is the converted texts joined with newlines, in insertion
//! order. A successful export clears the whole store (both collections and the
//! staged selection); an empty converted collection aborts with a user-visible
//! "nothing to download" error and changes nothing.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::app::{App, AppError};

/// File name used when the config does not override it.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "converted_texts.txt";

/// Exports the converted collection to `exports_dir/file_name` and clears the
/// store. Returns the path of the written file.
pub async fn download_converted_texts(
    app: &App,
    exports_dir: &Path,
    file_name: &str,
) -> Result<PathBuf, AppError> {
    let converted = app.store().converted_texts().await?;
    if converted.is_empty() {
        return Err(AppError::NothingToDownload);
    }

    let body = converted
        .iter()
        .map(|record| record.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    fs::create_dir_all(exports_dir).await?;
    let path = exports_dir.join(file_name);
    // Temp file + rename: a failed export must not leave a truncated file and
    // must not clear the store.
    let tmp = path.with_extension("txt.tmp");
    fs::write(&tmp, body).await?;
    fs::rename(&tmp, &path).await?;

    app.clear_all().await?;
    info!(path = %path.display(), count = converted.len(), "Converted texts exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordStore;

    fn test_app() -> (App, PathBuf, PathBuf) {
        let suffix = nanoid::nanoid!(8);
        let records = std::env::temp_dir().join(format!("caseclip-dl-test-{suffix}.json"));
        let exports = std::env::temp_dir().join(format!("caseclip-dl-exports-{suffix}"));
        (App::new(RecordStore::open(records.clone())), records, exports)
    }

    async fn cleanup(records: &Path, exports: &Path) {
        let _ = fs::remove_file(records).await;
        let _ = fs::remove_dir_all(exports).await;
    }

    #[tokio::test]
    async fn test_empty_collection_reports_nothing_to_download() {
        let (app, records, exports) = test_app();
        // A selection without a conversion does not make the export non-empty.
        app.append_selection("raw only".to_string()).await.unwrap();

        let err = download_converted_texts(&app, &exports, DEFAULT_EXPORT_FILE_NAME)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NothingToDownload));
        // Nothing was cleared.
        assert_eq!(app.list_all().await.unwrap().len(), 1);

        cleanup(&records, &exports).await;
    }

    #[tokio::test]
    async fn test_export_joins_texts_and_clears_the_store() {
        let (app, records, exports) = test_app();

        let a = app.append_selection("Hello World".to_string()).await.unwrap();
        app.set_active_selection(&a.id).await.unwrap();
        app.convert("Snake Case").await.unwrap();

        let b = app.append_selection("Go Fast!".to_string()).await.unwrap();
        app.set_active_selection(&b.id).await.unwrap();
        app.convert("Constant Case").await.unwrap();

        let path = download_converted_texts(&app, &exports, DEFAULT_EXPORT_FILE_NAME)
            .await
            .unwrap();
        let body = fs::read_to_string(&path).await.unwrap();
        assert_eq!(body, "hello_world\nGO_FAST");

        assert!(app.list_all().await.unwrap().is_empty());
        assert!(app.active_selection().await.is_none());

        cleanup(&records, &exports).await;
    }

    #[tokio::test]
    async fn test_export_honors_a_configured_file_name() {
        let (app, records, exports) = test_app();

        let record = app.append_selection("some text".to_string()).await.unwrap();
        app.set_active_selection(&record.id).await.unwrap();
        app.convert("Kebab Case").await.unwrap();

        let path = download_converted_texts(&app, &exports, "cases.txt")
            .await
            .unwrap();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("cases.txt"));
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "some-text");

        cleanup(&records, &exports).await;
    }
}
