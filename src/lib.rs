//! caseclip: captures selected text and converts it between naming cases.
//!
//! The core is a persisted pair of record collections (raw selections and
//! their conversions) behind a single-flight store worker, a fixed catalog of
//! case transforms, and the orchestration that ties them together. A
//! presentation layer drives everything through [`App`]; selections arrive
//! over the capture socket.

pub mod app;
pub mod capture;
pub mod config;
pub mod download;
pub mod paths;
pub mod store;
pub mod transforms;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use app::{App, AppError};
pub use store::{ConversionRecord, ListedRecord, RecordStore, SelectionRecord};

/// Runs the one-shot export: writes the converted collection to the exports
/// directory (file name from the config, `converted_texts.txt` by default) and
/// clears the store. Used by `caseclip export`; returns the written path.
pub fn run_export() -> Result<std::path::PathBuf, String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    runtime.block_on(async {
        let records_path = paths::get_records_path()?;
        let exports_dir = paths::get_exports_dir()?;
        let file_name = config::load_export_file_name();

        let app = App::new(RecordStore::open(records_path));
        download::download_converted_texts(&app, &exports_dir, &file_name)
            .await
            .map_err(|e| e.to_string())
    })
}

/// Runs the daemon: tracing, store, capture listener, then wait for shutdown.
pub fn run() {
    let log_level = config::load_log_level();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_ascii_lowercase())),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            std::process::exit(1);
        }
    };

    runtime.block_on(async {
        let records_path = match paths::get_records_path() {
            Ok(path) => path,
            Err(e) => {
                error!(error = %e, "Cannot resolve the records path");
                std::process::exit(1);
            }
        };

        let store = RecordStore::open(records_path);
        let app = Arc::new(App::new(store));
        capture::start_capture_listener(app.clone());

        info!(
            socket = %capture::capture_socket_path().display(),
            "caseclip running; send selections with `caseclip capture <text>`"
        );

        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutting down");
    });
}
