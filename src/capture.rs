//! Unix domain socket used to deliver captured selections to a running instance.
//!
//! The selection trigger is any external process that can write to this socket
//! (e.g. `caseclip capture <text>` wired to a context menu or hotkey). Each
//! incoming connection carries the text of one selection; on receipt it is
//! appended to the record store. The path is chosen in order:
//! `XDG_RUNTIME_DIR`, then `/run/user/{uid}`, then `/tmp/caseclip-{uid}.sock`.
//! On non-Unix platforms the socket is not used and the sender reports the
//! bridge as unsupported.

#[cfg(unix)]
use std::io::Write;
#[cfg(unix)]
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(unix)]
use tokio::io::AsyncReadExt;
#[cfg(unix)]
use tokio::net::UnixListener;
#[cfg(unix)]
use tracing::debug;
use tracing::warn;

use crate::app::App;

// --- Path selection (Unix) ---

#[cfg(unix)]
fn current_uid() -> u32 {
    std::fs::metadata("/proc/self")
        .map(|meta| std::os::unix::fs::MetadataExt::uid(&meta))
        .unwrap_or(0)
}

/// Returns the path where the capture socket is bound.
/// Prefers XDG_RUNTIME_DIR, then /run/user/{uid}, then /tmp/caseclip-{uid}.sock.
#[cfg(unix)]
pub fn capture_socket_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        let candidate = PathBuf::from(runtime_dir).join("caseclip.sock");
        if let Some(parent) = candidate.parent() {
            if parent.exists() {
                return candidate;
            }
        }
    }

    let uid = current_uid();
    let run_user = PathBuf::from(format!("/run/user/{uid}"));
    if run_user.exists() {
        return run_user.join("caseclip.sock");
    }

    PathBuf::from(format!("/tmp/caseclip-{uid}.sock"))
}

#[cfg(not(unix))]
pub fn capture_socket_path() -> std::path::PathBuf {
    std::path::PathBuf::from("caseclip.sock")
}

// --- Sending a selection to a running instance (used by main.rs) ---

#[cfg(unix)]
pub fn send_selection_to_running_instance(text: &str) -> Result<(), String> {
    use std::os::unix::net::UnixStream;

    let uid = current_uid();
    let mut candidates = Vec::new();
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        candidates.push(PathBuf::from(runtime_dir).join("caseclip.sock"));
    }
    candidates.push(PathBuf::from(format!("/run/user/{uid}/caseclip.sock")));
    candidates.push(PathBuf::from(format!("/tmp/caseclip-{uid}.sock")));
    candidates.sort();
    candidates.dedup();

    for path in candidates {
        let mut stream = match UnixStream::connect(&path) {
            Ok(stream) => stream,
            Err(_) => continue,
        };

        stream
            .write_all(text.as_bytes())
            .map_err(|e| format!("failed to send selection to running instance: {e}"))?;
        return Ok(());
    }

    Err("could not connect to a running instance capture socket".to_string())
}

#[cfg(not(unix))]
pub fn send_selection_to_running_instance(_text: &str) -> Result<(), String> {
    Err("capture bridge is not supported on this platform".to_string())
}

// --- Listener (Unix only): bound during startup, appends selections ---

/// Spawns the task that binds the capture socket and appends each incoming
/// selection through the app. On Unix only.
pub fn start_capture_listener(app: Arc<App>) {
    #[cfg(unix)]
    {
        let path = capture_socket_path();
        tokio::spawn(async move {
            let listener = match bind_capture_socket(&path).await {
                Some(listener) => listener,
                None => return,
            };

            loop {
                let mut stream = match listener.accept().await {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        warn!(error = %e, "Capture socket accept failed");
                        continue;
                    }
                };

                let mut payload = String::new();
                if let Err(e) = stream.read_to_string(&mut payload).await {
                    warn!(error = %e, "Capture socket read failed");
                    continue;
                }

                let text = payload.trim();
                if text.is_empty() {
                    warn!("Ignoring empty selection payload");
                    continue;
                }

                match app.append_selection(text.to_string()).await {
                    Ok(record) => {
                        debug!(id = %record.id, "Selection appended from capture socket")
                    }
                    Err(e) => warn!(error = %e, "Failed to store captured selection"),
                }
            }
        });
    }
    #[cfg(not(unix))]
    {
        let _ = app;
        warn!("Capture socket is not supported on this platform");
    }
}

/// Binds the socket, clearing a stale file left by a dead instance. Refuses to
/// steal the socket from an instance that still answers.
#[cfg(unix)]
async fn bind_capture_socket(path: &Path) -> Option<UnixListener> {
    match UnixListener::bind(path) {
        Ok(listener) => Some(listener),
        Err(bind_err) => {
            if path.exists() {
                match tokio::net::UnixStream::connect(path).await {
                    Ok(_) => {
                        warn!(path = %path.display(), "Capture socket already in use by another instance");
                        None
                    }
                    Err(_) => {
                        let _ = std::fs::remove_file(path);
                        match UnixListener::bind(path) {
                            Ok(listener) => Some(listener),
                            Err(e) => {
                                warn!(error = %e, path = %path.display(), "Failed to bind capture socket after cleanup");
                                None
                            }
                        }
                    }
                }
            } else {
                warn!(error = %bind_err, path = %path.display(), "Failed to bind capture socket");
                None
            }
        }
    }
}
