//! Error types for the automation bridge and the operations built on it.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Errors surfaced to callers of the bridge.
///
/// Parsing never produces one of these: malformed output degrades to fewer
/// records instead.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A file-mode template does not exist under the script root.
    #[error("AppleScript file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// The interpreter ran past the configured bound and was killed.
    #[error("AppleScript execution timed out after {0:?}")]
    Timeout(Duration),

    /// The interpreter exited with a non-zero status.
    #[error("AppleScript error (exit {}): {stderr}", exit_label(.exit_code))]
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The interpreter could not be started at all.
    #[error("failed to launch {program}: {reason}")]
    LaunchError { program: String, reason: String },

    /// Operation arguments were rejected before any process was spawned.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_string(),
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
