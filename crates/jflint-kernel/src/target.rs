//! Reading the local files handed to a validator.
//!
//! A file that cannot be read never aborts the run. The reader hands back the
//! outcome to record instead, and the validator moves on to the next file.

use std::io;
use std::path::Path;

use crate::outcome::ValidationOutcome;

/// Read a Jenkinsfile as raw bytes (SSH streams them unchanged).
pub async fn read_bytes(path: &Path) -> Result<Vec<u8>, ValidationOutcome> {
    tokio::fs::read(path).await.map_err(|e| unreadable(path, e))
}

/// Read a Jenkinsfile as UTF-8 text (the HTTP form field is text).
pub async fn read_text(path: &Path) -> Result<String, ValidationOutcome> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| unreadable(path, e))
}

fn unreadable(path: &Path, err: io::Error) -> ValidationOutcome {
    if err.kind() == io::ErrorKind::NotFound {
        ValidationOutcome::missing()
    } else {
        ValidationOutcome::fail(format!("could not read {}: {err}", path.display()))
    }
}
