//! Runtime snapshot persistence.
//!
//! The whole market state is written as a single version-wrapped JSON
//! file:
//!
//! ```json
//! { "version": 1, "state": { ... Runtime ... } }
//! ```
//!
//! The host (not the stores) owns durability: a CLI invocation loads the
//! snapshot, executes one call, and saves the snapshot back on success.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::host::runtime::Runtime;

/// Current snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// Wrapper written to disk.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    /// Format version number.
    version: u32,
    /// The stored runtime.
    state: Runtime,
}

/// Persist `runtime` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns `SerializationError` if serialization fails, or `Io` for
/// filesystem errors.
pub fn save(path: impl AsRef<Path>, runtime: &Runtime) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = SnapshotFile {
        version: SNAPSHOT_VERSION,
        state: runtime.clone(),
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| MarketError::SerializationError(e.to_string()))?;
    std::fs::write(path, json.as_bytes())?;
    log::debug!("snapshot: saved to {}", path.display());
    Ok(())
}

/// Load a runtime from the snapshot at `path`.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, and `InvalidFileFormat` for
/// malformed JSON or an unknown format version.
pub fn load(path: impl AsRef<Path>) -> Result<Runtime> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let file: SnapshotFile = serde_json::from_str(&json)
        .map_err(|e| MarketError::InvalidFileFormat(format!("malformed snapshot: {e}")))?;
    if file.version != SNAPSHOT_VERSION {
        return Err(MarketError::InvalidFileFormat(format!(
            "unsupported snapshot version: {}",
            file.version
        )));
    }
    log::debug!("snapshot: loaded from {}", path.display());
    Ok(file.state)
}
