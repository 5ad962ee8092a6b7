//! JSON persistence: one file per enriched article.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── 0b0f4b0c-1c2d-5e6f-8a9b-0123456789ab.json
//! ├── 7d3e2f1a-....json
//! └── hits_20240101_20240131.json   # --hits-only mode
//! ```
//!
//! The filename comes from the last `/`-separated segment of the document's
//! `_id`, so saving the same article again overwrites its file.

use crate::error::{CountError, Result};
use crate::models::EnrichedDoc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

const EXTENSION: &str = "json";

/// Filename for a document id, e.g. `nyt://article/abc` -> `abc.json`.
pub fn filename_for_id(id: &str) -> Result<String> {
    id.split('/')
        .rfind(|segment| !segment.is_empty())
        .map(|stem| format!("{stem}.{EXTENSION}"))
        .ok_or_else(|| CountError::BadDocumentId { id: id.to_string() })
}

/// Write `doc` into `directory`, replacing any earlier copy.
///
/// # Arguments
///
/// * `doc` - Enriched document to persist
/// * `directory` - Existing output directory
///
/// # Returns
///
/// The path written: `directory/<last _id segment>.json`.
///
/// # Errors
///
/// Returns `BadDocumentId` if the id has no usable segment, or `Persistence`
/// if serialization or the write fails.
#[instrument(level = "debug", skip_all, fields(id = %doc.id))]
pub async fn save_doc(doc: &EnrichedDoc, directory: &Path) -> Result<PathBuf> {
    let path = directory.join(filename_for_id(&doc.id)?);
    write_json(doc, &path).await?;
    debug!(path = %path.display(), "Wrote article JSON");
    Ok(path)
}

/// Write the per-day hit counts collected in `--hits-only` mode.
#[instrument(level = "info", skip_all, fields(%start, %end))]
pub async fn save_hit_counts<T: Serialize>(
    counts: &T,
    directory: &Path,
    start: &str,
    end: &str,
) -> Result<PathBuf> {
    let path = directory.join(format!("hits_{start}_{end}.{EXTENSION}"));
    write_json(counts, &path).await?;
    info!(path = %path.display(), "Wrote hit counts");
    Ok(path)
}

async fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string(value).map_err(|e| CountError::Persistence {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })?;
    fs::write(path, json)
        .await
        .map_err(|source| CountError::Persistence {
            path: path.to_path_buf(),
            source,
        })
}
