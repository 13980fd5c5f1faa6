//! Selfie and profile image persistence.
//!
//! Uploads are written under the configured storage root, grouped by kind
//! (`selfies`, `profiles`). Stored names are random so original filenames
//! never reach the filesystem; the original extension is kept for serving.

use std::path::PathBuf;
use util::config::AppConfig;
use uuid::Uuid;

/// Writes an uploaded file to disk and returns its public URL path.
pub async fn store_upload(
    kind: &str,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, std::io::Error> {
    let storage_root = AppConfig::global().upload_storage_root.clone();

    let extension = PathBuf::from(original_name)
        .extension()
        .and_then(|e| e.to_str().map(str::to_owned))
        .unwrap_or_else(|| "jpg".into());

    let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
    let dir = PathBuf::from(&storage_root).join(kind);
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(&stored_name), bytes).await?;

    Ok(format!("/uploads/{kind}/{stored_name}"))
}
