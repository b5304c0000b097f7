use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::StorageConfig;

/// Where an upload landed on disk and the URL path it is served from
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub disk_path: PathBuf,
    pub public_path: String,
}

/// Reduce a client-supplied filename to a safe single path component.
pub fn sanitize_filename(name: &str) -> String {
    // Browsers may send a full path; keep only the last component
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

pub async fn save_upload(
    config: &StorageConfig,
    original_name: &str,
    bytes: &[u8],
) -> io::Result<StoredUpload> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let stored_name = format!("{}-{}", Uuid::new_v4().simple(), sanitize_filename(original_name));
    let disk_path = config.upload_dir.join(&stored_name);
    tokio::fs::write(&disk_path, bytes).await?;
    debug!("Stored upload {} ({} bytes)", disk_path.display(), bytes.len());

    Ok(StoredUpload {
        disk_path,
        public_path: format!("{}/{}", config.public_path.trim_end_matches('/'), stored_name),
    })
}

/// Delete the file behind a public path. A file that is already gone is not an error.
pub async fn remove_upload(config: &StorageConfig, public_path: &str) -> io::Result<()> {
    let Some(stored_name) = public_path.rsplit('/').next().filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    let disk_path = config.upload_dir.join(sanitize_filename(stored_name));

    match tokio::fs::remove_file(&disk_path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Upload {} already missing from disk", disk_path.display());
            Ok(())
        }
        Err(e) => Err(e),
    }
}
