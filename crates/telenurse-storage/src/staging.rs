//! Hidden, uniquely named temporary files that are synced before they are
//! published under their final name.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

/// Write `body` to a fresh `.<name>.tmp-<uuid>` file in `dir` and sync it.
///
/// The file is removed again if any step fails.
pub(crate) async fn stage(dir: &Path, name: &str, body: &[u8]) -> io::Result<PathBuf> {
    let path = dir.join(format!(".{name}.tmp-{}", Uuid::new_v4()));
    match write_synced(&path, body).await {
        Ok(()) => Ok(path),
        Err(e) => {
            discard(&path).await;
            Err(e)
        }
    }
}

async fn write_synced(path: &Path, body: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(body).await?;
    file.sync_all().await
}

/// Remove a staged file, logging rather than failing.
pub(crate) async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove temporary file"),
    }
}
