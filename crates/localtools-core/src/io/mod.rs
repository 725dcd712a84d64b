//! IO modules - side effects (network, filesystem, subprocesses)

pub mod download;
pub mod extract;
pub mod process;

use std::path::Path;

use tokio::io::AsyncWriteExt;

/// Replace `path` with `contents` via a temp file in the same directory,
/// so readers see either the old or the new file, never a partial one.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir).await?;

    let tmp = tempfile::Builder::new()
        .prefix(".localtools-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    let mut file = tokio::fs::File::from_std(tmp.reopen()?);
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
