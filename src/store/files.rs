use std::path::Path;

use tokio::fs::{DirBuilder, OpenOptions};
use tokio::io::AsyncWriteExt;

pub const DIR_MODE: u32 = 0o750;
pub const PUBLIC_FILE_MODE: u32 = 0o644;
pub const PRIVATE_FILE_MODE: u32 = 0o640;

/// Creates `path` and any missing parents, each with [`DIR_MODE`].
pub async fn create_dir_all(path: &Path) -> std::io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(path).await
}

/// Writes `contents` to `path`, creating it with `mode` if it does not exist.
pub async fn write_file(path: &Path, contents: &[u8], mode: u32) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    Ok(())
}
