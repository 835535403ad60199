//! Output directory preparation.

use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

/// Return `root/name`, creating it if needed.
///
/// An existing directory is reused as-is; nothing in it is removed.
pub fn ensure_destination(root: &Path, name: &str) -> io::Result<PathBuf> {
    let path = root.join(name);
    if path.is_dir() {
        info!("Directory {} already exists", path.display());
    } else {
        std::fs::create_dir_all(&path)?;
        info!("Directory {} created", path.display());
    }
    Ok(path)
}
