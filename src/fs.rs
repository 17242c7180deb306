use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

pub(crate) fn create_dir_all(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::create_dir_all(path)
        .context(format!("Unable to create directory {}", path.display()))
}

fn file(path: impl AsRef<Path>) -> Result<std::fs::File> {
    let path = path.as_ref();
    std::fs::File::create(path).context(format!("Unable to create file {}", path.display()))
}

/// Writes `data` to `path`, creating the parent directory if needed.
pub(crate) fn write_all(path: impl AsRef<Path>, data: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let mut f = file(path)?;
    f.write_all(data.as_bytes())
        .context(format!("Unable to write data to {}", path.display()))
}
