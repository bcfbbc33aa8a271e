//! File system helpers for writing formulas safely.
//!
//! Formula files are rewritten in place by `brewer update`, so every write goes
//! through a temp-file-and-rename step: the file either keeps its old content or
//! holds the complete new render, never a partial one.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Errors
///
/// Returns an error if the path exists but is not a directory, or creation fails.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }

    Ok(())
}

/// Safely writes a string to a file using atomic operations.
///
/// Convenience wrapper around [`atomic_write`].
///
/// # Examples
///
/// ```rust,no_run
/// use brewer::utils::fs::safe_write;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// safe_write(Path::new("Formula/mytool.rb"), "class Mytool < Formula\nend\n")?;
/// # Ok(())
/// # }
/// ```
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Writes content to a sibling temporary file (`.tmp` extension)
/// 2. Syncs the temporary file to disk
/// 3. Renames the temporary file over the target path
///
/// Parent directories are created if they don't exist.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading tilde, and systems where [`dirs::home_dir`] finds no
/// home directory, are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
