//! Working directories for promotion runs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Create (if needed) and return `<root>/<project>/<promotion>`.
///
/// The directory is reused across invocations of the same promotion so that
/// resumed steps find the files earlier steps left behind.
pub fn prepare_work_dir(root: &Path, project: &str, promotion: &str) -> Result<PathBuf> {
    let dir = root
        .join(sanitize(project, "default"))
        .join(sanitize(promotion, "promotion"));
    fs::create_dir_all(&dir)
        .with_context(|| format!("create working directory {}", dir.display()))?;
    debug!(work_dir = %dir.display(), "prepared working directory");
    Ok(dir)
}

// Keep names to a single, non-traversing path component.
fn sanitize(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return fallback.to_string();
    }
    cleaned
}
