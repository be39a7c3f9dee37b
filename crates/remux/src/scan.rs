use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use walkdir::WalkDir;
use log::{debug, warn};

/// File extension recognized as a transport-stream recording
pub const INPUT_EXTENSION: &str = "ts";

/// A source recording found during enumeration
#[derive(Debug, Clone)]
pub struct SourceItem {
    /// Full path to the recording
    pub path: PathBuf,
    /// Raw filename including extension
    pub name: String,
    /// File size in bytes
    pub size: u64,
}

/// Enumerate .ts recordings directly inside the source directory.
///
/// Non-recursive. Unreadable entries are logged and skipped. Results are
/// sorted by name so runs process files in a stable order.
pub fn scan_source_dir(dir: &Path) -> Result<Vec<SourceItem>> {
    let mut items = Vec::new();

    let walker = WalkDir::new(dir).max_depth(1).follow_links(false);
    for entry in walker.into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error reading directory entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());
        if ext.as_deref() != Some(INPUT_EXTENSION) {
            continue;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => {
                warn!("Skipping file with non-UTF-8 name: {}", path.display());
                continue;
            }
        };

        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to stat file: {}", path.display()))?;

        debug!("Found recording: {} ({} bytes)", path.display(), metadata.len());
        items.push(SourceItem {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
        });
    }

    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}
