use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Snapshot of one matched entry, taken when the worker confirms the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub name: String,
    pub path: PathBuf,
    pub directory: PathBuf,
    pub is_directory: bool,
    pub size: u64,
    pub last_modified: String,
}

impl MatchRecord {
    pub fn capture(name: String, path: PathBuf, directory: &Path, is_directory: bool) -> Self {
        let (size, last_modified) = match fs::metadata(&path) {
            Ok(metadata) => {
                let size = if is_directory { 0 } else { metadata.len() };
                let stamp = metadata
                    .modified()
                    .map(|t| DateTime::<Local>::from(t).format(TIMESTAMP_FORMAT).to_string())
                    .unwrap_or_default();
                (size, stamp)
            }
            Err(_) => (0, String::new()),
        };

        Self {
            name,
            path,
            directory: directory.to_path_buf(),
            is_directory,
            size,
            last_modified,
        }
    }

    pub fn size_text(&self) -> String {
        if self.is_directory {
            "Folder".to_string()
        } else {
            format_size(self.size)
        }
    }
}

pub fn format_size(size: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let bytes = size as f64;
    if bytes < KB {
        format!("{size} bytes")
    } else if bytes < MB {
        format!("{:.1} KB", bytes / KB)
    } else if bytes < GB {
        format!("{:.1} MB", bytes / MB)
    } else {
        format!("{:.1} GB", bytes / GB)
    }
}
