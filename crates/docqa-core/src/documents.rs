//! Locating and reading source documents on disk.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub document_id: String,
    pub path: PathBuf,
    pub text: String,
}

/// Document ids are file names, so re-ingesting the same file replaces it.
pub fn document_id_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

pub fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| TEXT_EXTENSIONS.iter().any(|t| t.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Expand files and directories into a sorted list of text files.
/// Explicitly named files are kept whatever their extension.
pub fn collect_text_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(list_text_files(input));
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            anyhow::bail!("No such file or directory: {}", input.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

pub fn list_text_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        if is_text_file(entry.path()) { out.push(entry.path().to_path_buf()); }
    }
    out.sort();
    out
}

/// Read a document, decoding invalid UTF-8 lossily.
pub fn read_document(path: &Path) -> Result<SourceDocument> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), "document is not valid UTF-8; decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).to_string()
        }
    };
    Ok(SourceDocument { document_id: document_id_for(path), path: path.to_path_buf(), text })
}
