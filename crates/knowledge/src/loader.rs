//! Document loading and splitting for ingestion.
//!
//! Plain-text files are split with `text-splitter`; `.jsonl` files hold
//! pre-split `{ "text": ..., "metadata": {...} }` records, one per line.

use crate::types::Document;
use ragchat_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};
use text_splitter::{Characters, ChunkConfig, TextSplitter};
use walkdir::WalkDir;

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &["target", "node_modules", "dist"];

/// Load every file under `paths` and split it into documents.
///
/// Directories are walked recursively, skipping hidden entries. Files that
/// are not valid UTF-8 are skipped with a warning.
pub fn load_documents(
    paths: &[PathBuf],
    chunk_size: usize,
    chunk_overlap: usize,
) -> AppResult<Vec<Document>> {
    let config = ChunkConfig::new(chunk_size)
        .with_overlap(chunk_overlap)
        .map_err(|e| AppError::Config(format!("Invalid chunking settings: {}", e)))?;
    let splitter = TextSplitter::new(config);

    let mut documents = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(AppError::Input(format!("Path not found: {:?}", path)));
        }

        for file in collect_files(path) {
            let loaded = if is_jsonl(&file) {
                load_jsonl(&file)?
            } else {
                match fs::read_to_string(&file) {
                    Ok(text) => split_text(&splitter, &file, &text),
                    Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                        tracing::warn!("Skipping non-text file: {:?}", file);
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            };

            tracing::debug!("Loaded {} documents from {:?}", loaded.len(), file);
            documents.extend(loaded);
        }
    }

    tracing::info!("Loaded {} documents from {} paths", documents.len(), paths.len());
    Ok(documents)
}

fn collect_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            e.depth() == 0 || !(name.starts_with('.') || SKIP_DIRS.iter().any(|d| name == *d))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();

    files.sort();
    files
}

fn is_jsonl(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("jsonl")
}

fn split_text(
    splitter: &TextSplitter<Characters>,
    path: &Path,
    text: &str,
) -> Vec<Document> {
    let source = path.to_string_lossy().to_string();

    splitter
        .chunks(text)
        .filter(|chunk| !chunk.trim().is_empty())
        .enumerate()
        .map(|(position, chunk)| {
            Document::new(chunk)
                .with_metadata("source", source.clone())
                .with_metadata("chunk", position)
        })
        .collect()
}

fn load_jsonl(path: &Path) -> AppResult<Vec<Document>> {
    let contents = fs::read_to_string(path)?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str::<Document>(line).map_err(|e| {
                AppError::Input(format!("{:?} line {}: invalid record: {}", path, number + 1, e))
            })
        })
        .collect()
}
