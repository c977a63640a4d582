use crate::error::{GeoEvalError, Result};
use crate::loader::{Source, SourceFormat};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub format: SourceFormat,
}

impl SourceFile {
    pub fn to_source(&self) -> Source {
        Source::Path(self.path.clone())
    }
}

const CSV_EXTENSIONS: &[&str] = &["csv"];
const JSONL_EXTENSIONS: &[&str] = &["jsonl", "ndjson"];

/// フォルダ直下の入力ファイルを列挙
///
/// `formats` に含まれる形式のみ。ファイル名順。
pub fn scan_folder(folder: &Path, formats: &[SourceFormat]) -> Result<Vec<SourceFile>> {
    if !folder.is_dir() {
        return Err(GeoEvalError::FolderNotFound(folder.display().to_string()));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let Some(format) = path
            .extension()
            .and_then(|ext| format_for_extension(&ext.to_string_lossy()))
        else {
            continue;
        };

        if !formats.contains(&format) {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        files.push(SourceFile {
            path: path.to_path_buf(),
            file_name,
            format,
        });
    }

    // ファイル名でソート
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(files)
}

fn format_for_extension(ext: &str) -> Option<SourceFormat> {
    let ext = ext.to_lowercase();
    if CSV_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceFormat::Csv)
    } else if JSONL_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceFormat::Jsonl)
    } else {
        None
    }
}
