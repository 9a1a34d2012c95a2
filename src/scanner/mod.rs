use crate::error::{RenamerError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

/// 入力（ファイルまたはフォルダ直下）から対象PDFを集める
///
/// 重複は正規化パスで除き、ファイル名順に並べる。
pub fn scan_input(input: &Path, allowed_extensions: &[String]) -> Result<Vec<PdfInfo>> {
    if !input.exists() {
        return Err(if input.extension().is_some() {
            RenamerError::FileNotFound(input.display().to_string())
        } else {
            RenamerError::FolderNotFound(input.display().to_string())
        });
    }

    if input.is_file() {
        if !has_allowed_extension(input, allowed_extensions) {
            return Err(RenamerError::UnsupportedFile(input.display().to_string()));
        }
        return Ok(vec![pdf_info(input)?]);
    }

    let mut seen = BTreeSet::new();
    let mut files = Vec::new();

    for entry in WalkDir::new(input)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !has_allowed_extension(path, allowed_extensions) {
            continue;
        }
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if seen.insert(canonical) {
            files.push(pdf_info(path)?);
        }
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    tracing::info!("検出されたPDFファイル数: {}", files.len());
    for file in &files {
        tracing::debug!("  - {}", file.file_name);
    }

    Ok(files)
}

/// 拡張子の判定（設定値はドット付き・なしどちらでも可）
pub fn has_allowed_extension(path: &Path, allowed_extensions: &[String]) -> bool {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
        return false;
    };
    allowed_extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.') == ext)
}

fn pdf_info(path: &Path) -> Result<PdfInfo> {
    let size = std::fs::metadata(path)?.len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(PdfInfo {
        path: path.to_path_buf(),
        file_name,
        size,
    })
}
