use crate::utils::error::{JournalError, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// 將整個來源樹複製到目的地，同路徑檔案直接覆寫，回傳複製的檔案數
pub fn copy_tree(source: &Path, destination: &Path) -> std::io::Result<u64> {
    copy_tree_skipping(source, destination, None)
}

fn copy_tree_skipping(source: &Path, destination: &Path, skip: Option<&Path>) -> std::io::Result<u64> {
    let mut copied = 0;
    fs::create_dir_all(destination)?;

    let walker = WalkDir::new(source)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| skip.map(|s| entry.path() != s).unwrap_or(true));

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// 將應用程式原始碼複製到映像的工作目錄
pub fn materialize_source(source: &Path, workdir: &Path, image_root: &Path) -> Result<u64> {
    let wrap = |path: &Path, e: std::io::Error| JournalError::MaterializeError {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let source = source.canonicalize().map_err(|e| wrap(source, e))?;
    if !source.is_dir() {
        return Err(JournalError::MaterializeError {
            path: source.display().to_string(),
            message: "source is not a directory".to_string(),
        });
    }
    let image_root = image_root.canonicalize().map_err(|e| wrap(image_root, e))?;

    // 映像目錄在來源樹底下時，略過該子樹
    let skip = image_root.starts_with(&source).then_some(image_root.as_path());
    if skip.is_some() {
        tracing::debug!("Skipping image directory {} inside source tree", image_root.display());
    }

    copy_tree_skipping(&source, workdir, skip).map_err(|e| wrap(workdir, e))
}
