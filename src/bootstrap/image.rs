use crate::domain::model::InstalledPackage;
use crate::utils::error::{JournalError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const IMAGE_METADATA_FILE: &str = "image.json";
pub const DEPS_DIR: &str = ".deps";

/// 建置完成的映像描述，只有寫入這個檔案之後映像才算可執行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub name: String,
    pub workdir: String,
    pub env: BTreeMap<String, String>,
    pub exposed_ports: Vec<u16>,
    pub command: Vec<String>,
    pub installed: Vec<InstalledPackage>,
    pub built_at: DateTime<Utc>,
}

impl ImageConfig {
    pub fn metadata_path(image_root: &Path) -> PathBuf {
        image_root.join(IMAGE_METADATA_FILE)
    }

    pub fn workdir_path(&self, image_root: &Path) -> PathBuf {
        image_root.join(&self.workdir)
    }

    pub fn load(image_root: &Path) -> Result<Self> {
        let path = Self::metadata_path(image_root);
        let content = std::fs::read_to_string(&path).map_err(|e| JournalError::LaunchError {
            message: format!("image at '{}' is not built ({})", image_root.display(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| JournalError::LaunchError {
            message: format!("image metadata '{}' is corrupt: {}", path.display(), e),
        })
    }

    /// 先寫暫存檔再改名，避免留下寫到一半的描述檔
    pub fn write(&self, image_root: &Path) -> Result<PathBuf> {
        let path = Self::metadata_path(image_root);
        let tmp = image_root.join(format!(".{}.tmp", IMAGE_METADATA_FILE));
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// 移除舊的描述檔，讓失敗的重建不會留下可執行的舊映像
    pub fn invalidate(image_root: &Path) -> Result<()> {
        let path = Self::metadata_path(image_root);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed stale {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn port(&self) -> Option<u16> {
        self.exposed_ports.first().copied()
    }
}
