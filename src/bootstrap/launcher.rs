use crate::bootstrap::engine::Phase;
use crate::bootstrap::image::{ImageConfig, DEPS_DIR};
use crate::config::PORT_VAR;
use crate::utils::error::{JournalError, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

/// 啟動映像的前景程序，不做監控也不重啟
#[derive(Debug)]
pub struct Launcher {
    image: ImageConfig,
    workdir: PathBuf,
}

impl Launcher {
    pub fn prepare(image_root: &Path) -> Result<Self> {
        let image = ImageConfig::load(image_root)?;
        let workdir = image.workdir_path(image_root);

        if !workdir.is_dir() {
            return Err(JournalError::LaunchError {
                message: format!("working directory '{}' does not exist", workdir.display()),
            });
        }
        if image.command.is_empty() {
            return Err(JournalError::LaunchError {
                message: "image has no launch command".to_string(),
            });
        }

        Ok(Self { image, workdir })
    }

    pub fn image(&self) -> &ImageConfig {
        &self.image
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// 組出要執行的指令：工作目錄、映像環境變數，並把已安裝依賴的 bin 放到 PATH 最前面。
    /// 宣告的埠號以 `APP_RUN_PORT` 傳給程序，不寫進映像的環境變數
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.image.command[0]);
        command
            .args(&self.image.command[1..])
            .current_dir(&self.workdir)
            .envs(&self.image.env);

        if let Some(port) = self.image.port() {
            command.env(PORT_VAR, port.to_string());
        }

        let deps_bin = self.workdir.join(DEPS_DIR).join("bin");
        if deps_bin.is_dir() {
            let mut paths = vec![deps_bin];
            if let Some(existing) = std::env::var_os("PATH") {
                paths.extend(std::env::split_paths(&existing));
            }
            if let Ok(joined) = std::env::join_paths(paths) {
                command.env("PATH", joined);
            }
        }

        command
    }

    fn describe(&self) -> String {
        self.image.command.join(" ")
    }

    /// 啟動並交出控制權。unix 上以 exec 取代目前的程序，成功時不會返回
    pub fn launch(&self) -> Result<i32> {
        let mut command = self.command();
        tracing::info!(
            phase = ?Phase::Running,
            "▶️  Launching '{}' in {} (port {})",
            self.describe(),
            self.workdir.display(),
            self.image
                .port()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string())
        );

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            let err = command.exec();
            Err(JournalError::LaunchError {
                message: format!("cannot exec '{}': {}", self.describe(), err),
            })
        }

        #[cfg(not(unix))]
        {
            let status = command.status().map_err(|e| JournalError::LaunchError {
                message: format!("cannot start '{}': {}", self.describe(), e),
            })?;
            Ok(status.code().unwrap_or(1))
        }
    }

    /// 以子程序方式啟動，呼叫端自行等待
    pub fn spawn(&self) -> Result<Child> {
        self.command().spawn().map_err(|e| JournalError::LaunchError {
            message: format!("cannot start '{}': {}", self.describe(), e),
        })
    }
}
