pub mod app_config;
pub mod recipe;

use crate::utils::error::{JournalError, Result};
use clap::Parser;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 入口模組的環境變數名稱
pub const ENTRY_MODULE_VAR: &str = "APP_MODULE";
/// 綁定位址的環境變數名稱
pub const BIND_HOST_VAR: &str = "APP_RUN_HOST";
pub const PORT_VAR: &str = "APP_RUN_PORT";

pub const DEFAULT_ENTRY_MODULE: &str = "journal.toml";
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "trade-journal")]
#[command(about = "Trading journal web service")]
pub struct ServeConfig {
    /// Interface to bind
    #[arg(long, env = BIND_HOST_VAR, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = PORT_VAR, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Application entry module (TOML) relative to the working directory
    #[arg(long, env = ENTRY_MODULE_VAR, default_value = DEFAULT_ENTRY_MODULE)]
    pub entry: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl ServeConfig {
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// 替換環境變數 (例如 ${JWT_SECRET})，未設定的變數保留原樣
pub(crate) fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| JournalError::ConfigError {
        message: format!("invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

pub const DOTENV_FILE: &str = ".env";

/// 載入 `dir/.env` 到程序環境；已存在的環境變數不會被覆蓋。檔案不存在時回傳 false
pub fn load_dotenv(dir: &Path) -> Result<bool> {
    let path = dir.join(DOTENV_FILE);
    match dotenvy::from_path(&path) {
        Ok(()) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Ok(true)
        }
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(JournalError::ConfigError {
            message: format!("failed to load '{}': {}", path.display(), err),
        }),
    }
}

/// 是否為未被替換的 `${VAR}` 佔位字串
pub(crate) fn is_unresolved(value: &str) -> bool {
    value.starts_with("${") && value.ends_with('}')
}
