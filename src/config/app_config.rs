use crate::config::{is_unresolved, load_dotenv, substitute_env_vars};
use crate::utils::error::{JournalError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ADVISOR_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// 入口模組：定義一個應用程式實例所需的全部設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSection,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_advisor_endpoint")]
    pub endpoint: String,
    pub timeout_secs: Option<u64>,
}

fn default_advisor_endpoint() -> String {
    DEFAULT_ADVISOR_ENDPOINT.to_string()
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_advisor_endpoint(),
            timeout_secs: None,
        }
    }
}

impl AdvisorConfig {
    /// 空字串或未替換的 `${VAR}` 都視為沒有金鑰
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !is_unresolved(key))
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(30)
    }
}

impl AppConfig {
    /// 載入入口模組；檔案不存在時直接失敗，沒有預設值可以退回。
    /// 同目錄下的 `.env` 會先載入，供 `${VAR}` 替換使用
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(JournalError::EntryPointMissing {
                path: path.display().to_string(),
            });
        }

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        load_dotenv(dir)?;

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| JournalError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn max_connections(&self) -> u32 {
        self.database.max_connections.unwrap_or(5)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("app.name", &self.app.name)?;
        validation::validate_non_empty_string("database.url", &self.database.url)?;
        validation::validate_non_empty_string("auth.jwt_secret", &self.auth.jwt_secret)?;

        if is_unresolved(&self.auth.jwt_secret) {
            return Err(JournalError::ConfigValidationError {
                field: "auth.jwt_secret".to_string(),
                message: format!("environment variable in '{}' is not set", self.auth.jwt_secret),
            });
        }

        if let Some(max) = self.database.max_connections {
            validation::validate_range("database.max_connections", max, 1, 100)?;
        }

        validation::validate_url("advisor.endpoint", &self.advisor.endpoint)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[app]
name = "trade-journal"

[database]
url = "sqlite::memory:"

[auth]
jwt_secret = "s3cret"
"#;

    #[test]
    fn test_parse_basic_app_config() {
        let config = AppConfig::from_toml_str(BASIC).unwrap();
        assert_eq!(config.app.name, "trade-journal");
        assert_eq!(config.advisor.endpoint, DEFAULT_ADVISOR_ENDPOINT);
        assert_eq!(config.max_connections(), 5);
        assert!(config.advisor.effective_api_key().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unset_secret_fails_validation() {
        let content = BASIC.replace("s3cret", "${TJ_TEST_NEVER_SET_SECRET}");
        let config = AppConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unset_api_key_means_no_key() {
        let content = format!(
            "{}\n[advisor]\napi_key = \"${{TJ_TEST_NEVER_SET_KEY}}\"\n",
            BASIC
        );
        let config = AppConfig::from_toml_str(&content).unwrap();
        assert!(config.advisor.effective_api_key().is_none());
    }

    #[test]
    fn test_missing_entry_module() {
        let err = AppConfig::from_file("/definitely/not/here/journal.toml").unwrap_err();
        assert!(matches!(err, JournalError::EntryPointMissing { .. }));
    }

    #[test]
    fn test_secret_resolved_from_dotenv_next_to_entry_module() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "TJ_TEST_DOTENV_JWT=from-dotenv\n").unwrap();
        let entry = dir.path().join("journal.toml");
        std::fs::write(&entry, BASIC.replace("s3cret", "${TJ_TEST_DOTENV_JWT}")).unwrap();

        let config = AppConfig::from_file(&entry).unwrap();
        assert_eq!(config.auth.jwt_secret, "from-dotenv");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sample_entry_module_uses_jwt_secret() {
        let sample = include_str!("../../deploy/journal.toml");
        assert!(sample.contains("${JWT_SECRET}"));

        let config = AppConfig::from_toml_str(sample).unwrap();
        let expected = std::env::var("JWT_SECRET").unwrap_or_else(|_| "${JWT_SECRET}".to_string());
        assert_eq!(config.auth.jwt_secret, expected);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.auth.jwt_secret, "s3cret");
    }
}
