use crate::config::{substitute_env_vars, DEFAULT_BIND_HOST, DEFAULT_ENTRY_MODULE, DEFAULT_PORT};
use crate::utils::error::{JournalError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 映像建置配方 (Bootstrap.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub image: ImageSection,
    pub installer: InstallerConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub expose: ExposeConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSection {
    pub name: String,
    #[serde(default = "default_workdir")]
    pub workdir: String,
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerKind {
    Command,
    Registry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallerConfig {
    pub kind: InstallerKind,
    pub program: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub registry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default = "default_entry_module")]
    pub entry_module: String,
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposeConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    #[serde(default = "default_command")]
    pub command: Vec<String>,
}

fn default_workdir() -> String {
    "app".to_string()
}

fn default_manifest() -> String {
    "requirements.txt".to_string()
}

fn default_entry_module() -> String {
    DEFAULT_ENTRY_MODULE.to_string()
}

fn default_bind_host() -> String {
    DEFAULT_BIND_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_command() -> Vec<String> {
    vec!["trade-journal".to_string()]
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            entry_module: default_entry_module(),
            bind_host: default_bind_host(),
        }
    }
}

impl Default for ExposeConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
        }
    }
}

impl Recipe {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| JournalError::ConfigError {
            message: format!("cannot read recipe '{}': {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| JournalError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }
}

impl Validate for Recipe {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("image.name", &self.image.name)?;
        validation::validate_relative_path("image.workdir", &self.image.workdir)?;
        validation::validate_relative_path("image.manifest", &self.image.manifest)?;
        validation::validate_relative_path("environment.entry_module", &self.environment.entry_module)?;
        validation::validate_host("environment.bind_host", &self.environment.bind_host)?;
        validation::validate_range("expose.port", self.expose.port, 1, u16::MAX)?;

        match self.launch.command.first() {
            Some(program) => validation::validate_non_empty_string("launch.command", program)?,
            None => {
                return Err(JournalError::MissingConfigError {
                    field: "launch.command".to_string(),
                })
            }
        }

        match self.installer.kind {
            InstallerKind::Command => {
                let program = validation::validate_required_field("installer.program", &self.installer.program)?;
                validation::validate_non_empty_string("installer.program", program)?;
            }
            InstallerKind::Registry => {
                let registry = validation::validate_required_field("installer.registry", &self.installer.registry)?;
                validation::validate_path("installer.registry", registry)?;
            }
        }

        Ok(())
    }
}
