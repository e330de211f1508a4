use crate::bootstrap::materialize::copy_tree;
use crate::config::recipe::{InstallerConfig, InstallerKind};
use crate::domain::model::{InstalledPackage, PackageSpec, VersionOp};
use crate::domain::ports::Installer;
use crate::utils::error::{JournalError, Result};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tokio::process::Command;

const TARGET_PLACEHOLDER: &str = "{target}";
const PACKAGE_PLACEHOLDER: &str = "{package}";

/// 依配方建立對應的安裝器
pub fn from_config(config: &InstallerConfig) -> Result<Box<dyn Installer>> {
    match config.kind {
        InstallerKind::Command => {
            let program = config.program.clone().ok_or_else(|| JournalError::MissingConfigError {
                field: "installer.program".to_string(),
            })?;
            Ok(Box::new(CommandInstaller::new(program, config.args.clone())))
        }
        InstallerKind::Registry => {
            let registry = config.registry.clone().ok_or_else(|| JournalError::MissingConfigError {
                field: "installer.registry".to_string(),
            })?;
            Ok(Box::new(RegistryInstaller::new(registry)))
        }
    }
}

#[async_trait]
impl Installer for Box<dyn Installer> {
    async fn install(&self, package: &PackageSpec, target_dir: &Path) -> Result<InstalledPackage> {
        (**self).install(package, target_dir).await
    }
}

/// 對每個套件執行一次外部安裝指令
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
}

impl CommandInstaller {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn render_args(&self, package: &PackageSpec, target_dir: &Path) -> Vec<String> {
        let specifier = package.to_string();
        let target = target_dir.display().to_string();

        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                arg.replace(TARGET_PLACEHOLDER, &target)
                    .replace(PACKAGE_PLACEHOLDER, &specifier)
            })
            .collect();

        if !self.args.iter().any(|arg| arg.contains(PACKAGE_PLACEHOLDER)) {
            args.push(specifier);
        }
        args
    }
}

#[async_trait]
impl Installer for CommandInstaller {
    async fn install(&self, package: &PackageSpec, target_dir: &Path) -> Result<InstalledPackage> {
        let args = self.render_args(package, target_dir);
        tracing::debug!("Running installer: {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| JournalError::InstallError {
                package: package.to_string(),
                message: format!("cannot run '{}': {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(JournalError::InstallError {
                package: package.to_string(),
                message: format!("{} ({})", stderr.trim(), output.status),
            });
        }

        Ok(InstalledPackage {
            name: package.name.clone(),
            version: package
                .constraint
                .as_ref()
                .filter(|(op, _)| *op == VersionOp::Eq)
                .map(|(_, version)| version.clone()),
            specifier: package.to_string(),
        })
    }
}

/// 從本地目錄庫 `<registry>/<name>/<version>/` 解析並複製套件
#[derive(Debug, Clone)]
pub struct RegistryInstaller {
    root: PathBuf,
}

impl RegistryInstaller {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 找出符合條件的最高版本
    pub fn resolve(&self, package: &PackageSpec) -> Result<(String, PathBuf)> {
        let not_found = |message: String| JournalError::InstallError {
            package: package.to_string(),
            message,
        };

        let mut package_dir = self.root.join(&package.name);
        if !package_dir.is_dir() {
            package_dir = self.root.join(package.name.to_ascii_lowercase());
        }
        if !package_dir.is_dir() {
            return Err(not_found(format!(
                "not present in registry {}",
                self.root.display()
            )));
        }

        let entries = std::fs::read_dir(&package_dir).map_err(|e| not_found(e.to_string()))?;
        let mut best: Option<String> = None;

        for entry in entries {
            let entry = entry.map_err(|e| not_found(e.to_string()))?;
            if !entry.path().is_dir() {
                continue;
            }
            let Some(version) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !version_matches(&version, package.constraint.as_ref()) {
                continue;
            }
            let better = best
                .as_deref()
                .map(|current| compare_versions(&version, current) == Ordering::Greater)
                .unwrap_or(true);
            if better {
                best = Some(version);
            }
        }

        let version = best.ok_or_else(|| not_found("no version satisfies the constraint".to_string()))?;
        let path = package_dir.join(&version);
        Ok((version, path))
    }
}

#[async_trait]
impl Installer for RegistryInstaller {
    async fn install(&self, package: &PackageSpec, target_dir: &Path) -> Result<InstalledPackage> {
        let (version, source) = self.resolve(package)?;
        let destination = target_dir.join(&package.name);

        tracing::debug!(
            "Copying {} {} from {}",
            package.name,
            version,
            source.display()
        );

        let failed = |e: std::io::Error| JournalError::InstallError {
            package: package.to_string(),
            message: e.to_string(),
        };

        // 先移除舊版本，避免兩個版本的檔案混在一起
        if destination.exists() {
            std::fs::remove_dir_all(&destination).map_err(failed)?;
        }
        copy_tree(&source, &destination).map_err(failed)?;

        Ok(InstalledPackage {
            name: package.name.clone(),
            version: Some(version),
            specifier: package.to_string(),
        })
    }
}

/// 以點分隔逐段比較版本；數字段按數值比較，其他按字串比較
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or("0");
        let r = right.get(i).copied().unwrap_or("0");
        let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => l.cmp(r),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

pub fn version_matches(candidate: &str, constraint: Option<&(VersionOp, String)>) -> bool {
    let Some((op, wanted)) = constraint else {
        return true;
    };

    if let Some(prefix) = wanted.strip_suffix(".*") {
        let is_prefix = has_prefix(candidate, prefix);
        return match op {
            VersionOp::Eq => is_prefix,
            VersionOp::Ne => !is_prefix,
            _ => false,
        };
    }

    let ordering = compare_versions(candidate, wanted);
    match op {
        VersionOp::Eq => ordering == Ordering::Equal,
        VersionOp::Ne => ordering != Ordering::Equal,
        VersionOp::Ge => ordering != Ordering::Less,
        VersionOp::Le => ordering != Ordering::Greater,
        VersionOp::Gt => ordering == Ordering::Greater,
        VersionOp::Lt => ordering == Ordering::Less,
        VersionOp::Compatible => {
            // ~=1.4.2 等同 >=1.4.2 且 ==1.4.*
            let parts: Vec<&str> = wanted.split('.').collect();
            let prefix = parts[..parts.len().saturating_sub(1)].join(".");
            ordering != Ordering::Less && (prefix.is_empty() || has_prefix(candidate, &prefix))
        }
    }
}

fn has_prefix(candidate: &str, prefix: &str) -> bool {
    let wanted: Vec<&str> = prefix.split('.').collect();
    let actual: Vec<&str> = candidate.split('.').collect();
    actual.len() >= wanted.len()
        && wanted
            .iter()
            .zip(actual.iter())
            .all(|(w, a)| compare_versions(w, a) == Ordering::Equal)
}
