use crate::bootstrap::image::{ImageConfig, DEPS_DIR};
use crate::bootstrap::manifest::Manifest;
use crate::bootstrap::materialize::materialize_source;
use crate::config::recipe::Recipe;
use crate::config::{BIND_HOST_VAR, ENTRY_MODULE_VAR};
use crate::domain::ports::Installer;
use crate::utils::error::{BuildStep, JournalError, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;

/// 映像的兩個狀態：建置中與執行中，執行中沒有內部轉移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Building,
    Running,
}

pub struct Bootstrap<I: Installer> {
    installer: I,
    recipe: Recipe,
}

impl<I: Installer> Bootstrap<I> {
    pub fn new(installer: I, recipe: Recipe) -> Self {
        Self { installer, recipe }
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    /// 依序執行建置步驟，任何一步失敗即中止
    pub async fn build(&self, source_dir: &Path, image_root: &Path) -> Result<ImageConfig> {
        tracing::info!(
            phase = ?Phase::Building,
            "🚀 Building image '{}' from {}",
            self.recipe.image.name,
            source_dir.display()
        );

        // Step 1: 工作目錄
        let workdir = image_root.join(&self.recipe.image.workdir);
        self.prepare_workdir(source_dir, image_root, &workdir)
            .map_err(|e| e.at_step(BuildStep::Workdir))?;
        tracing::info!("📁 Working directory: {}", workdir.display());

        // Step 2: 安裝依賴
        let installed = self
            .install_dependencies(source_dir, &workdir)
            .await
            .map_err(|e| e.at_step(BuildStep::InstallDependencies))?;
        tracing::info!("📦 Installed {} packages", installed.len());

        // Step 3: 複製原始碼
        let copied = materialize_source(source_dir, &workdir, image_root)
            .map_err(|e| e.at_step(BuildStep::MaterializeSource))?;
        tracing::info!("📄 Copied {} files into the image", copied);

        // Step 4: 環境變數
        let env = self.environment();
        for (key, value) in &env {
            tracing::info!("🔧 ENV {}={}", key, value);
        }

        // Step 5: 宣告埠號
        let port = self.recipe.expose.port;
        if port == 0 {
            return Err(JournalError::InvalidConfigValueError {
                field: "expose.port".to_string(),
                value: port.to_string(),
                reason: "port must be non-zero".to_string(),
            }
            .at_step(BuildStep::DeclarePort));
        }
        tracing::info!("🔌 EXPOSE {}", port);

        let image = ImageConfig {
            name: self.recipe.image.name.clone(),
            workdir: self.recipe.image.workdir.clone(),
            env,
            exposed_ports: vec![port],
            command: self.recipe.launch.command.clone(),
            installed,
            built_at: Utc::now(),
        };

        let metadata = image
            .write(image_root)
            .map_err(|e| e.at_step(BuildStep::WriteImage))?;
        tracing::info!("✅ Image metadata written to {}", metadata.display());

        Ok(image)
    }

    /// 每次建置都從空的工作目錄開始，不留下前一次的原始碼或依賴
    fn prepare_workdir(&self, source_dir: &Path, image_root: &Path, workdir: &Path) -> Result<()> {
        std::fs::create_dir_all(image_root)?;
        ImageConfig::invalidate(image_root)?;

        if workdir.exists() {
            let source = source_dir.canonicalize()?;
            let existing = workdir.canonicalize()?;
            if source.starts_with(&existing) {
                return Err(JournalError::MaterializeError {
                    path: existing.display().to_string(),
                    message: "working directory contains the source tree and cannot be cleared".to_string(),
                });
            }
            tracing::debug!("Clearing previous build in {}", existing.display());
            std::fs::remove_dir_all(workdir)?;
        }

        std::fs::create_dir_all(workdir)?;
        Ok(())
    }

    async fn install_dependencies(
        &self,
        source_dir: &Path,
        workdir: &Path,
    ) -> Result<Vec<crate::domain::model::InstalledPackage>> {
        let manifest_path = source_dir.join(&self.recipe.image.manifest);
        tracing::info!("📋 Reading manifest {}", manifest_path.display());
        let manifest = Manifest::from_file(&manifest_path)?;

        let deps_dir = workdir.join(DEPS_DIR);
        std::fs::create_dir_all(&deps_dir)?;

        let mut installed = Vec::with_capacity(manifest.len());
        for package in &manifest.packages {
            tracing::info!("⬇️  Installing {}", package);
            installed.push(self.installer.install(package, &deps_dir).await?);
        }
        Ok(installed)
    }

    fn environment(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(
            ENTRY_MODULE_VAR.to_string(),
            self.recipe.environment.entry_module.clone(),
        );
        env.insert(
            BIND_HOST_VAR.to_string(),
            self.recipe.environment.bind_host.clone(),
        );
        env
    }
}
