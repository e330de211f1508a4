use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use trade_journal::bootstrap::installer::RegistryInstaller;
use trade_journal::{Bootstrap, Recipe};

const RECIPE: &str = r#"
[image]
name = "trade-journal"

[installer]
kind = "registry"
registry = "REGISTRY"

[expose]
port = 8080
"#;

fn bootstrap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bootstrap"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn seed(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let registry = dir.join("registry");
    fs::create_dir_all(registry.join("flask").join("3.0.0")).unwrap();

    let source = dir.join("source");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("requirements.txt"), "flask>=2\n").unwrap();
    fs::write(source.join("journal.toml"), "").unwrap();
    fs::write(
        source.join("Bootstrap.toml"),
        RECIPE.replace("REGISTRY", &registry.display().to_string()),
    )
    .unwrap();

    (registry, source)
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let (_, source) = seed(dir.path());
    let image = dir.path().join("image");

    let output = bootstrap(&[
        "build",
        "--recipe",
        source.join("Bootstrap.toml").to_str().unwrap(),
        "--source",
        source.to_str().unwrap(),
        "--image",
        image.to_str().unwrap(),
        "--dry-run",
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Port:     8080"));
    assert!(stdout.contains("  - flask>=2"));
    assert!(!image.exists());
}

#[test]
fn test_dry_run_reports_bad_manifest() {
    let dir = TempDir::new().unwrap();
    let (_, source) = seed(dir.path());
    fs::write(source.join("requirements.txt"), "flask>>2\n").unwrap();
    let image = dir.path().join("image");

    let output = bootstrap(&[
        "build",
        "--recipe",
        source.join("Bootstrap.toml").to_str().unwrap(),
        "--source",
        source.to_str().unwrap(),
        "--image",
        image.to_str().unwrap(),
        "--dry-run",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!image.exists());
}

#[tokio::test]
async fn test_inspect_prints_image_metadata() {
    let dir = TempDir::new().unwrap();
    let (_, source) = seed(dir.path());
    let image = dir.path().join("image");

    let recipe = Recipe::from_file(source.join("Bootstrap.toml")).unwrap();
    let registry = recipe.installer.registry.clone().unwrap();
    Bootstrap::new(RegistryInstaller::new(registry), recipe)
        .build(&source, &image)
        .await
        .unwrap();

    let output = bootstrap(&["inspect", "--image", image.to_str().unwrap()]);
    assert!(output.status.success());

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(metadata["name"], "trade-journal");
    assert_eq!(metadata["exposed_ports"], serde_json::json!([8080]));
    assert_eq!(metadata["env"]["APP_MODULE"], "journal.toml");
    assert_eq!(metadata["installed"][0]["version"], "3.0.0");
}

#[test]
fn test_inspect_without_image_fails() {
    let dir = TempDir::new().unwrap();
    let output = bootstrap(&["inspect", "--image", dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));
}
