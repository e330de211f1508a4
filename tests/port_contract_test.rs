//! Kept in its own test binary: it writes the launch environment into the
//! process environment before parsing the server CLI.

use clap::Parser;
use std::fs;
use tempfile::TempDir;
use trade_journal::bootstrap::installer::RegistryInstaller;
use trade_journal::{Bootstrap, Launcher, Recipe, ServeConfig};

#[tokio::test]
async fn test_server_config_matches_declared_port() {
    let dir = TempDir::new().unwrap();
    let registry = dir.path().join("registry");
    fs::create_dir_all(registry.join("requests").join("2.31.0")).unwrap();
    let source = dir.path().join("source");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("requirements.txt"), "requests\n").unwrap();
    let image = dir.path().join("image");

    let recipe = Recipe::from_toml_str(&format!(
        "[image]\nname = \"trade-journal\"\n\n[installer]\nkind = \"registry\"\nregistry = \"{}\"\n\n[expose]\nport = 8080\n",
        registry.display()
    ))
    .unwrap();
    let built = Bootstrap::new(RegistryInstaller::new(&registry), recipe)
        .build(&source, &image)
        .await
        .unwrap();

    let launcher = Launcher::prepare(&image).unwrap();
    for (key, value) in launcher.command().get_envs() {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }

    let served = ServeConfig::parse_from(["trade-journal"]);
    assert_eq!(built.exposed_ports, vec![served.port]);
    assert_eq!(served.host, "0.0.0.0");
    assert_eq!(served.entry, "journal.toml");
}
