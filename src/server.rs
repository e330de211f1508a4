//! Foreground journal server: loads the entry module and serves the router.

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use crate::advisor::GeminiAdvisor;
use crate::config::app_config::AppConfig;
use crate::config::ServeConfig;
use crate::http::auth::TokenSigner;
use crate::http::{router, AppState};
use crate::store::SqliteStore;
use crate::utils::error::{JournalError, Result};
use crate::utils::validation::Validate;

pub async fn build_state(config: &AppConfig) -> Result<AppState> {
    let store = SqliteStore::connect(&config.database.url, config.max_connections()).await?;
    let advisor = GeminiAdvisor::new(&config.advisor)?;
    if config.advisor.effective_api_key().is_none() {
        tracing::warn!("⚠️ No advisor API key configured, tips and lessons will be placeholders");
    }

    Ok(AppState::new(
        Arc::new(store),
        Arc::new(advisor),
        TokenSigner::new(&config.auth),
    ))
}

pub async fn serve(config: &ServeConfig) -> Result<()> {
    tracing::info!("📄 Loading entry module: {}", config.entry);
    let app_config = AppConfig::from_file(&config.entry)?;
    app_config.validate()?;

    let state = build_state(&app_config).await?;

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| JournalError::LaunchError {
            message: format!("failed to bind {}: {}", address, e),
        })?;

    tracing::info!("🚀 {} listening on {}", app_config.app.name, address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serve_fails_without_entry_module() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServeConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            entry: dir.path().join("missing.toml").display().to_string(),
            verbose: false,
            json_logs: false,
        };

        let err = serve(&config).await.unwrap_err();
        assert!(matches!(err, JournalError::EntryPointMissing { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_build_state_with_in_memory_database() {
        let config = AppConfig::from_toml_str(
            r#"
            [app]
            name = "journal"

            [database]
            url = "sqlite::memory:"

            [auth]
            jwt_secret = "secret"
            "#,
        )
        .unwrap();

        let state = build_state(&config).await.unwrap();
        assert_eq!(state.store.count_users().await.unwrap(), 0);
        assert_eq!(
            state.advisor.advise("x").await,
            crate::advisor::MISSING_KEY_MESSAGE
        );
    }
}
