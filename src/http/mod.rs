//! Journal web routes.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod pages;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::domain::ports::{AdviceProvider, JournalStore};
use auth::TokenSigner;

/// 所有 handler 共用的狀態
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JournalStore>,
    pub advisor: Arc<dyn AdviceProvider>,
    pub tokens: Arc<TokenSigner>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn JournalStore>,
        advisor: Arc<dyn AdviceProvider>,
        tokens: TokenSigner,
    ) -> Self {
        Self {
            store,
            advisor,
            tokens: Arc::new(tokens),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::index))
        .route("/register", get(handlers::register_page).post(handlers::register))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/deposit", post(handlers::deposit))
        .route("/withdraw", post(handlers::withdraw))
        .route("/daily/:day", get(handlers::daily_page).post(handlers::save_daily))
        .route("/dashboard", get(handlers::dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
