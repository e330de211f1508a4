pub mod advisor;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod http;
pub mod server;
pub mod store;
pub mod utils;

pub use bootstrap::{Bootstrap, ImageConfig, Launcher, Manifest};
pub use config::{app_config::AppConfig, recipe::Recipe, ServeConfig};
pub use utils::error::{JournalError, Result};
