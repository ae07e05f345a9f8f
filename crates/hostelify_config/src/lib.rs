//! Configuration loading for Hostelify.
//!
//! Configuration is layered: `config/default` in the workspace root, an
//! optional `config/{RUN_ENV}` override file, and environment variables with
//! the `APP` prefix (`APP_SERVER__PORT=9000` overrides `server.port`).

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;

pub mod models;
pub use models::*;

/// Load the application configuration from files and environment variables.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "APP".to_string());

    let base_dir = env::var("CARGO_MANIFEST_DIR")
        .map(|dir| {
            PathBuf::from(dir)
                .ancestors()
                .nth(2) // crates/hostelify_config -> workspace root
                .map(|p| p.to_path_buf())
                .unwrap_or_default()
        })
        .unwrap_or_default();

    let default_path = base_dir.join("config/default");
    let env_path = base_dir.join(format!("config/{}", run_env));

    let builder = Config::builder()
        .add_source(File::with_name(default_path.to_string_lossy().as_ref()).required(false))
        .add_source(File::with_name(env_path.to_string_lossy().as_ref()).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    builder.build()?.try_deserialize()
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Load the `.env` file into the process environment at most once.
pub fn ensure_dotenv_loaded() {
    INIT_DOTENV.get_or_init(|| {
        let _ = dotenv::dotenv();
    });
}
