//! Configuration loading, validation and env substitution.
//!
//! Config files: `dinehall.toml`, `dinehall.yaml`, `dinehall.yml` or `dinehall.json`.
//! Searched in `./` then `~/.config/dinehall/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in all values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{BrowserConfig, DinehallConfig, ServerConfig, UpstreamConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};
