use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::DinehallConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "dinehall.toml",
    "dinehall.yaml",
    "dinehall.yml",
    "dinehall.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<DinehallConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply env overrides.
///
/// Search order:
/// 1. `./dinehall.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/dinehall/dinehall.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `DinehallConfig::default()` when no file is found or the
/// file fails to parse.
pub fn discover_and_load() -> DinehallConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                DinehallConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            DinehallConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));

    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/dinehall/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "dinehall").map(|d| d.config_dir().to_path_buf())
}

/// Apply `DINEHALL_UPSTREAM_HOST`, `DINEHALL_LOCATION_ID` and `PORT`.
pub fn apply_env_overrides(config: &mut DinehallConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_overrides_with(config: &mut DinehallConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("DINEHALL_UPSTREAM_HOST").filter(|v| !v.trim().is_empty()) {
        config.upstream.host = host.trim().to_string();
    }
    if let Some(id) = lookup("DINEHALL_LOCATION_ID").filter(|v| !v.trim().is_empty()) {
        config.upstream.location_id = id.trim().to_string();
    }
    if let Some(port) = lookup("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %port, error = %e, "ignoring invalid PORT"),
        }
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<DinehallConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dinehall.toml");
        std::fs::write(
            &path,
            "[upstream]\nlocation_id = \"abc123\"\nrequest_timeout_ms = 5000\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.upstream.location_id, "abc123");
        assert_eq!(cfg.upstream.request_timeout_ms, 5000);
    }

    #[test]
    fn loads_yaml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("dinehall.yaml");
        std::fs::write(&yaml, "upstream:\n  location_id: from-yaml\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().upstream.location_id, "from-yaml");

        let json = dir.path().join("dinehall.json");
        std::fs::write(&json, r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().server.port, 9000);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dinehall.ini");
        std::fs::write(&path, "x=1").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/dinehall.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dinehall.toml"));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = DinehallConfig::default();
        apply_overrides_with(&mut cfg, |name| match name {
            "DINEHALL_LOCATION_ID" => Some(" loc-9 ".into()),
            "DINEHALL_UPSTREAM_HOST" => Some("api.example.edu".into()),
            "PORT" => Some("4000".into()),
            _ => None,
        });
        assert_eq!(cfg.upstream.location_id, "loc-9");
        assert_eq!(cfg.upstream.host, "api.example.edu");
        assert_eq!(cfg.server.port, 4000);
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut cfg = DinehallConfig::default();
        apply_overrides_with(&mut cfg, |name| (name == "PORT").then(|| "http".to_string()));
        assert_eq!(cfg.server.port, 3001);
    }
}
