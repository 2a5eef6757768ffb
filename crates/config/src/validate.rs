//! Configuration validation.
//!
//! Checks the values the menu client cannot run without and flags settings
//! that are legal but suspicious.

use std::path::{Path, PathBuf};

use crate::{
    env_subst::unresolved_placeholder,
    loader::{apply_env_overrides, find_config_file, load_config},
    schema::DinehallConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "upstream.location_id"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Load the config at `path` (or the discovered one) and validate it.
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path.map(Path::to_path_buf).or_else(find_config_file);

    let mut config = match config_path.as_deref() {
        Some(p) => match load_config(p) {
            Ok(cfg) => cfg,
            Err(e) => {
                let mut result = ValidationResult {
                    config_path,
                    ..Default::default()
                };
                result.push(Severity::Error, "", format!("failed to parse: {e}"));
                return result;
            },
        },
        None => DinehallConfig::default(),
    };
    apply_env_overrides(&mut config);

    let mut result = check_config(&config);
    result.config_path = config_path;
    if result.config_path.is_none() {
        result.push(
            Severity::Info,
            "",
            "no config file found; defaults and environment overrides in use",
        );
    }
    result
}

/// Validate an already-loaded configuration.
#[must_use]
pub fn check_config(config: &DinehallConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    let upstream = &config.upstream;

    if upstream.location_id.trim().is_empty() {
        result.push(
            Severity::Error,
            "upstream.location_id",
            "dining location id is required (set it in the config or DINEHALL_LOCATION_ID)",
        );
    }

    if let Err(reason) = check_host(&upstream.host) {
        result.push(Severity::Error, "upstream.host", reason);
    }

    if !matches!(upstream.scheme.as_str(), "https" | "http") {
        result.push(
            Severity::Error,
            "upstream.scheme",
            format!("unsupported scheme {:?}, expected \"https\" or \"http\"", upstream.scheme),
        );
    } else if upstream.scheme == "http" {
        result.push(
            Severity::Warning,
            "upstream.scheme",
            "plain http exposes menu requests on the wire",
        );
    }

    if upstream.request_timeout_ms == 0 {
        result.push(
            Severity::Error,
            "upstream.request_timeout_ms",
            "timeout must be greater than zero",
        );
    }
    if config.browser.launch_timeout_ms == 0 {
        result.push(
            Severity::Error,
            "browser.launch_timeout_ms",
            "timeout must be greater than zero",
        );
    }
    if upstream.retries > 5 {
        result.push(
            Severity::Warning,
            "upstream.retries",
            format!("{} retries with exponential backoff can stall requests for a long time", upstream.retries),
        );
    }

    let strings = [
        ("upstream.host", Some(upstream.host.as_str())),
        ("upstream.location_id", Some(upstream.location_id.as_str())),
        ("browser.chrome_path", config.browser.chrome_path.as_deref()),
        ("browser.user_agent", config.browser.user_agent.as_deref()),
        ("server.bind", Some(config.server.bind.as_str())),
    ];
    for (path, value) in strings {
        if let Some(placeholder) = value.and_then(unresolved_placeholder) {
            result.push(
                Severity::Warning,
                path,
                format!("unresolved environment placeholder {placeholder}"),
            );
        }
    }

    result
}

/// The allow-list matches one exact host, so reject anything that is not one.
fn check_host(host: &str) -> Result<(), String> {
    if host.trim().is_empty() {
        return Err("upstream host is required".into());
    }
    if host.contains("://") || host.contains('/') {
        return Err(format!("{host:?} must be a bare host name without scheme or path"));
    }
    if host.contains('*') {
        return Err(format!("{host:?}: wildcards are not supported, pin a single host"));
    }
    url::Host::parse(host)
        .map(|_| ())
        .map_err(|e| format!("{host:?} is not a valid host: {e}"))
}
