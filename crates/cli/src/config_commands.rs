use std::{io::IsTerminal, path::Path};

use {anyhow::Result, clap::Subcommand};

use dinehall_config::{Severity, ValidationResult, validate};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the effective configuration after env substitution and overrides.
    Show,
}

pub fn handle_config(action: ConfigAction, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(path, verbose),
        ConfigAction::Show => show(path),
    }
}

fn check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(path);
    eprint!("{}", render_report(&result, verbose, std::io::stderr().is_terminal()));

    let errors = result.count(Severity::Error);
    if errors > 0 {
        anyhow::bail!("configuration has {errors} error(s)");
    }
    Ok(())
}

/// Diagnostics as `severity[path]: message` lines, most severe first, then a
/// one-line verdict.
fn render_report(result: &ValidationResult, verbose: bool, color: bool) -> String {
    let mut out = match result.config_path {
        Some(ref path) => format!("config: {}\n", path.display()),
        None => "config: (none found, defaults + environment)\n".to_string(),
    };

    let mut shown: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .collect();
    shown.sort_by_key(|d| d.severity);

    for d in shown {
        let label = paint(d.severity, color);
        if d.path.is_empty() {
            out.push_str(&format!("  {label}: {}\n", d.message));
        } else {
            out.push_str(&format!("  {label}[{}]: {}\n", d.path, d.message));
        }
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    out.push_str(&match (errors, warnings) {
        (0, 0) => "ok: ready to serve menus\n".to_string(),
        (0, w) => format!("ok with {w} warning(s)\n"),
        (e, w) => format!("failed: {e} error(s), {w} warning(s)\n"),
    });
    out
}

fn paint(severity: Severity, color: bool) -> String {
    if !color {
        return severity.to_string();
    }
    let code = match severity {
        Severity::Error => "31",
        Severity::Warning => "33",
        Severity::Info => "36",
    };
    format!("\x1b[1;{code}m{severity}\x1b[0m")
}

fn show(path: Option<&Path>) -> Result<()> {
    let config = crate::load_config(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
