//! Locating a Chromium-based browser executable.

use std::{fmt, path::PathBuf};

/// Executable names looked up on `PATH`, most specific first.
const EXECUTABLE_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome-stable",
    "google-chrome",
    "chrome",
    "microsoft-edge-stable",
    "microsoft-edge",
    "brave-browser",
];

/// Well-known install locations, checked before `PATH`.
#[cfg(target_os = "macos")]
const INSTALL_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

#[cfg(target_os = "windows")]
const INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const INSTALL_PATHS: &[&str] = &["/usr/bin/chromium", "/snap/bin/chromium"];

/// Where a detected executable came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// `browser.chrome_path` in the config.
    Config,
    /// The `CHROME` environment variable.
    EnvVar,
    /// A platform install location.
    InstallPath,
    /// A lookup of known names on `PATH`.
    SearchPath,
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::EnvVar => write!(f, "CHROME env var"),
            Self::InstallPath => write!(f, "install path"),
            Self::SearchPath => write!(f, "PATH"),
        }
    }
}

/// Result of browser detection.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Path to the browser executable, if one was found.
    pub path: Option<PathBuf>,
    pub source: Option<DetectionSource>,
    /// Install instructions; empty when a browser was found.
    pub install_hint: String,
}

impl DetectionResult {
    pub fn found(&self) -> bool {
        self.path.is_some()
    }
}

/// Find a Chromium-based browser.
///
/// Order: the configured path, `CHROME`, platform install locations, then
/// known executable names on `PATH`. A configured path that does not exist
/// falls through to the other sources.
pub fn detect_browser(custom_path: Option<&str>) -> DetectionResult {
    detect_with(custom_path, std::env::var("CHROME").ok())
}

fn detect_with(custom_path: Option<&str>, env_path: Option<String>) -> DetectionResult {
    let explicit = [
        (custom_path.map(PathBuf::from), DetectionSource::Config),
        (env_path.map(PathBuf::from), DetectionSource::EnvVar),
    ];
    let installed = INSTALL_PATHS
        .iter()
        .map(|p| (Some(PathBuf::from(p)), DetectionSource::InstallPath));

    let hit = explicit
        .into_iter()
        .chain(installed)
        .find_map(|(path, source)| path.filter(|p| p.is_file()).map(|p| (p, source)))
        .or_else(|| {
            EXECUTABLE_NAMES
                .iter()
                .find_map(|name| which::which(name).ok())
                .map(|p| (p, DetectionSource::SearchPath))
        });

    match hit {
        Some((path, source)) => DetectionResult {
            path: Some(path),
            source: Some(source),
            install_hint: String::new(),
        },
        None => DetectionResult {
            path: None,
            source: None,
            install_hint: install_instructions(),
        },
    }
}

/// Platform-specific install instructions.
pub fn install_instructions() -> String {
    let commands = if cfg!(target_os = "macos") {
        "  brew install --cask chromium"
    } else if cfg!(target_os = "windows") {
        "  winget install Google.Chrome"
    } else {
        "  Debian/Ubuntu: sudo apt install chromium\n  \
         Fedora:        sudo dnf install chromium\n  \
         Arch:          sudo pacman -S chromium"
    };

    format!(
        "No Chromium-based browser found. Install one:\n\n{commands}\n\n\
         Or point to an existing executable:\n  \
         [browser]\n  \
         chrome_path = \"/path/to/chromium\"\n\n\
         Or set the CHROME environment variable."
    )
}
