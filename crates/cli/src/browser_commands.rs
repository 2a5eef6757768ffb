//! CLI subcommands for the headless browser.

use {anyhow::Result, clap::Subcommand, dinehall_config::DinehallConfig};

use dinehall_browser::{LaunchOptions, detect};

#[derive(Subcommand)]
pub enum BrowserAction {
    /// Show the browser configuration and which executable would be launched.
    Status,
}

pub fn handle_browser(action: BrowserAction, config: &DinehallConfig) -> Result<()> {
    match action {
        BrowserAction::Status => status(config),
    }
}

fn status(config: &DinehallConfig) -> Result<()> {
    let browser = &config.browser;

    println!("Browser configuration:");
    println!("  headless:       {}", browser.headless);
    println!("  stealth:        {}", browser.stealth);
    println!("  launch_timeout: {}ms", browser.launch_timeout_ms);
    match browser.chrome_path {
        Some(ref path) => println!("  chrome_path:    {path}"),
        None => println!("  chrome_path:    (auto-detect)"),
    }
    if let Some(ref ua) = browser.user_agent {
        println!("  user_agent:     {ua}");
    }
    println!("  args:           {}", LaunchOptions::from(browser).args().join(" "));
    println!("  allowed host:   {}", config.upstream.host);

    let detection = detect::detect_browser(browser.chrome_path.as_deref());
    println!();
    match (detection.path, detection.source) {
        (Some(path), Some(source)) => {
            println!("Detected {} (via {source})", path.display());
        },
        (Some(path), None) => println!("Detected {}", path.display()),
        (None, _) => {
            println!("No Chromium-based browser found.\n");
            println!("{}", detection.install_hint);
            std::process::exit(1);
        },
    }

    Ok(())
}
