mod browser_commands;
mod config_commands;
mod fetch_commands;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    clap::{Parser, Subcommand},
    dinehall_config::DinehallConfig,
    dinehall_menu::MenuService,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "dinehall", about = "Dining hall menus through a filtered headless browser")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of the discovered one.
    #[arg(long, global = true, env = "DINEHALL_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default when no subcommand is provided).
    Serve,
    /// Fetch one menu and print it as JSON.
    Fetch(fetch_commands::FetchArgs),
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Browser detection.
    Browser {
        #[command(subcommand)]
        action: browser_commands::BrowserAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so `fetch` output stays pipeable.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Config from `--config` when given, otherwise from the standard locations.
fn load_config(path: Option<&Path>) -> anyhow::Result<DinehallConfig> {
    match path {
        Some(path) => {
            let mut config = dinehall_config::load_config(path)?;
            dinehall_config::apply_env_overrides(&mut config);
            Ok(config)
        },
        None => Ok(dinehall_config::discover_and_load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Serve) => {
            info!(version = env!("CARGO_PKG_VERSION"), "dinehall starting");
            let config = load_config(cli.config.as_deref())?;
            let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
            let port = cli.port.unwrap_or(config.server.port);

            let menus = Arc::new(MenuService::from_config(&config)?);
            dinehall_gateway::start_server(&bind, port, menus).await
        },
        Some(Commands::Fetch(args)) => {
            let config = load_config(cli.config.as_deref())?;
            fetch_commands::handle_fetch(&config, args).await
        },
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, cli.config.as_deref())
        },
        Some(Commands::Browser { action }) => {
            let config = load_config(cli.config.as_deref())?;
            browser_commands::handle_browser(action, &config)
        },
    }
}
