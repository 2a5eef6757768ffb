use std::sync::Arc;

use {
    axum::{Router, http::Method, routing::get},
    dinehall_menu::MenuService,
    tokio::net::TcpListener,
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::{error, info},
};

use crate::routes::{AppState, health_handler, menu_handler, periods_handler};

/// Build the router (shared between production startup and tests).
pub fn build_app(menus: Arc<MenuService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/menu", get(menu_handler))
        .route("/api/periods", get(periods_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { menus })
}

/// Serve on `listener` until `shutdown` resolves, then close the shared
/// browser.
pub async fn serve(
    listener: TcpListener,
    menus: Arc<MenuService>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_app(Arc::clone(&menus));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("server stopped, closing browser");
    menus.shutdown().await;
    Ok(())
}

/// Bind `bind:port` and serve until Ctrl-C.
pub async fn start_server(bind: &str, port: u16, menus: Arc<MenuService>) -> anyhow::Result<()> {
    let listener = TcpListener::bind((bind, port)).await?;
    info!(
        addr = %listener.local_addr()?,
        upstream = menus.upstream().host(),
        location_id = menus.upstream().location_id(),
        "dinehall gateway listening"
    );
    serve(listener, menus, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
