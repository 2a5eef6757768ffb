//! HTTP boundary for dinehall: JSON menu lookups over the shared browser.
//!
//! Routes:
//! - `GET /api/menu?date=YYYY-MM-DD&meal=lunch`
//! - `GET /api/periods?date=YYYY-MM-DD`
//! - `GET /health`

pub mod error;
pub mod routes;
pub mod server;

pub use {
    error::ApiError,
    server::{build_app, serve, start_server},
};
