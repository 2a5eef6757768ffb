use std::sync::Arc;

use {
    axum::{
        extract::{Query, State},
        response::{IntoResponse, Json},
    },
    dinehall_menu::{MenuResponse, MenuService, PeriodSummary},
    serde::Deserialize,
};

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub menus: Arc<MenuService>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MenuQuery {
    pub date: Option<String>,
    pub meal: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodsQuery {
    pub date: Option<String>,
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(message)),
    }
}

pub async fn menu_handler(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<MenuResponse>, ApiError> {
    let date = required(&query.date, "Date parameter is required")?;
    let meal = required(&query.meal, "Meal parameter is required")?;
    Ok(Json(state.menus.get_menu(date, meal).await?))
}

pub async fn periods_handler(
    State(state): State<AppState>,
    Query(query): Query<PeriodsQuery>,
) -> Result<Json<Vec<PeriodSummary>>, ApiError> {
    let date = required(&query.date, "Date parameter is required")?;
    Ok(Json(state.menus.list_periods(date).await?))
}

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
