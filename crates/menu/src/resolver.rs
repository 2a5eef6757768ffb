//! Meal name to upstream period resolution.

use {dinehall_browser::BrowsingContext, tracing::debug};

use crate::{
    error::MenuError,
    types::{PeriodSummary, PeriodsResponse},
    upstream::Upstream,
};

/// Fetch the periods served on `date`.
pub async fn list_periods(
    ctx: &dyn BrowsingContext,
    upstream: &Upstream,
    date: &str,
) -> Result<Vec<PeriodSummary>, MenuError> {
    let url = upstream.periods_url(date)?;
    let response: PeriodsResponse = upstream.get_json(ctx, &url).await?;
    debug!(date, count = response.periods.len(), "fetched periods");
    Ok(response.periods)
}

/// Resolve `meal` to the period served under that name on `date`.
pub async fn resolve_period(
    ctx: &dyn BrowsingContext,
    upstream: &Upstream,
    date: &str,
    meal: &str,
) -> Result<PeriodSummary, MenuError> {
    let periods = list_periods(ctx, upstream, date).await?;
    match find_period(&periods, meal) {
        Some(period) => {
            debug!(date, meal, period_id = %period.id, "resolved period");
            Ok(period.clone())
        },
        None => Err(MenuError::PeriodNotFound {
            date: date.to_string(),
            meal: meal.to_string(),
            available: periods.into_iter().map(|p| p.name).collect(),
        }),
    }
}

/// First period whose name equals `meal`, ignoring case.
///
/// Whole-name equality only: "din" does not match "Dinner".
pub fn find_period<'a>(periods: &'a [PeriodSummary], meal: &str) -> Option<&'a PeriodSummary> {
    let wanted = meal.to_lowercase();
    periods.iter().find(|p| p.name.to_lowercase() == wanted)
}
