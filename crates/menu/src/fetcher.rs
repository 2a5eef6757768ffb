//! Menu fetch for a resolved period.

use {dinehall_browser::BrowsingContext, tracing::debug};

use crate::{error::MenuError, types::MenuResponse, upstream::Upstream};

/// Fetch the menu tree for `period_id` on `date`.
///
/// The tree is returned as the upstream sent it. The only check is that it
/// belongs to the requested period, so a response for another period can never
/// be passed off as this one.
pub async fn fetch_menu(
    ctx: &dyn BrowsingContext,
    upstream: &Upstream,
    date: &str,
    period_id: &str,
) -> Result<MenuResponse, MenuError> {
    let url = upstream.menu_url(date, period_id)?;
    let mut menu: MenuResponse = upstream.get_json(ctx, &url).await?;

    if menu.period.id != period_id {
        return Err(MenuError::MalformedResponse(format!(
            "asked for period {period_id}, upstream answered with period {}",
            menu.period.id
        )));
    }
    if menu.date.is_empty() {
        menu.date = date.to_string();
    }

    debug!(
        date,
        period_id,
        categories = menu.period.categories.len(),
        "fetched menu"
    );
    Ok(menu)
}
