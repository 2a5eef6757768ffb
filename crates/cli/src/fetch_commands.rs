//! One-shot menu lookups from the command line.

use {anyhow::Result, clap::Args, dinehall_config::DinehallConfig, dinehall_menu::MenuService};

#[derive(Args)]
pub struct FetchArgs {
    /// Day to look up, as `YYYY-MM-DD`.
    #[arg(long)]
    pub date: String,
    /// Meal name, matched case-insensitively ("lunch", "Dinner", ...).
    #[arg(long, required_unless_present = "list_periods")]
    pub meal: Option<String>,
    /// List the periods served on the date instead of fetching a menu.
    #[arg(long, conflicts_with = "meal")]
    pub list_periods: bool,
    /// Print JSON on one line.
    #[arg(long)]
    pub compact: bool,
}

pub async fn handle_fetch(config: &DinehallConfig, args: FetchArgs) -> Result<()> {
    let menus = MenuService::from_config(config)?;

    let result = match args.meal.as_deref() {
        Some(meal) if !args.list_periods => menus
            .get_menu(&args.date, meal)
            .await
            .map(serde_json::to_value),
        _ => menus
            .list_periods(&args.date)
            .await
            .map(serde_json::to_value),
    };
    menus.shutdown().await;

    let value = result??;
    let out = if args.compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{out}");
    Ok(())
}
