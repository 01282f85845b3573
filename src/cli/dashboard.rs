use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::transactions::table as transaction_table;
use crate::error::Result;
use crate::fmt::{bar, money};
use crate::reports::{self, CategoryTotal};
use crate::settings::load_settings;
use crate::store::TransactionStore;

const RECENT_COUNT: usize = 5;
const BAR_WIDTH: usize = 24;

pub fn run(days: Option<u32>) -> Result<()> {
    let settings = load_settings();
    let store = TransactionStore::open(&settings.data_path())?;
    let today = chrono::Local::now().date_naive();
    let days = days.unwrap_or(settings.trend_days);
    let dash = reports::dashboard(store.list(), today, days, RECENT_COUNT);

    let mut summary = Table::new();
    summary.set_header(vec!["Total Income", "Total Expenses", "Net Balance", "Transactions"]);
    let net = if dash.totals.net >= 0.0 {
        money(dash.totals.net).green().bold()
    } else {
        money(dash.totals.net).red().bold()
    };
    summary.add_row(vec![
        Cell::new(money(dash.totals.income).green()),
        Cell::new(money(dash.totals.expenses).red()),
        Cell::new(net),
        Cell::new(dash.count),
    ]);
    println!("Dashboard\n{summary}");

    if dash.count == 0 {
        println!("\n{}", "No transactions yet. Add one with `tally add`.".yellow());
        return Ok(());
    }

    if !dash.expenses_by_category.is_empty() {
        println!("\nExpenses by Category\n{}", category_table(&dash.expenses_by_category));
    }
    if !dash.income_by_category.is_empty() {
        println!("\nIncome by Category\n{}", category_table(&dash.income_by_category));
    }

    if !dash.trend.is_empty() {
        let peak = dash
            .trend
            .iter()
            .map(|b| b.income.max(b.expenses))
            .fold(0.0, f64::max);
        let mut trend = Table::new();
        trend.set_header(vec!["Date", "Income", "Expenses", ""]);
        for b in &dash.trend {
            trend.add_row(vec![
                Cell::new(b.date.format("%a %b %d")),
                Cell::new(money(b.income)),
                Cell::new(money(b.expenses)),
                Cell::new(bar(b.expenses, peak, BAR_WIDTH).red()),
            ]);
        }
        println!("\nLast {} Days\n{trend}", dash.trend.len());
    }

    println!("\nRecent Transactions\n{}", transaction_table(&dash.recent));
    Ok(())
}

fn category_table(items: &[CategoryTotal]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%", "Count"]);
    for item in items {
        table.add_row(vec![
            Cell::new(&item.category),
            Cell::new(money(item.total)),
            Cell::new(format!("{:.1}%", item.pct)),
            Cell::new(item.count),
        ]);
    }
    table
}
