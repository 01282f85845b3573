use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::models::{EXPENSE_CATEGORIES, INCOME_CATEGORIES};

pub fn run() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Income", "Expense"]);
    let rows = INCOME_CATEGORIES.len().max(EXPENSE_CATEGORIES.len());
    for i in 0..rows {
        table.add_row(vec![
            Cell::new(INCOME_CATEGORIES.get(i).copied().unwrap_or_default()),
            Cell::new(EXPENSE_CATEGORIES.get(i).copied().unwrap_or_default()),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}
