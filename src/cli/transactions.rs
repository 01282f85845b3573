use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_store;
use crate::error::Result;
use crate::fmt::{money, signed_money};
use crate::models::{parse_date, NewTransaction, Transaction, TransactionEdit, TransactionType};
use crate::reports;
use crate::store;

pub fn add(
    kind: TransactionType,
    amount: f64,
    category: &str,
    description: &str,
    date: Option<&str>,
) -> Result<()> {
    let date = match date {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let mut store = open_store()?;
    let txn = store.add(NewTransaction {
        date,
        description: description.to_string(),
        amount,
        category: category.to_string(),
        kind,
    })?;
    println!(
        "Added {} {} ({}) [id {}]",
        kind,
        signed_money(txn.amount, txn.kind),
        txn.category,
        txn.id
    );
    Ok(())
}

pub fn edit(
    id: &str,
    kind: Option<TransactionType>,
    amount: Option<f64>,
    category: Option<String>,
    description: Option<String>,
    date: Option<&str>,
) -> Result<()> {
    let date = date.map(parse_date).transpose()?;
    let mut store = open_store()?;
    let txn = store.update(
        id,
        TransactionEdit {
            date,
            description,
            amount,
            category,
            kind,
        },
    )?;
    println!("Updated transaction {}", txn.id);
    println!("{}", table(&[&txn]));
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let mut store = open_store()?;
    let txn = store.delete(id)?;
    println!(
        "Deleted {} on {}: {} {}",
        txn.id,
        txn.date,
        txn.description,
        signed_money(txn.amount, txn.kind)
    );
    Ok(())
}

pub fn list(kind: Option<TransactionType>) -> Result<()> {
    let store = open_store()?;
    let rows = store::of_kind(store.list(), kind);
    if rows.is_empty() {
        println!("{}", "No transactions yet. Add one with `tally add`.".yellow());
        return Ok(());
    }

    let mut sorted = rows.clone();
    sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    println!("Transactions\n{}", table(&sorted));

    let owned: Vec<Transaction> = rows.into_iter().cloned().collect();
    let totals = reports::totals(&owned);
    println!(
        "{} transactions  income {}  expenses {}  net {}",
        owned.len(),
        money(totals.income).green(),
        money(totals.expenses).red(),
        money(totals.net).bold()
    );
    Ok(())
}

pub(crate) fn table(rows: &[&Transaction]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Category", "Amount"]);
    for t in rows {
        let amount = match t.kind {
            TransactionType::Income => signed_money(t.amount, t.kind).green(),
            TransactionType::Expense => signed_money(t.amount, t.kind).red(),
        };
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(t.date),
            Cell::new(&t.description),
            Cell::new(&t.category),
            Cell::new(amount),
        ]);
    }
    table
}
