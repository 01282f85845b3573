use std::path::{Path, PathBuf};

use crate::cli::open_store;
use crate::error::Result;
use crate::models::Transaction;
use crate::settings::load_settings;

fn default_path() -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    load_settings()
        .data_path()
        .join("exports")
        .join(format!("transactions-{date}.csv"))
}

pub fn run(output: Option<String>) -> Result<()> {
    let store = open_store()?;
    let path = output.map(PathBuf::from).unwrap_or_else(default_path);
    write_csv(store.list(), &path)?;
    println!("Wrote {} transactions to {}", store.list().len(), path.display());
    Ok(())
}

/// One row per transaction with a signed amount column for spreadsheets.
pub fn write_csv(transactions: &[Transaction], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["id", "date", "type", "category", "description", "amount", "signed_amount"])?;
    for t in transactions {
        writer.write_record([
            t.id.clone(),
            t.date.to_string(),
            t.kind.to_string(),
            t.category.clone(),
            t.description.clone(),
            format!("{:.2}", t.amount),
            format!("{:.2}", t.signed_amount()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::NaiveDate;

    #[test]
    fn test_write_csv_signs_expenses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("t.csv");
        let txns = vec![Transaction {
            id: "42".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 5, 4).unwrap(),
            description: "Coffee, large".to_string(),
            amount: 4.5,
            category: "Food & Dining".to_string(),
            kind: TransactionType::Expense,
        }];
        write_csv(&txns, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,date,type,category,description,amount,signed_amount"
        );
        assert_eq!(
            lines.next().unwrap(),
            "42,2025-05-04,expense,Food & Dining,\"Coffee, large\",4.50,-4.50"
        );
    }
}
