use std::path::{Path, PathBuf};

use crate::error::{Result, TallyError};
use crate::models::{NewTransaction, Transaction, TransactionEdit, TransactionType};

/// Storage key; the list lives in `<data_dir>/<STORAGE_KEY>.json`.
pub const STORAGE_KEY: &str = "transactions";

pub fn storage_path(data_dir: &Path) -> PathBuf {
    data_dir.join(format!("{STORAGE_KEY}.json"))
}

/// Owned transaction list with a load/save boundary. Mutations build a new
/// list, persist it, and only then replace the in-memory copy.
#[derive(Debug)]
pub struct TransactionStore {
    path: PathBuf,
    transactions: Vec<Transaction>,
}

impl TransactionStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let path = storage_path(data_dir);
        let transactions = load(&path)?;
        log::debug!("loaded {} transactions from {}", transactions.len(), path.display());
        Ok(Self { path, transactions })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn add(&mut self, new: NewTransaction) -> Result<Transaction> {
        let millis = chrono::Utc::now().timestamp_millis();
        self.add_with_timestamp(new, millis)
    }

    fn add_with_timestamp(&mut self, new: NewTransaction, millis: i64) -> Result<Transaction> {
        let description = validate_description(&new.description)?;
        validate_amount(new.amount)?;
        let category = new.kind.canonical_category(&new.category)?;

        let txn = Transaction {
            id: self.next_id(millis),
            date: new.date,
            description,
            amount: new.amount,
            category: category.to_string(),
            kind: new.kind,
        };

        let mut next = self.transactions.clone();
        next.push(txn.clone());
        self.commit(next)?;
        log::info!("added transaction {}", txn.id);
        Ok(txn)
    }

    pub fn delete(&mut self, id: &str) -> Result<Transaction> {
        let removed = self
            .get(id)
            .cloned()
            .ok_or_else(|| TallyError::NotFound(id.to_string()))?;
        let next: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.id != id)
            .cloned()
            .collect();
        self.commit(next)?;
        log::info!("deleted transaction {id}");
        Ok(removed)
    }

    pub fn update(&mut self, id: &str, edit: TransactionEdit) -> Result<Transaction> {
        if edit.is_empty() {
            return Err(TallyError::Validation("nothing to change".to_string()));
        }
        let current = self
            .get(id)
            .ok_or_else(|| TallyError::NotFound(id.to_string()))?;

        let mut updated = current.clone();
        if let Some(date) = edit.date {
            updated.date = date;
        }
        if let Some(description) = &edit.description {
            updated.description = validate_description(description)?;
        }
        if let Some(amount) = edit.amount {
            validate_amount(amount)?;
            updated.amount = amount;
        }
        if let Some(kind) = edit.kind {
            updated.kind = kind;
        }
        // A type change must come with a category that belongs to the new type.
        let category = edit.category.as_deref().unwrap_or(&updated.category);
        updated.category = updated.kind.canonical_category(category)?.to_string();

        let next: Vec<Transaction> = self
            .transactions
            .iter()
            .map(|t| if t.id == id { updated.clone() } else { t.clone() })
            .collect();
        self.commit(next)?;
        log::info!("updated transaction {id}");
        Ok(updated)
    }

    fn next_id(&self, millis: i64) -> String {
        let mut candidate = millis;
        while self.transactions.iter().any(|t| t.id == candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn commit(&mut self, next: Vec<Transaction>) -> Result<()> {
        save(&self.path, &next)?;
        self.transactions = next;
        Ok(())
    }
}

fn validate_description(description: &str) -> Result<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(TallyError::Validation("description is required".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(TallyError::Validation(format!(
            "amount must be a positive number, got {amount}"
        )));
    }
    Ok(())
}

/// Read the stored list. A missing or blank file is an empty list.
pub fn load(path: &Path) -> Result<Vec<Transaction>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).map_err(|e| {
        TallyError::Other(format!("{} is not a transaction list: {e}", path.display()))
    })
}

/// Serialize the whole list, replacing the file via a temp-file rename.
pub fn save(path: &Path, transactions: &[Transaction]) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(transactions)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, format!("{json}\n"))?;
    std::fs::rename(&tmp, path)?;
    log::debug!("wrote {} transactions to {}", transactions.len(), path.display());
    Ok(())
}

/// Filter helper used by `tally list`.
pub fn of_kind(transactions: &[Transaction], kind: Option<TransactionType>) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|t| kind.map_or(true, |k| t.kind == k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_store() -> (tempfile::TempDir, TransactionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TransactionStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn new_txn(amount: f64, kind: TransactionType, category: &str) -> NewTransaction {
        NewTransaction {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            description: "Test entry".to_string(),
            amount,
            category: category.to_string(),
            kind,
        }
    }

    #[test]
    fn test_open_empty_storage_yields_empty_list() {
        let (_dir, store) = test_store();
        assert!(store.list().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_blank_file_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(storage_path(dir.path()), "  \n").unwrap();
        let store = TransactionStore::open(dir.path()).unwrap();
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_add_persists_and_reloads_equal() {
        let (dir, mut store) = test_store();
        store.add(new_txn(100.0, TransactionType::Income, "Salary")).unwrap();
        store.add(new_txn(40.0, TransactionType::Expense, "shopping")).unwrap();

        let reloaded = TransactionStore::open(dir.path()).unwrap();
        assert_eq!(reloaded.list(), store.list());
        assert_eq!(reloaded.list()[1].category, "Shopping");
    }

    #[test]
    fn test_add_then_delete_restores_prior_list() {
        let (dir, mut store) = test_store();
        store.add(new_txn(12.5, TransactionType::Expense, "Travel")).unwrap();
        let before = store.list().to_vec();

        let added = store.add(new_txn(99.0, TransactionType::Income, "Gift")).unwrap();
        let removed = store.delete(&added.id).unwrap();

        assert_eq!(removed, added);
        assert_eq!(store.list(), before.as_slice());
        assert_eq!(TransactionStore::open(dir.path()).unwrap().list(), before.as_slice());
    }

    #[test]
    fn test_timestamp_collision_gets_next_id() {
        let (_dir, mut store) = test_store();
        let a = store
            .add_with_timestamp(new_txn(1.0, TransactionType::Expense, "Shopping"), 1_700_000_000_000)
            .unwrap();
        let b = store
            .add_with_timestamp(new_txn(2.0, TransactionType::Expense, "Shopping"), 1_700_000_000_000)
            .unwrap();
        assert_eq!(a.id, "1700000000000");
        assert_eq!(b.id, "1700000000001");
    }

    #[test]
    fn test_add_rejects_invalid_input() {
        let (_dir, mut store) = test_store();
        assert!(store.add(new_txn(-5.0, TransactionType::Expense, "Shopping")).is_err());
        assert!(store.add(new_txn(f64::NAN, TransactionType::Expense, "Shopping")).is_err());
        assert!(store.add(new_txn(5.0, TransactionType::Income, "Shopping")).is_err());
        let mut blank = new_txn(5.0, TransactionType::Expense, "Shopping");
        blank.description = "   ".to_string();
        assert!(store.add(blank).is_err());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_delete_unknown_id() {
        let (_dir, mut store) = test_store();
        let err = store.delete("nope").unwrap_err();
        assert!(matches!(err, TallyError::NotFound(_)));
    }

    #[test]
    fn test_update_changes_fields() {
        let (dir, mut store) = test_store();
        let txn = store.add(new_txn(10.0, TransactionType::Expense, "Shopping")).unwrap();
        let edit = TransactionEdit {
            amount: Some(25.0),
            description: Some("Groceries".to_string()),
            category: Some("food & dining".to_string()),
            ..Default::default()
        };
        let updated = store.update(&txn.id, edit).unwrap();
        assert_eq!(updated.id, txn.id);
        assert_eq!(updated.amount, 25.0);
        assert_eq!(updated.category, "Food & Dining");

        let reloaded = TransactionStore::open(dir.path()).unwrap();
        assert_eq!(reloaded.get(&txn.id), Some(&updated));
    }

    #[test]
    fn test_update_type_requires_matching_category() {
        let (_dir, mut store) = test_store();
        let txn = store.add(new_txn(10.0, TransactionType::Expense, "Shopping")).unwrap();
        let edit = TransactionEdit {
            kind: Some(TransactionType::Income),
            ..Default::default()
        };
        assert!(store.update(&txn.id, edit).is_err());
        assert_eq!(store.get(&txn.id).unwrap().kind, TransactionType::Expense);

        let edit = TransactionEdit {
            kind: Some(TransactionType::Income),
            category: Some("Freelance".to_string()),
            ..Default::default()
        };
        let updated = store.update(&txn.id, edit).unwrap();
        assert_eq!(updated.kind, TransactionType::Income);
    }

    #[test]
    fn test_update_rejects_empty_edit() {
        let (_dir, mut store) = test_store();
        let txn = store.add(new_txn(10.0, TransactionType::Expense, "Shopping")).unwrap();
        assert!(store.update(&txn.id, TransactionEdit::default()).is_err());
    }

    #[test]
    fn test_incompatible_stored_value_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(storage_path(dir.path()), r#"{"not": "a list"}"#).unwrap();
        assert!(TransactionStore::open(dir.path()).is_err());
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();
        let mut store = TransactionStore::open(&blocker.join("data")).unwrap();
        assert!(store.add(new_txn(1.0, TransactionType::Expense, "Shopping")).is_err());
        assert!(store.list().is_empty());
    }
}
