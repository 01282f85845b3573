use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, TallyError};

pub const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Freelance",
    "Investment",
    "Business",
    "Gift",
    "Other Income",
];

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food & Dining",
    "Transportation",
    "Shopping",
    "Entertainment",
    "Bills & Utilities",
    "Healthcare",
    "Education",
    "Travel",
    "Housing",
    "Personal Care",
    "Other Expense",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn categories(self) -> &'static [&'static str] {
        match self {
            TransactionType::Income => INCOME_CATEGORIES,
            TransactionType::Expense => EXPENSE_CATEGORIES,
        }
    }

    /// Resolve a user-typed category to its canonical spelling for this type.
    pub fn canonical_category(self, input: &str) -> Result<&'static str> {
        let wanted = input.trim();
        self.categories()
            .iter()
            .copied()
            .find(|c| c.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TallyError::UnknownCategory {
                category: wanted.to_string(),
                kind: self.as_str().to_string(),
            })
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded income or expense event. `amount` is never negative; the sign
/// comes from `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl Transaction {
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// Form input for a new transaction, before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub kind: TransactionType,
}

/// Partial update for an existing transaction. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct TransactionEdit {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub kind: Option<TransactionType>,
}

impl TransactionEdit {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.description.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.kind.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Agent-produced insights. Every field defaults when absent or null.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub categorized_transactions: Vec<CategorizedTransaction>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: InsightSummary,
    #[serde(default, deserialize_with = "null_as_default")]
    pub insights: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tips: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default)]
    pub suggested_category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_income: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_expenses: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub net_balance: f64,
    #[serde(default)]
    pub savings_rate: Option<f64>,
    #[serde(default)]
    pub top_category: Option<String>,
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| TallyError::Validation(format!("'{input}' is not a date (expected YYYY-MM-DD)")))
}
