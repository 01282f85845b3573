use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::models::{Transaction, TransactionType};

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

pub fn totals(transactions: &[Transaction]) -> Totals {
    let income: f64 = sum_of(transactions, TransactionType::Income);
    let expenses: f64 = sum_of(transactions, TransactionType::Expense);
    Totals {
        income,
        expenses,
        net: income - expenses,
    }
}

fn sum_of(transactions: &[Transaction], kind: TransactionType) -> f64 {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.amount)
        .sum()
}

// ---------------------------------------------------------------------------
// Category breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: usize,
    pub pct: f64,
}

pub fn expenses_by_category(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    group_by_category(transactions, TransactionType::Expense)
}

pub fn income_by_category(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    group_by_category(transactions, TransactionType::Income)
}

fn group_by_category(transactions: &[Transaction], kind: TransactionType) -> Vec<CategoryTotal> {
    let mut grouped: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.kind == kind) {
        let entry = grouped.entry(t.category.as_str()).or_insert((0.0, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }

    let total: f64 = grouped.values().map(|(sum, _)| sum).sum();
    let mut items: Vec<CategoryTotal> = grouped
        .into_iter()
        .map(|(name, (sum, count))| CategoryTotal {
            category: name.to_string(),
            total: sum,
            count,
            pct: if total != 0.0 { sum / total * 100.0 } else { 0.0 },
        })
        .collect();
    // BTreeMap already yields names in order, so a stable sort keeps ties alphabetical.
    items.sort_by(|a, b| b.total.total_cmp(&a.total));
    items
}

// ---------------------------------------------------------------------------
// Trailing day window
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub income: f64,
    pub expenses: f64,
}

/// Longest trend window, in days.
pub const MAX_TREND_DAYS: u32 = 3660;

/// One bucket per day for the `days` days ending at `end`, oldest first.
/// Windows longer than [`MAX_TREND_DAYS`] are clamped.
pub fn daily_trend(transactions: &[Transaction], end: NaiveDate, days: u32) -> Vec<DailyBucket> {
    let days = days.min(MAX_TREND_DAYS);
    if days == 0 {
        return Vec::new();
    }
    let Some(start) = end.checked_sub_signed(Duration::days(i64::from(days) - 1)) else {
        return Vec::new();
    };
    let mut buckets: Vec<DailyBucket> = (0..i64::from(days))
        .map(|offset| DailyBucket {
            date: start + Duration::days(offset),
            income: 0.0,
            expenses: 0.0,
        })
        .collect();

    for t in transactions {
        if t.date < start || t.date > end {
            continue;
        }
        let idx = (t.date - start).num_days() as usize;
        match t.kind {
            TransactionType::Income => buckets[idx].income += t.amount,
            TransactionType::Expense => buckets[idx].expenses += t.amount,
        }
    }
    buckets
}

/// The `n` most recent transactions, newest first.
pub fn recent(transactions: &[Transaction], n: usize) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    sorted.truncate(n);
    sorted
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct Dashboard<'a> {
    pub count: usize,
    pub totals: Totals,
    pub expenses_by_category: Vec<CategoryTotal>,
    pub income_by_category: Vec<CategoryTotal>,
    pub trend: Vec<DailyBucket>,
    pub recent: Vec<&'a Transaction>,
}

pub fn dashboard(
    transactions: &[Transaction],
    today: NaiveDate,
    trend_days: u32,
    recent_n: usize,
) -> Dashboard<'_> {
    Dashboard {
        count: transactions.len(),
        totals: totals(transactions),
        expenses_by_category: expenses_by_category(transactions),
        income_by_category: income_by_category(transactions),
        trend: daily_trend(transactions, today, trend_days),
        recent: recent(transactions, recent_n),
    }
}
