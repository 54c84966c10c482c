//! Aggregation of a user's entries into the figures shown on the dashboard.
//!
//! Everything here is a pure function of the entries and today's date, so
//! the same summary backs both the dashboard page and the JSON summary route.

use std::{collections::BTreeMap, fmt::Display};

use serde::{Serialize, Serializer};
use time::Date;

use crate::entry::{Entry, EntryKind};

/// A calendar month, used to group entries.
///
/// Orders chronologically and displays as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u8,
}

impl MonthKey {
    /// Create a month key from a year and a month number (1 to 12).
    pub fn new(year: i32, month: u8) -> Self {
        Self { year, month }
    }

    /// The month `date` falls in.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month().into(),
        }
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month number, January is 1.
    pub fn month(&self) -> u8 {
        self.month
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The totals and series computed from a user's entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    /// Sum of all income amounts.
    pub total_income: f64,
    /// Sum of all expense amounts.
    pub total_expense: f64,
    /// `total_income - total_expense`.
    pub overall_balance: f64,
    /// Income dated in the current month.
    pub month_income: f64,
    /// Expenses dated in the current month.
    pub month_expense: f64,
    /// `month_income - month_expense`.
    pub month_balance: f64,
    /// Expense amounts summed by category. Categories without expenses are absent.
    pub category_totals: BTreeMap<String, f64>,
    /// Every month with at least one entry, oldest first.
    pub month_keys: Vec<MonthKey>,
    /// Income per month, aligned with `month_keys`.
    pub income_series: Vec<f64>,
    /// Expenses per month, aligned with `month_keys`.
    pub expense_series: Vec<f64>,
}

impl LedgerSummary {
    /// Whether the summary was built from at least one entry.
    pub fn has_entries(&self) -> bool {
        !self.month_keys.is_empty()
    }
}

/// Summarise `entries` as of `today`.
///
/// `entries` should already be limited to a single user. An empty slice
/// yields a summary of zeros with empty collections.
pub fn summarize(entries: &[Entry], today: Date) -> LedgerSummary {
    let (total_income, total_expense) = sum_by_kind(entries);

    let current_month = MonthKey::from_date(today);
    let (month_income, month_expense) = sum_by_kind(
        entries
            .iter()
            .filter(|entry| MonthKey::from_date(entry.date) == current_month),
    );

    let (month_keys, income_series, expense_series) = monthly_series(entries);

    LedgerSummary {
        total_income,
        total_expense,
        overall_balance: total_income - total_expense,
        month_income,
        month_expense,
        month_balance: month_income - month_expense,
        category_totals: expenses_by_category(entries),
        month_keys,
        income_series,
        expense_series,
    }
}

/// Returns `(income, expense)` summed over `entries`.
fn sum_by_kind<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> (f64, f64) {
    entries
        .into_iter()
        .fold((0.0, 0.0), |(income, expense), entry| match entry.kind {
            EntryKind::Income => (income + entry.amount, expense),
            EntryKind::Expense => (income, expense + entry.amount),
        })
}

fn expenses_by_category(entries: &[Entry]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();

    for entry in entries.iter().filter(|entry| entry.kind == EntryKind::Expense) {
        *totals.entry(entry.category.clone()).or_insert(0.0) += entry.amount;
    }

    totals
}

/// Group entries by month and split each month into income and expense.
///
/// Months where only one kind occurs get an explicit zero for the other.
fn monthly_series(entries: &[Entry]) -> (Vec<MonthKey>, Vec<f64>, Vec<f64>) {
    let mut totals: BTreeMap<MonthKey, (f64, f64)> = BTreeMap::new();

    for entry in entries {
        let (income, expense) = totals.entry(MonthKey::from_date(entry.date)).or_default();

        match entry.kind {
            EntryKind::Income => *income += entry.amount,
            EntryKind::Expense => *expense += entry.amount,
        }
    }

    let mut month_keys = Vec::with_capacity(totals.len());
    let mut income_series = Vec::with_capacity(totals.len());
    let mut expense_series = Vec::with_capacity(totals.len());

    for (month, (income, expense)) in totals {
        month_keys.push(month);
        income_series.push(income);
        expense_series.push(expense);
    }

    (month_keys, income_series, expense_series)
}
