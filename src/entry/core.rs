//! Defines the entry model, the validated form input and the database queries for entries.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, auth::UserID, database_id::EntryId, ledger::Taxonomy};

// ============================================================================
// MODELS
// ============================================================================

/// Whether an entry is money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl EntryKind {
    /// The lowercase name used in forms and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }
}

impl Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(EntryKind::Income),
            "expense" => Ok(EntryKind::Expense),
            other => Err(Error::InvalidEntryKind(other.to_owned())),
        }
    }
}

impl ToSql for EntryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EntryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A single income or expense record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// The ID of the entry.
    pub id: EntryId,
    /// What the money was for.
    pub description: String,
    /// The top-level category from the taxonomy.
    pub category: String,
    /// A subcategory of `category`.
    pub subcategory: String,
    /// The amount of money, never negative.
    pub amount: f64,
    /// Whether the entry is income or an expense.
    pub kind: EntryKind,
    /// The day the money moved.
    pub date: Date,
    /// The user that recorded the entry.
    ///
    /// Entries recorded before entries had owners have no owner and are not
    /// shown to anyone.
    pub owner: Option<UserID>,
}

/// The raw, unvalidated values submitted by the new entry form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryForm {
    /// Text detailing the entry.
    pub description: String,
    /// The top-level category.
    pub category: String,
    /// A subcategory of `category`.
    pub subcategory: String,
    /// The amount as typed by the user.
    pub amount: String,
    /// Either "income" or "expense".
    pub kind: String,
    /// The date in the format YYYY-MM-DD.
    pub date: String,
}

/// A validated entry that has not been stored yet.
///
/// Use [NewEntry::from_form] to build one from user input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    /// Text detailing the entry, never empty.
    pub description: String,
    /// The top-level category.
    pub category: String,
    /// A subcategory of `category`.
    pub subcategory: String,
    /// A finite, non-negative amount.
    pub amount: f64,
    /// Whether the entry is income or an expense.
    pub kind: EntryKind,
    /// The day the money moved.
    pub date: Date,
}

/// Date format used by HTML date inputs, e.g. "2024-01-31".
pub(crate) const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

impl NewEntry {
    /// Validate the raw values of `form` against `taxonomy`.
    ///
    /// Leading and trailing whitespace is trimmed from every field.
    ///
    /// # Errors
    /// Returns the first problem found:
    /// - [Error::EmptyDescription] if the description is blank,
    /// - [Error::InvalidAmount] if the amount is not a finite number,
    /// - [Error::NegativeAmount] if the amount is below zero,
    /// - [Error::InvalidDate] if the date is not a valid YYYY-MM-DD date,
    /// - [Error::InvalidEntryKind] if the kind is not "income" or "expense",
    /// - [Error::UnknownCategory] or [Error::UnknownSubcategory] if the
    ///   category pair is not in `taxonomy`.
    pub fn from_form(form: &EntryForm, taxonomy: &Taxonomy) -> Result<Self, Error> {
        let description = form.description.trim();
        if description.is_empty() {
            return Err(Error::EmptyDescription);
        }

        let amount = parse_amount(&form.amount)?;

        let raw_date = form.date.trim();
        let date = Date::parse(raw_date, DATE_FORMAT)
            .map_err(|_| Error::InvalidDate(raw_date.to_owned()))?;

        let kind: EntryKind = form.kind.trim().parse()?;

        let category = form.category.trim();
        let subcategory = form.subcategory.trim();
        taxonomy.validate(category, subcategory)?;

        Ok(Self {
            description: description.to_owned(),
            category: category.to_owned(),
            subcategory: subcategory.to_owned(),
            amount,
            kind,
            date,
        })
    }
}

fn parse_amount(raw_amount: &str) -> Result<f64, Error> {
    let raw_amount = raw_amount.trim();
    let amount: f64 = raw_amount
        .parse()
        .map_err(|_| Error::InvalidAmount(raw_amount.to_owned()))?;

    if !amount.is_finite() {
        return Err(Error::InvalidAmount(raw_amount.to_owned()));
    }

    if amount < 0.0 {
        return Err(Error::NegativeAmount(amount));
    }

    Ok(amount)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the entry table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_entry_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS entry (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                subcategory TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount >= 0),
                kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
                date TEXT NOT NULL,
                owner_id INTEGER,
                FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by the statement and dashboard, which always filter by owner.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_entry_owner_date ON entry(owner_id, date);",
        (),
    )?;

    Ok(())
}

/// Store `entry` in the database as belonging to `owner`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_entry(
    entry: NewEntry,
    owner: UserID,
    connection: &Connection,
) -> Result<Entry, Error> {
    let entry = connection
        .prepare(
            "INSERT INTO entry (description, category, subcategory, amount, kind, date, owner_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, description, category, subcategory, amount, kind, date, owner_id",
        )?
        .query_row(
            (
                entry.description,
                entry.category,
                entry.subcategory,
                entry.amount,
                entry.kind,
                entry.date,
                owner.as_i64(),
            ),
            map_entry_row,
        )?;

    Ok(entry)
}

/// Retrieve an entry from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid entry,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_entry(id: EntryId, connection: &Connection) -> Result<Entry, Error> {
    let entry = connection
        .prepare(
            "SELECT id, description, category, subcategory, amount, kind, date, owner_id
             FROM entry WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_entry_row)?;

    Ok(entry)
}

/// Get all entries belonging to `owner`, newest first.
///
/// Entries on the same day are ordered by most recently created first.
/// Entries without an owner are never returned.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_entries_by_owner(owner: UserID, connection: &Connection) -> Result<Vec<Entry>, Error> {
    connection
        .prepare(
            "SELECT id, description, category, subcategory, amount, kind, date, owner_id
             FROM entry
             WHERE owner_id = :owner_id
             ORDER BY date DESC, id DESC",
        )?
        .query_map(&[(":owner_id", &owner.as_i64())], map_entry_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub(crate) type RowsAffected = usize;

/// Delete the entry `id` if it belongs to `owner`.
///
/// Returns the number of rows deleted, zero when the entry does not exist or
/// belongs to someone else.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_entry(
    id: EntryId,
    owner: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM entry WHERE id = :id AND owner_id = :owner_id",
            &[(":id", &id), (":owner_id", &owner.as_i64())],
        )
        .map_err(Error::from)
}

/// Get the total number of entries in the database, including ownerless ones.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_entries(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM entry;", [], |row| row.get(0))
        .map_err(Error::from)
}

/// Map a database row to an [Entry].
pub fn map_entry_row(row: &Row) -> Result<Entry, rusqlite::Error> {
    let owner: Option<i64> = row.get(7)?;

    Ok(Entry {
        id: row.get(0)?,
        description: row.get(1)?,
        category: row.get(2)?,
        subcategory: row.get(3)?,
        amount: row.get(4)?,
        kind: row.get(5)?,
        date: row.get(6)?,
        owner: owner.map(UserID::new),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod form_tests {
    use time::macros::date;

    use crate::{
        Error,
        entry::{EntryForm, EntryKind, NewEntry},
        ledger::Taxonomy,
    };

    fn valid_form() -> EntryForm {
        EntryForm {
            description: "Bus fare".to_owned(),
            category: "Transporte".to_owned(),
            subcategory: "Ônibus".to_owned(),
            amount: "4.50".to_owned(),
            kind: "expense".to_owned(),
            date: "2024-01-05".to_owned(),
        }
    }

    #[test]
    fn valid_form_is_accepted() {
        let entry = NewEntry::from_form(&valid_form(), &Taxonomy::default()).unwrap();

        assert_eq!(
            entry,
            NewEntry {
                description: "Bus fare".to_owned(),
                category: "Transporte".to_owned(),
                subcategory: "Ônibus".to_owned(),
                amount: 4.5,
                kind: EntryKind::Expense,
                date: date!(2024 - 01 - 05),
            }
        );
    }

    #[test]
    fn fields_are_trimmed() {
        let form = EntryForm {
            description: "  Salary ".to_owned(),
            category: "Renda Familiar".to_owned(),
            subcategory: "Salários".to_owned(),
            amount: " 1000 ".to_owned(),
            kind: "income".to_owned(),
            date: " 2024-01-10".to_owned(),
        };

        let entry = NewEntry::from_form(&form, &Taxonomy::default()).unwrap();

        assert_eq!(entry.description, "Salary");
        assert_eq!(entry.amount, 1000.0);
        assert_eq!(entry.kind, EntryKind::Income);
    }

    #[test]
    fn zero_amount_is_accepted() {
        let form = EntryForm {
            amount: "0".to_owned(),
            ..valid_form()
        };

        assert_eq!(
            NewEntry::from_form(&form, &Taxonomy::default()).map(|entry| entry.amount),
            Ok(0.0)
        );
    }

    #[test]
    fn blank_description_is_rejected() {
        let form = EntryForm {
            description: "   ".to_owned(),
            ..valid_form()
        };

        assert_eq!(
            NewEntry::from_form(&form, &Taxonomy::default()),
            Err(Error::EmptyDescription)
        );
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        let form = EntryForm {
            amount: "four fifty".to_owned(),
            ..valid_form()
        };

        assert_eq!(
            NewEntry::from_form(&form, &Taxonomy::default()),
            Err(Error::InvalidAmount("four fifty".to_owned()))
        );
    }

    #[test]
    fn non_finite_amounts_are_rejected() {
        for raw_amount in ["NaN", "inf", "-inf"] {
            let form = EntryForm {
                amount: raw_amount.to_owned(),
                ..valid_form()
            };

            assert_eq!(
                NewEntry::from_form(&form, &Taxonomy::default()),
                Err(Error::InvalidAmount(raw_amount.to_owned())),
                "amount {raw_amount:?} should be rejected"
            );
        }
    }

    #[test]
    fn negative_amount_is_rejected() {
        let form = EntryForm {
            amount: "-10".to_owned(),
            ..valid_form()
        };

        assert_eq!(
            NewEntry::from_form(&form, &Taxonomy::default()),
            Err(Error::NegativeAmount(-10.0))
        );
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for raw_date in ["05/01/2024", "2024-02-30", "", "2024-1-5"] {
            let form = EntryForm {
                date: raw_date.to_owned(),
                ..valid_form()
            };

            assert_eq!(
                NewEntry::from_form(&form, &Taxonomy::default()),
                Err(Error::InvalidDate(raw_date.to_owned())),
                "date {raw_date:?} should be rejected"
            );
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let form = EntryForm {
            kind: "transfer".to_owned(),
            ..valid_form()
        };

        assert_eq!(
            NewEntry::from_form(&form, &Taxonomy::default()),
            Err(Error::InvalidEntryKind("transfer".to_owned()))
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        let form = EntryForm {
            category: "Viagens".to_owned(),
            ..valid_form()
        };

        assert_eq!(
            NewEntry::from_form(&form, &Taxonomy::default()),
            Err(Error::UnknownCategory("Viagens".to_owned()))
        );
    }

    #[test]
    fn subcategory_from_another_category_is_rejected() {
        let form = EntryForm {
            subcategory: "IPVA".to_owned(),
            ..valid_form()
        };

        assert_eq!(
            NewEntry::from_form(&form, &Taxonomy::default()),
            Err(Error::UnknownSubcategory {
                category: "Transporte".to_owned(),
                subcategory: "IPVA".to_owned(),
            })
        );
    }
}
