//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, auth::create_user_table, entry::create_entry_table};

/// Create the tables for users and entries if they do not exist yet.
///
/// Also turns on foreign key enforcement for `connection`, so deleting a user
/// deletes their entries.
///
/// # Errors
/// Returns an [Error::SqlError] if a table cannot be created. No tables are
/// created in that case.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_entry_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        entry::{EntryKind, NewEntry, count_entries, create_entry},
        test_utils::create_test_user,
    };

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();
        initialize(&connection).unwrap();
    }

    #[test]
    fn deleting_user_deletes_their_entries() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_test_user("alice", &connection);
        create_entry(
            NewEntry {
                description: "groceries".to_owned(),
                category: "Despesas Pessoais".to_owned(),
                subcategory: "Alimentação".to_owned(),
                amount: 120.0,
                kind: EntryKind::Expense,
                date: date!(2024 - 03 - 02),
            },
            user.id,
            &connection,
        )
        .unwrap();

        connection
            .execute("DELETE FROM user WHERE id = ?1", (user.id.as_i64(),))
            .unwrap();

        assert_eq!(count_entries(&connection), Ok(0));
    }
}
