use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use household_ledger::{
    EntryKind, NewEntry, NewUser, PasswordHash, ValidatedPassword, create_entry, create_user,
    hash_security_answer, initialize_db,
};

/// A utility for creating a test database for the household_ledger server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Income and expenses recorded every month for the demo user.
const MONTHLY_ENTRIES: [(EntryKind, &str, &str, &str, f64, u8); 6] = [
    (EntryKind::Income, "Salary", "Renda Familiar", "Salários", 4200.0, 5),
    (EntryKind::Expense, "Rent", "Habitação", "Aluguel", 1500.0, 1),
    (EntryKind::Expense, "Power bill", "Habitação", "Luz", 135.5, 12),
    (EntryKind::Expense, "Groceries", "Despesas Pessoais", "Alimentação", 620.25, 8),
    (EntryKind::Expense, "Fuel", "Automóvel", "Combustível", 180.0, 15),
    (EntryKind::Expense, "Movie night", "Lazer", "Cinema", 42.0, 20),
];

/// How many months of entries, counting the current one, to create.
const MONTHS: usize = 4;

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating test user 'demo' with the password 'test'...");

    let user = create_user(
        NewUser {
            username: "demo".parse()?,
            email: "demo@example.com".parse()?,
            password_hash: PasswordHash::new(
                ValidatedPassword::new_unchecked("test"),
                PasswordHash::DEFAULT_COST,
            )?,
            security_question: "What is the name of this app?".to_owned(),
            security_answer_hash: hash_security_answer(
                "household ledger",
                PasswordHash::DEFAULT_COST,
            )?,
        },
        &connection,
    )?;

    println!("Creating entries for the last {MONTHS} months...");

    let mut month_start = first_of_month(OffsetDateTime::now_utc().date())?;
    for _ in 0..MONTHS {
        for (kind, description, category, subcategory, amount, day) in MONTHLY_ENTRIES {
            let entry = NewEntry {
                description: description.to_owned(),
                category: category.to_owned(),
                subcategory: subcategory.to_owned(),
                amount,
                kind,
                date: month_start.replace_day(day)?,
            };

            create_entry(entry, user.id, &connection)?;
        }

        month_start = previous_month(month_start)?;
    }

    println!("Success!");

    Ok(())
}

fn first_of_month(date: Date) -> Result<Date, time::error::ComponentRange> {
    date.replace_day(1)
}

fn previous_month(month_start: Date) -> Result<Date, Box<dyn Error>> {
    let last_day = month_start
        .previous_day()
        .ok_or("there is no month before the earliest supported date")?;

    Ok(first_of_month(last_day)?)
}
