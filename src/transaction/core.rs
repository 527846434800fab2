//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row, types::Value};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    database_id::TransactionId,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction brings money in or sends money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, e.g. salary, interest.
    Income,
    /// Money spent, e.g. rent, groceries.
    Expense,
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "income"),
            TransactionKind::Expense => write!(f, "expense"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(Error::UnknownKind(other.to_owned())),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Amounts are always stored as non-negative numbers, the [TransactionKind]
/// carries the direction of the money flow.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID of the user that owns this transaction.
    pub user_id: UserID,
    /// The amount of money spent or earned in this transaction. Non-negative.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The category the transaction belongs to, e.g. "Groceries", "Rent".
    pub category: String,
    /// When the transaction happened.
    pub date: Date,
    /// An optional free-text note about the transaction.
    pub note: String,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        user_id: UserID,
        amount: f64,
        kind: TransactionKind,
        category: &str,
        date: Date,
    ) -> TransactionBuilder {
        TransactionBuilder {
            user_id,
            amount,
            kind,
            category: category.to_owned(),
            date,
            note: String::new(),
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Validation happens when the builder is handed to [create_transaction],
/// not at construction time, so builders can also carry rows parsed from
/// CSV files before they are checked.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The ID of the user that will own the transaction.
    pub user_id: UserID,
    /// The monetary amount. Must be finite and non-negative.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The category of the transaction. Must be non-empty after trimming.
    pub category: String,
    /// The date when the transaction occurred.
    pub date: Date,
    /// An optional free-text note.
    pub note: String,
}

impl TransactionBuilder {
    /// Set the note for the transaction.
    pub fn note(mut self, note: &str) -> Self {
        self.note = note.to_owned();
        self
    }

    /// Check the builder's fields against the transaction invariants.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NegativeAmount] if the amount is negative or not finite,
    /// - or [Error::EmptyCategory] if the category is empty after trimming.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(Error::NegativeAmount(self.amount));
        }

        if self.category.trim().is_empty() {
            return Err(Error::EmptyCategory);
        }

        Ok(())
    }
}

/// A partial update to an existing transaction.
///
/// Fields left as `None` keep their stored value. The owning user can never
/// be changed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionPatch {
    /// Replacement amount.
    pub amount: Option<f64>,
    /// Replacement kind.
    pub kind: Option<TransactionKind>,
    /// Replacement category.
    pub category: Option<String>,
    /// Replacement date.
    pub date: Option<Date>,
    /// Replacement note.
    pub note: Option<String>,
}

/// Criteria for narrowing down a transaction listing.
///
/// `None` fields do not constrain the result. Date bounds are inclusive.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilter {
    /// Only include transactions with this exact category.
    pub category: Option<String>,
    /// Only include transactions dated on or after this date.
    pub from: Option<Date>,
    /// Only include transactions dated on or before this date.
    pub until: Option<Date>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] or [Error::EmptyCategory] if the builder fails validation,
/// - or [Error::NotFound] if the builder's user ID does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.validate()?;

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, amount, kind, category, date, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_id, amount, kind, category, date, note, created_at",
        )?
        .query_row(
            (
                builder.user_id.as_i64(),
                builder.amount,
                builder.kind.to_string(),
                builder.category.trim(),
                builder.date,
                builder.note,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, user_id, amount, kind, category, date, note, created_at
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| error.into())
}

/// List the transactions owned by `user_id` that match `filter`.
///
/// Results are ordered most recent first (`date DESC`), with ties broken by
/// insertion order (`id DESC`).
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn list_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut sql = String::from(
        "SELECT id, user_id, amount, kind, category, date, note, created_at
         FROM \"transaction\" WHERE user_id = ?1",
    );
    let mut params: Vec<Value> = vec![Value::Integer(user_id.as_i64())];

    if let Some(category) = &filter.category {
        params.push(Value::Text(category.clone()));
        sql.push_str(&format!(" AND category = ?{}", params.len()));
    }

    if let Some(from) = filter.from {
        params.push(Value::Text(format_date(from)));
        sql.push_str(&format!(" AND date >= ?{}", params.len()));
    }

    if let Some(until) = filter.until {
        params.push(Value::Text(format_date(until)));
        sql.push_str(&format!(" AND date <= ?{}", params.len()));
    }

    sql.push_str(" ORDER BY date DESC, id DESC");

    let transactions = connection
        .prepare(&sql)?
        .query_map(rusqlite::params_from_iter(params), map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

/// Update a transaction owned by `user_id`, applying the fields set in `patch`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::Forbidden] if the transaction is owned by another user,
/// - or [Error::NegativeAmount] or [Error::EmptyCategory] if the patched row fails validation,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    patch: TransactionPatch,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let existing = get_transaction(id, connection)?;

    if existing.user_id != user_id {
        return Err(Error::Forbidden);
    }

    let updated = TransactionBuilder {
        user_id,
        amount: patch.amount.unwrap_or(existing.amount),
        kind: patch.kind.unwrap_or(existing.kind),
        category: patch.category.unwrap_or(existing.category),
        date: patch.date.unwrap_or(existing.date),
        note: patch.note.unwrap_or(existing.note),
    };
    updated.validate()?;

    connection
        .prepare(
            "UPDATE \"transaction\"
             SET amount = ?1, kind = ?2, category = ?3, date = ?4, note = ?5
             WHERE id = ?6
             RETURNING id, user_id, amount, kind, category, date, note, created_at",
        )?
        .query_row(
            (
                updated.amount,
                updated.kind.to_string(),
                updated.category.trim(),
                updated.date,
                updated.note,
                id,
            ),
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::Forbidden] if the transaction is owned by another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let existing = get_transaction(id, connection)?;

    if existing.user_id != user_id {
        return Err(Error::Forbidden);
    }

    connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", (id,))?;

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                note TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Composite index used by the transactions listing and the dashboard.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let amount = row.get(2)?;
    let raw_kind: String = row.get(3)?;
    let category = row.get(4)?;
    let date = row.get(5)?;
    let note = row.get(6)?;
    let created_at = row.get(7)?;

    let kind = raw_kind.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown transaction kind {raw_kind}").into(),
        )
    })?;

    Ok(Transaction {
        id,
        user_id: UserID::new(raw_user_id),
        amount,
        kind,
        category,
        date,
        note,
        created_at,
    })
}

fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        transaction::{
            Transaction, TransactionFilter, TransactionKind, TransactionPatch,
            create_transaction, delete_transaction, get_transaction, list_transactions,
            update_transaction,
        },
        user::{UserID, create_user},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn get_test_user(conn: &Connection) -> UserID {
        create_user("alice", PasswordHash::new_unchecked("hunter2"), conn)
            .expect("Could not create test user")
            .id
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user_id = get_test_user(&conn);
        let amount = 12.3;

        let result = create_transaction(
            Transaction::build(
                user_id,
                amount,
                TransactionKind::Expense,
                "food",
                date!(2024 - 10 - 05),
            ),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.amount, amount);
                assert_eq!(transaction.user_id, user_id);
                assert_eq!(transaction.kind, TransactionKind::Expense);
                assert_eq!(transaction.category, "food");
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_fails_on_negative_amount() {
        let conn = get_test_connection();
        let user_id = get_test_user(&conn);

        let result = create_transaction(
            Transaction::build(
                user_id,
                -1.0,
                TransactionKind::Expense,
                "food",
                date!(2024 - 10 - 05),
            ),
            &conn,
        );

        assert_eq!(result, Err(Error::NegativeAmount(-1.0)));
    }

    #[test]
    fn create_fails_on_blank_category() {
        let conn = get_test_connection();
        let user_id = get_test_user(&conn);

        let result = create_transaction(
            Transaction::build(
                user_id,
                1.0,
                TransactionKind::Expense,
                "   ",
                date!(2024 - 10 - 05),
            ),
            &conn,
        );

        assert_eq!(result, Err(Error::EmptyCategory));
    }

    #[test]
    fn create_fails_on_unknown_owner() {
        let conn = get_test_connection();

        let result = create_transaction(
            Transaction::build(
                UserID::new(42),
                1.0,
                TransactionKind::Expense,
                "food",
                date!(2024 - 10 - 05),
            ),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_returns_created_transaction() {
        let conn = get_test_connection();
        let user_id = get_test_user(&conn);
        let created = create_transaction(
            Transaction::build(
                user_id,
                55.0,
                TransactionKind::Income,
                "salary",
                date!(2024 - 01 - 01),
            )
            .note("January pay"),
            &conn,
        )
        .unwrap();

        let retrieved = get_transaction(created.id, &conn).unwrap();

        assert_eq!(retrieved, created);
    }

    #[test]
    fn get_fails_on_unknown_id() {
        let conn = get_test_connection();

        assert_eq!(get_transaction(999, &conn), Err(Error::NotFound));
    }

    #[test]
    fn list_orders_by_date_then_insertion() {
        let conn = get_test_connection();
        let user_id = get_test_user(&conn);
        let older = create_transaction(
            Transaction::build(
                user_id,
                1.0,
                TransactionKind::Expense,
                "a",
                date!(2024 - 01 - 01),
            ),
            &conn,
        )
        .unwrap();
        let first_newer = create_transaction(
            Transaction::build(
                user_id,
                2.0,
                TransactionKind::Expense,
                "b",
                date!(2024 - 02 - 01),
            ),
            &conn,
        )
        .unwrap();
        let second_newer = create_transaction(
            Transaction::build(
                user_id,
                3.0,
                TransactionKind::Expense,
                "c",
                date!(2024 - 02 - 01),
            ),
            &conn,
        )
        .unwrap();

        let transactions =
            list_transactions(user_id, &TransactionFilter::default(), &conn).unwrap();

        assert_eq!(transactions, vec![second_newer, first_newer, older]);
    }

    #[test]
    fn list_only_returns_owned_transactions() {
        let conn = get_test_connection();
        let alice = get_test_user(&conn);
        let bob = create_user("bob", PasswordHash::new_unchecked("hunter2"), &conn)
            .unwrap()
            .id;
        create_transaction(
            Transaction::build(
                alice,
                1.0,
                TransactionKind::Expense,
                "food",
                date!(2024 - 01 - 01),
            ),
            &conn,
        )
        .unwrap();

        let transactions = list_transactions(bob, &TransactionFilter::default(), &conn).unwrap();

        assert!(transactions.is_empty());
    }

    #[test]
    fn list_applies_category_and_date_filters() {
        let conn = get_test_connection();
        let user_id = get_test_user(&conn);
        let keep = create_transaction(
            Transaction::build(
                user_id,
                1.0,
                TransactionKind::Expense,
                "food",
                date!(2024 - 01 - 15),
            ),
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build(
                user_id,
                2.0,
                TransactionKind::Expense,
                "rent",
                date!(2024 - 01 - 15),
            ),
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build(
                user_id,
                3.0,
                TransactionKind::Expense,
                "food",
                date!(2024 - 03 - 01),
            ),
            &conn,
        )
        .unwrap();

        let filter = TransactionFilter {
            category: Some("food".to_owned()),
            from: Some(date!(2024 - 01 - 01)),
            until: Some(date!(2024 - 01 - 31)),
        };
        let transactions = list_transactions(user_id, &filter, &conn).unwrap();

        assert_eq!(transactions, vec![keep]);
    }

    #[test]
    fn update_replaces_patched_fields() {
        let conn = get_test_connection();
        let user_id = get_test_user(&conn);
        let created = create_transaction(
            Transaction::build(
                user_id,
                10.0,
                TransactionKind::Expense,
                "food",
                date!(2024 - 01 - 01),
            ),
            &conn,
        )
        .unwrap();

        let patch = TransactionPatch {
            amount: Some(20.0),
            category: Some("groceries".to_owned()),
            ..Default::default()
        };
        let updated = update_transaction(created.id, user_id, patch, &conn).unwrap();

        assert_eq!(updated.amount, 20.0);
        assert_eq!(updated.category, "groceries");
        assert_eq!(updated.kind, created.kind);
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn update_fails_for_foreign_transaction() {
        let conn = get_test_connection();
        let alice = get_test_user(&conn);
        let bob = create_user("bob", PasswordHash::new_unchecked("hunter2"), &conn)
            .unwrap()
            .id;
        let created = create_transaction(
            Transaction::build(
                alice,
                10.0,
                TransactionKind::Expense,
                "food",
                date!(2024 - 01 - 01),
            ),
            &conn,
        )
        .unwrap();

        let result = update_transaction(
            created.id,
            bob,
            TransactionPatch {
                amount: Some(0.0),
                ..Default::default()
            },
            &conn,
        );

        assert_eq!(result, Err(Error::Forbidden));
    }

    #[test]
    fn update_revalidates_patched_fields() {
        let conn = get_test_connection();
        let user_id = get_test_user(&conn);
        let created = create_transaction(
            Transaction::build(
                user_id,
                10.0,
                TransactionKind::Expense,
                "food",
                date!(2024 - 01 - 01),
            ),
            &conn,
        )
        .unwrap();

        let result = update_transaction(
            created.id,
            user_id,
            TransactionPatch {
                amount: Some(-5.0),
                ..Default::default()
            },
            &conn,
        );

        assert_eq!(result, Err(Error::NegativeAmount(-5.0)));
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let user_id = get_test_user(&conn);
        let created = create_transaction(
            Transaction::build(
                user_id,
                10.0,
                TransactionKind::Expense,
                "food",
                date!(2024 - 01 - 01),
            ),
            &conn,
        )
        .unwrap();

        delete_transaction(created.id, user_id, &conn).unwrap();

        assert_eq!(get_transaction(created.id, &conn), Err(Error::NotFound));
        let remaining = list_transactions(user_id, &TransactionFilter::default(), &conn).unwrap();
        assert!(remaining.is_empty());
    }

    #[test]
    fn delete_fails_on_unknown_id() {
        let conn = get_test_connection();
        let user_id = get_test_user(&conn);

        assert_eq!(delete_transaction(999, user_id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn delete_fails_for_foreign_transaction() {
        let conn = get_test_connection();
        let alice = get_test_user(&conn);
        let bob = create_user("bob", PasswordHash::new_unchecked("hunter2"), &conn)
            .unwrap()
            .id;
        let created = create_transaction(
            Transaction::build(
                alice,
                10.0,
                TransactionKind::Expense,
                "food",
                date!(2024 - 01 - 01),
            ),
            &conn,
        )
        .unwrap();

        assert_eq!(delete_transaction(created.id, bob, &conn), Err(Error::Forbidden));
    }
}
