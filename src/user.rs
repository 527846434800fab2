//! Code for creating the user table and managing users in the database.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user logs in with. Unique across the application.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

impl User {
    /// Create a new user.
    ///
    /// The caller should ensure that `id` is unique.
    pub fn new(id: UserID, username: &str, password_hash: PasswordHash) -> Self {
        Self {
            id,
            username: username.to_owned(),
            password_hash,
        }
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] if `username` is already taken,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    username: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .execute(
            "INSERT INTO user (username, password) VALUES (?1, ?2)",
            (username, password_hash.to_string()),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateUsername(username.to_owned()),
            error => error.into(),
        })?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User::new(id, username, password_hash))
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, username, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database whose username is `username`.
///
/// # Errors
///
/// This function will return an error if:
/// - `username` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_username(username: &str, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, username, password FROM user WHERE username = :username")?
        .query_row(&[(":username", &username)], map_user_row)
        .map_err(|error| error.into())
}

/// Replace the password hash stored for `user_id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn update_password(
    user_id: UserID,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.to_string(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete the user `user_id` along with all of their transactions.
///
/// Both deletions happen inside a single transaction so a user row is never
/// left behind without its ledger, or vice versa.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let sql_transaction = rusqlite::Transaction::new_unchecked(
        connection,
        rusqlite::TransactionBehavior::Immediate,
    )?;

    sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE user_id = ?1",
        (user_id.as_i64(),),
    )?;
    let rows_affected =
        sql_transaction.execute("DELETE FROM user WHERE id = ?1", (user_id.as_i64(),))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    sql_transaction.commit()?;

    Ok(())
}

fn map_user_row(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let username: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(raw_id),
        username,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
