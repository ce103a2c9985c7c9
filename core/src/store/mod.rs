//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine calls store methods and never executes SQL directly.

use crate::error::PetResult;
use rusqlite::{params, types::FromSql, Connection, OptionalExtension, ToSql};

mod game;

pub use game::keys;

pub struct PetStore {
    conn: Connection,
}

impl PetStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> PetResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PetResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PetResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Key/value primitives ───────────────────────────────────

    fn get<T: FromSql>(&self, key: &str) -> PetResult<Option<T>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, T>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Read `key`, falling back to `default` when it is missing or holds
    /// a value of the wrong type.
    pub(crate) fn get_or<T: FromSql>(&self, key: &str, default: T) -> PetResult<T> {
        match self.get::<T>(key) {
            Ok(Some(v)) => Ok(v),
            Ok(None) => Ok(default),
            Err(crate::error::PetError::Database(
                e @ (rusqlite::Error::InvalidColumnType(..)
                | rusqlite::Error::FromSqlConversionFailure(..)
                | rusqlite::Error::IntegralValueOutOfRange(..)),
            )) => {
                log::warn!("unreadable value for key '{key}', using default: {e}");
                Ok(default)
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn put<T: ToSql>(&self, key: &str, value: T) -> PetResult<()> {
        put_on(&self.conn, key, value)
    }

    /// Run `f` inside one transaction so multi-key writes land together.
    pub(crate) fn write_batch<F>(&self, f: F) -> PetResult<()>
    where
        F: FnOnce(&Connection) -> PetResult<()>,
    {
        let tx = self.conn.unchecked_transaction()?;
        f(&tx)?;
        tx.commit()?;
        Ok(())
    }

    pub(crate) fn remove(&self, keys: &[&str]) -> PetResult<()> {
        self.write_batch(|conn| {
            for key in keys {
                conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            }
            Ok(())
        })
    }

    pub fn contains(&self, key: &str) -> PetResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }
}

pub(crate) fn put_on<T: ToSql>(conn: &Connection, key: &str, value: T) -> PetResult<()> {
    conn.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}
