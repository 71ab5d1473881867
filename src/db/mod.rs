pub mod queries;

use anyhow::Context;
use chrono::NaiveDate;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckinRow {
    pub date: NaiveDate,
    pub completed: bool,
    pub note: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a check-in for {0} is already recorded")]
    DuplicateDate(NaiveDate),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    /// Records a check-in. An existing row for `date` is never replaced.
    pub fn insert_checkin(
        &self,
        date: NaiveDate,
        completed: bool,
        note: Option<&str>,
    ) -> StoreResult<()> {
        match self
            .conn
            .execute(queries::INSERT_CHECKIN, params![date, completed, note])
        {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(error, _))
                if error.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateDate(date))
            }
            Err(error) => Err(error.into()),
        }
    }

    pub fn checkin(&self, date: NaiveDate) -> StoreResult<Option<CheckinRow>> {
        let row = self
            .conn
            .query_row(queries::SELECT_CHECKIN, params![date], |row| {
                Ok(CheckinRow {
                    date: row.get(0)?,
                    completed: row.get(1)?,
                    note: row.get(2)?,
                })
            })
            .optional()?;

        Ok(row)
    }

    pub fn recent_checkins(&self, limit: u32) -> StoreResult<Vec<CheckinRow>> {
        let mut statement = self.conn.prepare(queries::SELECT_RECENT_CHECKINS)?;

        let rows = statement
            .query_map(params![limit], |row| {
                Ok(CheckinRow {
                    date: row.get(0)?,
                    completed: row.get(1)?,
                    note: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list check-ins")?;

        Ok(rows)
    }

    pub fn completed_dates_desc(&self) -> StoreResult<Vec<NaiveDate>> {
        let mut statement = self.conn.prepare(queries::SELECT_COMPLETED_DATES_DESC)?;

        let dates = statement
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<NaiveDate>, _>>()
            .context("Failed to query completed dates")?;

        Ok(dates)
    }
}
