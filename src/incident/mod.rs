//! Incident domain core -- records, lifecycle statuses, store, queries,
//! bulk mutations, and synthetic generation.

pub mod bulk;
pub mod generate;
pub mod query;
pub mod store;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel assignee meaning "nobody owns this yet".
pub const UNASSIGNED: &str = "--";

#[derive(Debug, Error)]
pub enum IncidentError {
    #[error("incident {0} not found")]
    NotFound(i64),
    #[error("incident number {0} already exists")]
    DuplicateNumber(i64),
    #[error("missing incident_ids or action")]
    MissingParameters,
    #[error("invalid action '{0}'")]
    InvalidAction(String),
    #[error("missing assignee for reassign action")]
    MissingAssignee,
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Lifecycle status of an incident. Closed set; anything else in the
/// database is a corruption and surfaces as a read error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Triggered,
    Acknowledged,
    Resolved,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Triggered => "Triggered",
            Status::Acknowledged => "Acknowledged",
            Status::Resolved => "Resolved",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unrecognized status '{0}'")]
pub struct ParseStatusError(String);

impl std::str::FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Triggered" => Ok(Status::Triggered),
            "Acknowledged" => Ok(Status::Acknowledged),
            "Resolved" => Ok(Status::Resolved),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse::<Status>()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// An alert record from a monitoring tool.
///
/// `id` is the internal surrogate key; every external operation (lookup,
/// bulk update) addresses incidents by `number` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: i64,
    pub number: i64,
    pub title: String,
    pub service: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub assigned_to: String,
}

/// Shared row mapping for `SELECT id, number, title, service, status,
/// created_at, assigned_to` queries.
pub(crate) fn incident_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Incident> {
    Ok(Incident {
        id: row.get(0)?,
        number: row.get(1)?,
        title: row.get(2)?,
        service: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        assigned_to: row.get(6)?,
    })
}

/// Translate a SQLite uniqueness violation on `number` into the domain
/// error; anything else passes through unchanged.
pub(crate) fn map_insert_err(number: i64, e: rusqlite::Error) -> IncidentError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            IncidentError::DuplicateNumber(number)
        }
        _ => IncidentError::Db(e),
    }
}
