//! Durable incident table with enforced uniqueness on `number`.

use crate::incident::{incident_from_row, map_insert_err, Incident, IncidentError, Status};
use crate::storage::Pool;
use chrono::Utc;
use rusqlite::{params, ToSql};
use tracing::debug;

const SELECT_COLUMNS: &str = "id, number, title, service, status, created_at, assigned_to";

/// Which column a bulk update may touch. Keeping this a closed enum means
/// the SET clause is never built from caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateField {
    Status,
    AssignedTo,
}

impl UpdateField {
    fn column(&self) -> &'static str {
        match self {
            UpdateField::Status => "status",
            UpdateField::AssignedTo => "assigned_to",
        }
    }
}

#[derive(Clone)]
pub struct IncidentStore {
    pool: Pool,
}

impl IncidentStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Populate the table with the fixed bootstrap set if it is empty.
    /// Calling this against a populated store changes nothing.
    /// Returns the number of rows inserted.
    pub fn seed_if_empty(&self) -> Result<usize, IncidentError> {
        let seed: &[(i64, &str, &str, Status, &str)] = &[
            (32521, "Slow performance on Web Server", "New Relic", Status::Acknowledged, "Dave"),
            (32519, "Low Appdex on DB Server", "New Relic", Status::Triggered, "--"),
            (32518, "A triggered incident", "Enterprise performance", Status::Triggered, "--"),
            (32517, "A triggered incident", "Enterprise performance", Status::Triggered, "--"),
            (32514, "Slow performance on Web Server", "New Relic", Status::Triggered, "--"),
            (32512, "Low Appdex on Web Server", "New Relic", Status::Triggered, "--"),
            (32511, "High Load on Web Server", "New Relic", Status::Triggered, "--"),
            (32510, "A triggered incident", "logic monitor stuff", Status::Triggered, "--"),
            (32509, "A triggered incident", "Nagios", Status::Triggered, "--"),
        ];

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))?;
        if existing > 0 {
            debug!(existing, "Incident table already populated, skipping seed");
            return Ok(0);
        }

        for (number, title, service, status, assigned_to) in seed {
            tx.execute(
                "INSERT INTO incidents (number, title, service, status, created_at, assigned_to)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![number, title, service, status, Utc::now(), assigned_to],
            )?;
        }
        tx.commit()?;
        Ok(seed.len())
    }

    /// Insert a new incident, returning its internal id.
    /// Fails with [`IncidentError::DuplicateNumber`] if `number` is taken.
    pub fn insert(
        &self,
        number: i64,
        title: &str,
        service: &str,
        status: Status,
        assigned_to: &str,
    ) -> Result<i64, IncidentError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO incidents (number, title, service, status, created_at, assigned_to)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![number, title, service, status, Utc::now(), assigned_to],
        )
        .map_err(|e| map_insert_err(number, e))?;

        Ok(conn.last_insert_rowid())
    }

    /// Look up one incident by its external number.
    pub fn find_by_number(&self, number: i64) -> Result<Incident, IncidentError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM incidents WHERE number = ?1"
        ))?;

        let mut rows = stmt.query_map([number], incident_from_row)?;
        match rows.next() {
            Some(row) => Ok(row?),
            None => Err(IncidentError::NotFound(number)),
        }
    }

    /// Every record, in storage order.
    pub fn list_all(&self) -> Result<Vec<Incident>, IncidentError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM incidents"))?;

        let rows = stmt.query_map([], incident_from_row)?;
        let mut incidents = Vec::new();
        for r in rows {
            incidents.push(r?);
        }
        Ok(incidents)
    }

    /// Set `field` to `value` for every record whose number is in `numbers`,
    /// as one statement. Numbers with no matching record are skipped; the
    /// affected row count tells callers how many actually matched.
    pub fn update_by_numbers(
        &self,
        numbers: &[i64],
        field: UpdateField,
        value: &str,
    ) -> Result<usize, IncidentError> {
        if numbers.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; numbers.len()].join(", ");
        let sql = format!(
            "UPDATE incidents SET {} = ? WHERE number IN ({placeholders})",
            field.column()
        );

        let mut bound: Vec<&dyn ToSql> = Vec::with_capacity(numbers.len() + 1);
        bound.push(&value);
        for n in numbers {
            bound.push(n);
        }

        let conn = self.pool.get()?;
        let changed = conn.execute(&sql, &bound[..])?;
        Ok(changed)
    }
}
