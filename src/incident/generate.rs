//! Synthetic incident generation for load and demo testing.

use crate::incident::{map_insert_err, IncidentError, Status, UNASSIGNED};
use crate::storage::Pool;
use chrono::Utc;
use rand::Rng;
use rusqlite::params;
use tracing::info;

/// Number generation starts above this floor on an empty store.
const NUMBER_FLOOR: i64 = 30000;

const TITLE_OPTIONS: [&str; 5] = [
    "High CPU Usage",
    "Memory Leak Detected",
    "Disk Space Low",
    "API Latency High",
    "Service Unreachable",
];

const SERVICE_OPTIONS: [&str; 5] = [
    "New Relic",
    "Datadog",
    "Nagios",
    "AWS CloudWatch",
    "Azure Monitor",
];

// Generated incidents are always live; Resolved is only ever reached
// through the bulk mutation path.
const STATUS_OPTIONS: [Status; 2] = [Status::Triggered, Status::Acknowledged];

/// Mints new incidents with randomized attributes and fresh numbers.
#[derive(Clone)]
pub struct Generator {
    pool: Pool,
}

impl Generator {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create `count` incidents numbered consecutively above the current
    /// maximum. The max-read and the inserts share one transaction, and
    /// the UNIQUE constraint on `number` still backstops any race that
    /// slips past it.
    ///
    /// Attribute choice comes from the caller-supplied `rng`, so tests can
    /// seed it and assert exact output.
    pub fn generate(&self, count: usize, rng: &mut impl Rng) -> Result<Vec<i64>, IncidentError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let base: i64 = tx.query_row(
            "SELECT COALESCE(MAX(number), ?1) FROM incidents",
            [NUMBER_FLOOR],
            |row| row.get(0),
        )?;

        let mut minted = Vec::with_capacity(count);
        for i in 0..count {
            let number = base + 1 + i as i64;
            let title = TITLE_OPTIONS[rng.gen_range(0..TITLE_OPTIONS.len())];
            let service = SERVICE_OPTIONS[rng.gen_range(0..SERVICE_OPTIONS.len())];
            let status = STATUS_OPTIONS[rng.gen_range(0..STATUS_OPTIONS.len())];

            tx.execute(
                "INSERT INTO incidents (number, title, service, status, created_at, assigned_to)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![number, title, service, status, Utc::now(), UNASSIGNED],
            )
            .map_err(|e| map_insert_err(number, e))?;
            minted.push(number);
        }
        tx.commit()?;

        info!(count = minted.len(), first = ?minted.first(), "Generated synthetic incidents");
        Ok(minted)
    }
}
