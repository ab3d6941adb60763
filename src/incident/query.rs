//! Filtered views and dashboard aggregate counts.

use crate::incident::{incident_from_row, Incident, IncidentError, ParseStatusError, Status};
use crate::storage::Pool;
use rusqlite::ToSql;
use serde::Serialize;

/// Status dimension of a dashboard filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// No status condition (absent or the explicit `Any` token).
    #[default]
    Any,
    /// `Triggered` or `Acknowledged`.
    Open,
    /// Exact match on one status.
    Is(Status),
}

impl StatusFilter {
    /// Parse the `status` query parameter. Absent, empty, and `Any` all
    /// mean "no filter"; `Open` expands to the two non-resolved statuses;
    /// anything else must be a literal status value.
    pub fn parse(raw: Option<&str>) -> Result<Self, ParseStatusError> {
        match raw {
            None | Some("") | Some("Any") => Ok(StatusFilter::Any),
            Some("Open") => Ok(StatusFilter::Open),
            Some(literal) => Ok(StatusFilter::Is(literal.parse()?)),
        }
    }
}

/// Assignee dimension of a dashboard filter. The original UI only ever
/// sends `me`; any other token is treated as no filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssigneeFilter {
    #[default]
    Any,
    /// Resolves to the configured current-user identity.
    Me,
}

impl AssigneeFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("me") => AssigneeFilter::Me,
            _ => AssigneeFilter::Any,
        }
    }
}

/// Dashboard summary counts over the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub triggered_count: i64,
    pub acknowledged_count: i64,
    pub resolved_count: i64,
    pub open_count: i64,
    pub total: i64,
}

/// WHERE-clause builder that only ever binds values parametrically.
/// Column names come from code, never from callers.
#[derive(Default)]
struct Conditions {
    clauses: Vec<String>,
    values: Vec<Box<dyn ToSql>>,
}

impl Conditions {
    fn eq(&mut self, column: &'static str, value: impl ToSql + 'static) {
        self.clauses.push(format!("{column} = ?"));
        self.values.push(Box::new(value));
    }

    fn one_of<V: ToSql + 'static>(&mut self, column: &'static str, values: Vec<V>) {
        let placeholders = vec!["?"; values.len()].join(", ");
        self.clauses.push(format!("{column} IN ({placeholders})"));
        for v in values {
            self.values.push(Box::new(v));
        }
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    fn params(&self) -> Vec<&dyn ToSql> {
        self.values.iter().map(|v| v.as_ref()).collect()
    }
}

/// Read side of the incident table: filtered listings and the aggregate
/// counts behind the dashboard summary.
#[derive(Clone)]
pub struct QueryEngine {
    pool: Pool,
    current_user: String,
}

impl QueryEngine {
    /// `current_user` is the identity the `me` assignee filter resolves to.
    pub fn new(pool: Pool, current_user: impl Into<String>) -> Self {
        Self {
            pool,
            current_user: current_user.into(),
        }
    }

    /// Filtered view, active conditions ANDed, ordered by number
    /// descending so the newest incidents come first.
    pub fn filter(
        &self,
        status: StatusFilter,
        assignee: AssigneeFilter,
    ) -> Result<Vec<Incident>, IncidentError> {
        let mut conditions = Conditions::default();

        match status {
            StatusFilter::Any => {}
            StatusFilter::Open => {
                conditions.one_of("status", vec![Status::Triggered, Status::Acknowledged]);
            }
            StatusFilter::Is(s) => conditions.eq("status", s),
        }
        if assignee == AssigneeFilter::Me {
            conditions.eq("assigned_to", self.current_user.clone());
        }

        let sql = format!(
            "SELECT id, number, title, service, status, created_at, assigned_to
             FROM incidents{} ORDER BY number DESC",
            conditions.where_sql()
        );

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(&conditions.params()[..], incident_from_row)?;

        let mut incidents = Vec::new();
        for r in rows {
            incidents.push(r?);
        }
        Ok(incidents)
    }

    /// Summary counts over the entire unfiltered store, computed fresh on
    /// every call. `open_count` is triggered plus acknowledged, so
    /// `open_count + resolved_count` always equals `total`.
    pub fn aggregate_counts(&self) -> Result<Summary, IncidentError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM incidents GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Status>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut triggered = 0;
        let mut acknowledged = 0;
        let mut resolved = 0;
        for r in rows {
            let (status, count) = r?;
            match status {
                Status::Triggered => triggered = count,
                Status::Acknowledged => acknowledged = count,
                Status::Resolved => resolved = count,
            }
        }

        Ok(Summary {
            triggered_count: triggered,
            acknowledged_count: acknowledged,
            resolved_count: resolved,
            open_count: triggered + acknowledged,
            total: triggered + acknowledged + resolved,
        })
    }
}
