use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// A single table row as returned by the data collaborator
pub type Record = Map<String, Value>;

/// Errors that can occur when talking to a data collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Unauthorized: invalid service key")]
    Unauthorized,

    #[error("No row with id '{id}' in {table}")]
    NotFound { table: Table, id: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Tables the service reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Cows,
    BreedingMatches,
    WelfareReports,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Cows => "cows",
            Table::BreedingMatches => "breeding_matches",
            Table::WelfareReports => "welfare_reports",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter condition on one column
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(String, Value),
    Neq(String, Value),
    In(String, Vec<Value>),
    /// Satisfied when any inner predicate is
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Predicate::Eq(column.to_string(), value.into())
    }

    pub fn neq(column: &str, value: impl Into<Value>) -> Self {
        Predicate::Neq(column.to_string(), value.into())
    }

    pub fn in_list<V: Into<Value>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::In(column.to_string(), values.into_iter().map(Into::into).collect())
    }

    /// Evaluate against a row. A missing or null column never satisfies
    /// `Neq`, matching SQL three-valued logic.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Eq(column, expected) => record
                .get(column)
                .map(|actual| values_equal(actual, expected))
                .unwrap_or(false),
            Predicate::Neq(column, expected) => match record.get(column) {
                None | Some(Value::Null) => false,
                Some(actual) => !values_equal(actual, expected),
            },
            Predicate::In(column, options) => record
                .get(column)
                .map(|actual| options.iter().any(|o| values_equal(actual, o)))
                .unwrap_or(false),
            Predicate::Or(inner) => inner.iter().any(|p| p.matches(record)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// Conjunction of predicates with an optional ordering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub predicates: Vec<Predicate>,
    pub order: Option<Order>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: &str) -> Self {
        Self::new().eq("id", id)
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::eq(column, value));
        self
    }

    pub fn neq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::neq(column, value));
        self
    }

    pub fn in_list<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.predicates.push(Predicate::in_list(column, values));
        self
    }

    pub fn any_of(mut self, predicates: Vec<Predicate>) -> Self {
        self.predicates.push(Predicate::Or(predicates));
        self
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Sort rows in place according to the filter's ordering, if any.
    /// Nulls sort last in both directions.
    pub fn sort(&self, records: &mut [Record]) {
        let Some(order) = &self.order else {
            return;
        };

        records.sort_by(|a, b| {
            let left = a.get(&order.column).filter(|v| !v.is_null());
            let right = b.get(&order.column).filter(|v| !v.is_null());
            match (left, right) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(l), Some(r)) => {
                    let ord = compare_values(l, r);
                    match order.direction {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    }
                }
            }
        });
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Table-oriented data collaborator
///
/// Implementations: [`PostgrestClient`](super::PostgrestClient) for a hosted
/// PostgREST endpoint, [`PgStore`](super::PgStore) for direct PostgreSQL and
/// [`MemoryStore`](super::MemoryStore) for development and tests.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;

    async fn select(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Record>>;

    /// Insert a row and return it as stored (with generated columns filled)
    async fn insert(&self, table: Table, record: Record) -> StoreResult<Record>;

    /// Apply a partial update to the row with `id` and return the updated row
    async fn update(&self, table: Table, id: &str, patch: Record) -> StoreResult<Record>;

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()>;

    async fn find_by_id(&self, table: Table, id: &str) -> StoreResult<Option<Record>> {
        let mut rows = self.select(table, &Filter::by_id(id)).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

/// Serialize a typed value into a row
pub fn to_record<T: Serialize>(value: &T) -> StoreResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidResponse(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Deserialize a row into a typed value
pub fn from_record<T: DeserializeOwned>(record: Record) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

pub fn from_records<T: DeserializeOwned>(records: Vec<Record>) -> StoreResult<Vec<T>> {
    records.into_iter().map(from_record).collect()
}

/// Column names are interpolated into SQL and URLs, so only plain
/// identifiers are accepted.
pub fn is_valid_column(column: &str) -> bool {
    !column.is_empty()
        && column.len() <= 63
        && column
            .chars()
            .next()
            .map(|c| c.is_ascii_lowercase() || c == '_')
            .unwrap_or(false)
        && column
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
