use crate::services::store::{
    is_valid_column, DataStore, Direction, Filter, Predicate, Record, StoreError, StoreResult, Table,
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;

/// Direct PostgreSQL access to the service tables
///
/// Rows travel as JSON (`to_jsonb` on the way out, `jsonb_populate_record`
/// on the way in) so the same untyped records flow through every backend.
/// Filters compare the text form of a column, which is exact for the id and
/// string columns the service filters on.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect, then run the embedded migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from optional settings, applying defaults
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn ident(column: &str) -> StoreResult<String> {
    if is_valid_column(column) {
        Ok(format!("\"{}\"", column))
    } else {
        Err(StoreError::InvalidFilter(format!("invalid column name '{}'", column)))
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_predicate(qb: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) -> StoreResult<()> {
    match predicate {
        Predicate::Eq(c, Value::Null) => {
            qb.push(format!("t.{} IS NULL", ident(c)?));
        }
        Predicate::Neq(c, Value::Null) => {
            qb.push(format!("t.{} IS NOT NULL", ident(c)?));
        }
        Predicate::Eq(c, v) => {
            qb.push(format!("t.{}::text = ", ident(c)?));
            qb.push_bind(text(v));
        }
        Predicate::Neq(c, v) => {
            qb.push(format!("t.{}::text <> ", ident(c)?));
            qb.push_bind(text(v));
        }
        Predicate::In(c, values) => {
            if values.is_empty() {
                qb.push("FALSE");
            } else {
                qb.push(format!("t.{}::text = ANY(", ident(c)?));
                qb.push_bind(values.iter().map(text).collect::<Vec<String>>());
                qb.push(")");
            }
        }
        Predicate::Or(inner) => {
            if inner.is_empty() {
                qb.push("FALSE");
            } else {
                qb.push("(");
                for (i, p) in inner.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    push_predicate(qb, p)?;
                }
                qb.push(")");
            }
        }
    }
    Ok(())
}

/// Build the SELECT for a filter
pub fn select_query(table: Table, filter: &Filter) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT to_jsonb(t) AS doc FROM {} AS t WHERE TRUE",
        table.as_str()
    ));

    for predicate in &filter.predicates {
        qb.push(" AND ");
        push_predicate(&mut qb, predicate)?;
    }

    if let Some(order) = &filter.order {
        let direction = match order.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        qb.push(format!(" ORDER BY t.{} {} NULLS LAST", ident(&order.column)?, direction));
    }

    Ok(qb)
}

fn into_record(doc: Value) -> StoreResult<Record> {
    match doc {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidResponse(format!("row is not an object: {}", other))),
    }
}

#[async_trait]
impl DataStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn select(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Record>> {
        let mut qb = select_query(table, filter)?;
        let rows = qb.build().fetch_all(&self.pool).await?;

        tracing::debug!("Selected {} rows from {}", rows.len(), table);

        rows.iter()
            .map(|row| -> StoreResult<Record> { into_record(row.try_get::<Value, _>("doc")?) })
            .collect()
    }

    async fn insert(&self, table: Table, mut record: Record) -> StoreResult<Record> {
        // jsonb_populate_record yields NULL for absent keys, which would
        // override the column defaults.
        if matches!(record.get("id"), None | Some(Value::Null)) {
            record.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
        if matches!(record.get("created_at"), None | Some(Value::Null)) {
            record.insert("created_at".to_string(), Value::String(chrono::Utc::now().to_rfc3339()));
        }

        let sql = format!(
            "INSERT INTO {table} AS t SELECT * FROM jsonb_populate_record(NULL::{table}, $1) RETURNING to_jsonb(t) AS doc",
            table = table.as_str()
        );

        let row = sqlx::query(&sql)
            .bind(Value::Object(record))
            .fetch_one(&self.pool)
            .await?;

        into_record(row.try_get::<Value, _>("doc")?)
    }

    async fn update(&self, table: Table, id: &str, patch: Record) -> StoreResult<Record> {
        let columns = patch
            .keys()
            .filter(|c| c.as_str() != "id")
            .map(|c| ident(c))
            .collect::<StoreResult<Vec<_>>>()?;

        if columns.is_empty() {
            return self
                .find_by_id(table, id)
                .await?
                .ok_or_else(|| StoreError::NotFound {
                    table,
                    id: id.to_string(),
                });
        }

        let assignments = columns
            .iter()
            .map(|c| format!("{c} = p.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "UPDATE {table} AS t SET {assignments} FROM jsonb_populate_record(NULL::{table}, $1) AS p WHERE t.id::text = $2 RETURNING to_jsonb(t) AS doc",
            table = table.as_str(),
        );

        let row = sqlx::query(&sql)
            .bind(Value::Object(patch))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                table,
                id: id.to_string(),
            })?;

        into_record(row.try_get::<Value, _>("doc")?)
    }

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        let sql = format!("DELETE FROM {} WHERE id::text = $1", table.as_str());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                table,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
