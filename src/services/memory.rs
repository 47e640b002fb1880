use crate::services::store::{DataStore, Filter, Record, StoreError, StoreResult, Table};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process table store
///
/// Rows keep insertion order. Generated columns (`id`, `created_at`) are
/// filled on insert the way the hosted database fills its defaults.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn row_count(&self, table: Table) -> usize {
        self.tables
            .read()
            .await
            .get(&table)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }
}

fn is_missing(record: &Record, column: &str) -> bool {
    matches!(record.get(column), None | Some(Value::Null))
}

fn row_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(|v| v.as_str())
}

#[async_trait]
impl DataStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn select(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Record>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Record> = tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        filter.sort(&mut rows);
        tracing::trace!("memory select {} -> {} rows", table, rows.len());
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut record: Record) -> StoreResult<Record> {
        if is_missing(&record, "id") {
            record.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
        if is_missing(&record, "created_at") {
            let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
            record.insert("created_at".to_string(), Value::String(now));
        }

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        if let Some(id) = row_id(&record) {
            if rows.iter().any(|r| row_id(r) == Some(id)) {
                return Err(StoreError::ApiError {
                    status: 409,
                    message: format!("duplicate key id={} in {}", id, table),
                });
            }
        }
        rows.push(record.clone());

        Ok(record)
    }

    async fn update(&self, table: Table, id: &str, patch: Record) -> StoreResult<Record> {
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
            .ok_or_else(|| StoreError::NotFound {
                table,
                id: id.to_string(),
            })?;

        for (column, value) in patch {
            if column != "id" {
                row.insert(column, value);
            }
        }

        Ok(row.clone())
    }

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| row_id(r) != Some(id));

        if rows.len() == before {
            return Err(StoreError::NotFound {
                table,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
