use crate::services::store::{
    is_valid_column, DataStore, Direction, Filter, Predicate, Record, StoreError, StoreResult, Table,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Client for a PostgREST table API (the REST layer Supabase exposes)
///
/// Handles all table traffic for the hosted database:
/// - Filtered selects with PostgREST operators
/// - Inserts and partial updates returning the stored row
/// - Deletes by primary key
pub struct PostgrestClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl PostgrestClient {
    /// Create a new client for `{base_url}/rest/v1`
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table.as_str())
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
    }

    async fn read_rows(response: Response, context: &str) -> StoreResult<Vec<Record>> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("PostgREST {} failed: {} - {}", context, status, body);
            return Err(StoreError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let json: Value = response.json().await?;
        let rows = json
            .as_array()
            .ok_or_else(|| StoreError::InvalidResponse(format!("{}: expected a JSON array", context)))?;

        rows.iter()
            .map(|row| {
                row.as_object()
                    .cloned()
                    .ok_or_else(|| StoreError::InvalidResponse(format!("{}: row is not an object", context)))
            })
            .collect()
    }
}

/// Render a value as a bare PostgREST operand
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a value inside a list or logic tree, where reserved characters
/// must be double-quoted
fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}

fn check_column(column: &str) -> StoreResult<()> {
    if is_valid_column(column) {
        Ok(())
    } else {
        Err(StoreError::InvalidFilter(format!("invalid column name '{}'", column)))
    }
}

/// Operator and operand, e.g. `eq.Gir` or `in.("a","b")`
fn operator(predicate: &Predicate, nested: bool) -> StoreResult<String> {
    let render = |v: &Value| if nested { quoted(v) } else { literal(v) };

    match predicate {
        Predicate::Eq(_, Value::Null) => Ok("is.null".to_string()),
        Predicate::Neq(_, Value::Null) => Ok("not.is.null".to_string()),
        Predicate::Eq(_, v) => Ok(format!("eq.{}", render(v))),
        Predicate::Neq(_, v) => Ok(format!("neq.{}", render(v))),
        Predicate::In(_, values) => Ok(format!(
            "in.({})",
            values.iter().map(quoted).collect::<Vec<_>>().join(",")
        )),
        Predicate::Or(inner) => Ok(format!("({})", logic_tree(inner)?)),
    }
}

fn logic_tree(predicates: &[Predicate]) -> StoreResult<String> {
    let parts = predicates
        .iter()
        .map(|p| -> StoreResult<String> {
            match p {
                Predicate::Eq(c, _) | Predicate::Neq(c, _) | Predicate::In(c, _) => {
                    check_column(c)?;
                    Ok(format!("{}.{}", c, operator(p, true)?))
                }
                Predicate::Or(_) => Ok(format!("or{}", operator(p, true)?)),
            }
        })
        .collect::<StoreResult<Vec<_>>>()?;

    Ok(parts.join(","))
}

/// Translate a filter into PostgREST query parameters
pub fn query_pairs(filter: &Filter) -> StoreResult<Vec<(String, String)>> {
    let mut pairs = vec![("select".to_string(), "*".to_string())];

    for predicate in &filter.predicates {
        match predicate {
            Predicate::Eq(c, _) | Predicate::Neq(c, _) | Predicate::In(c, _) => {
                check_column(c)?;
                pairs.push((c.clone(), operator(predicate, false)?));
            }
            Predicate::Or(_) => pairs.push(("or".to_string(), operator(predicate, false)?)),
        }
    }

    if let Some(order) = &filter.order {
        check_column(&order.column)?;
        let direction = match order.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        pairs.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }

    Ok(pairs)
}

fn encode_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn id_query(id: &str) -> String {
    encode_query(&[("id".to_string(), format!("eq.{}", id))])
}

#[async_trait]
impl DataStore for PostgrestClient {
    fn backend(&self) -> &'static str {
        "postgrest"
    }

    async fn select(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Record>> {
        let url = format!("{}?{}", self.table_url(table), encode_query(&query_pairs(filter)?));
        tracing::debug!("PostgREST select: {}", url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let rows = Self::read_rows(response, "select").await?;

        tracing::debug!("Selected {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    async fn insert(&self, table: Table, record: Record) -> StoreResult<Record> {
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;

        Self::read_rows(response, "insert")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse("insert returned no rows".into()))
    }

    async fn update(&self, table: Table, id: &str, patch: Record) -> StoreResult<Record> {
        let url = format!("{}?{}", self.table_url(table), id_query(id));

        let response = self
            .authorized(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        Self::read_rows(response, "update")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                table,
                id: id.to_string(),
            })
    }

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        let url = format!("{}?{}", self.table_url(table), id_query(id));

        let response = self
            .authorized(self.client.delete(&url))
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let deleted = Self::read_rows(response, "delete").await?;
        if deleted.is_empty() {
            return Err(StoreError::NotFound {
                table,
                id: id.to_string(),
            });
        }

        tracing::debug!("Deleted {} from {}", id, table);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        let url = format!("{}/rest/v1/", self.base_url.trim_end_matches('/'));
        let response = self.authorized(self.client.get(&url)).send().await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client(url: String) -> PostgrestClient {
        PostgrestClient::new(url, "service_key".to_string(), 5).unwrap()
    }

    #[test]
    fn test_query_pairs_for_candidate_filter() {
        let filter = Filter::new()
            .neq("owner_id", "u1")
            .eq("breed", "Gir")
            .eq("health_status", "healthy")
            .eq("gender", "male");

        let pairs = query_pairs(&filter).unwrap();

        assert_eq!(pairs[0], ("select".to_string(), "*".to_string()));
        assert!(pairs.contains(&("owner_id".to_string(), "neq.u1".to_string())));
        assert!(pairs.contains(&("breed".to_string(), "eq.Gir".to_string())));
        assert!(pairs.contains(&("gender".to_string(), "eq.male".to_string())));
    }

    #[test]
    fn test_or_clause_quotes_values() {
        let filter = Filter::new().any_of(vec![
            Predicate::in_list("cow1_id", ["a", "b"]),
            Predicate::in_list("cow2_id", ["a", "b"]),
        ]);

        let pairs = query_pairs(&filter).unwrap();

        assert_eq!(
            pairs[1],
            (
                "or".to_string(),
                r#"(cow1_id.in.("a","b"),cow2_id.in.("a","b"))"#.to_string()
            )
        );
    }

    #[test]
    fn test_rejects_unsafe_column() {
        let filter = Filter::new().eq("breed&select=secret", "Gir");
        assert!(matches!(query_pairs(&filter), Err(StoreError::InvalidFilter(_))));
    }

    #[tokio::test]
    async fn test_select_sends_filters_and_keys() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/cows")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("breed".into(), "eq.Gir".into()),
                Matcher::UrlEncoded("order".into(), "created_at.desc".into()),
            ]))
            .match_header("apikey", "service_key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([{"id": "c1", "breed": "Gir"}]).to_string())
            .create_async()
            .await;

        let filter = Filter::new()
            .eq("breed", "Gir")
            .order_by("created_at", Direction::Descending);
        let rows = client(server.url()).select(Table::Cows, &filter).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "c1");
    }

    #[tokio::test]
    async fn test_update_with_no_rows_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PATCH", "/rest/v1/breeding_matches")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.m1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let mut patch = Record::new();
        patch.insert("status".to_string(), json!("accepted"));

        let result = client(server.url())
            .update(Table::BreedingMatches, "m1", patch)
            .await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/rest/v1/welfare_reports")
            .with_status(401)
            .with_body(r#"{"message":"JWT expired"}"#)
            .create_async()
            .await;

        let result = client(server.url())
            .insert(Table::WelfareReports, Record::new())
            .await;

        assert!(matches!(result, Err(StoreError::Unauthorized)));
    }
}
