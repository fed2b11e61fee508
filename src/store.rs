//! Generic query gateway over the remote table store.
//!
//! The backing store speaks a PostgREST-style REST dialect: equality
//! predicates as `field=eq.value` query parameters, exact row counts via
//! the `Content-Range` response header, and `Prefer: return=representation`
//! for mutations. Anything richer than an equality filter (substring
//! search, or-matching) is the caller's job.

use std::time::Duration;

use axum::async_trait;
use serde_json::Value;
use tracing::error;

use crate::config::StoreConfig;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected store payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("store returned an empty representation")]
    EmptyReply,
}

/// Equality-only filter set plus pagination and ordering.
#[derive(Debug, Default, Clone)]
pub struct Query {
    pub filters: Vec<(String, String)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub order_desc: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl ToString) -> Self {
        self.filters.push((field.to_string(), value.to_string()));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn order_desc(mut self, field: &str) -> Self {
        self.order_desc = Some(field.to_string());
        self
    }
}

/// One page of rows plus the exact filtered total (not the page length).
#[derive(Debug, Clone)]
pub struct Page {
    pub rows: Vec<Value>,
    pub total: u64,
}

/// The table store boundary. Rows are schemaless JSON objects; repositories
/// deserialize them into their own types. Results are always sequences,
/// never auto-unwrapped singletons.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Page, StoreError>;
    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError>;
    async fn update(&self, table: &str, query: &Query, patch: Value)
        -> Result<Vec<Value>, StoreError>;
    async fn count(&self, table: &str, query: &Query) -> Result<u64, StoreError>;
}

/// PostgREST-style client for the remote store.
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn params(query: &Query) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = query
            .filters
            .iter()
            .map(|(field, value)| (field.clone(), format!("eq.{value}")))
            .collect();
        if let Some(field) = &query.order_desc {
            params.push(("order".into(), format!("{field}.desc")));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".into(), limit.to_string()));
        }
        if let Some(offset) = query.offset {
            params.push(("offset".into(), offset.to_string()));
        }
        params
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        error!(status = status.as_u16(), %message, "store responded with an error");
        Err(StoreError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TableStore for RestStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Page, StoreError> {
        let resp = self
            .authed(self.http.get(self.table_url(table)))
            .query(&Self::params(query))
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let total = content_range_total(&resp);
        let rows: Vec<Value> = resp.json().await?;
        let total = total.unwrap_or(rows.len() as u64);
        Ok(Page { rows, total })
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        let resp = self
            .authed(self.http.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let mut rows: Vec<Value> = resp.json().await?;
        if rows.is_empty() {
            return Err(StoreError::EmptyReply);
        }
        Ok(rows.remove(0))
    }

    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let resp = self
            .authed(self.http.patch(self.table_url(table)))
            .query(&Self::params(query))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let rows: Vec<Value> = resp.json().await?;
        Ok(rows)
    }

    async fn count(&self, table: &str, query: &Query) -> Result<u64, StoreError> {
        let counting = query.clone().limit(0);
        let resp = self
            .authed(self.http.get(self.table_url(table)))
            .query(&Self::params(&counting))
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(content_range_total(&resp).unwrap_or(0))
    }
}

/// Pulls the exact total out of a `Content-Range` header such as
/// `0-19/45`, `items 0-19/45` or `*/45`.
fn content_range_total(resp: &reqwest::Response) -> Option<u64> {
    let raw = resp
        .headers()
        .get(reqwest::header::CONTENT_RANGE)?
        .to_str()
        .ok()?;
    parse_content_range(raw)
}

fn parse_content_range(raw: &str) -> Option<u64> {
    let total = raw.rsplit('/').next()?.trim();
    if total == "*" {
        return Some(0);
    }
    total.parse().ok()
}

#[cfg(test)]
pub use mem::MemStore;

#[cfg(test)]
mod mem {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory stand-in for the remote store, honoring the same
    /// equality-filter, ordering and pagination semantics.
    #[derive(Default)]
    pub struct MemStore {
        tables: Mutex<HashMap<String, Vec<Value>>>,
    }

    impl MemStore {
        pub fn seed(&self, table: &str, rows: Vec<Value>) {
            self.tables
                .lock()
                .unwrap()
                .entry(table.to_string())
                .or_default()
                .extend(rows);
        }

        pub fn rows(&self, table: &str) -> Vec<Value> {
            self.tables
                .lock()
                .unwrap()
                .get(table)
                .cloned()
                .unwrap_or_default()
        }

        fn matches(row: &Value, filters: &[(String, String)]) -> bool {
            filters.iter().all(|(field, want)| {
                match row.get(field) {
                    Some(Value::String(s)) => s == want,
                    Some(Value::Bool(b)) => b.to_string() == *want,
                    Some(Value::Number(n)) => n.to_string() == *want,
                    _ => false,
                }
            })
        }
    }

    #[async_trait]
    impl TableStore for MemStore {
        async fn select(&self, table: &str, query: &Query) -> Result<Page, StoreError> {
            let tables = self.tables.lock().unwrap();
            let mut rows: Vec<Value> = tables
                .get(table)
                .map(|rows| {
                    rows.iter()
                        .filter(|row| Self::matches(row, &query.filters))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            if let Some(field) = &query.order_desc {
                rows.sort_by(|a, b| {
                    let ka = a.get(field).and_then(Value::as_str).unwrap_or("");
                    let kb = b.get(field).and_then(Value::as_str).unwrap_or("");
                    kb.cmp(ka)
                });
            }
            let total = rows.len() as u64;
            let offset = query.offset.unwrap_or(0) as usize;
            let rows: Vec<Value> = rows
                .into_iter()
                .skip(offset)
                .take(query.limit.map(|l| l as usize).unwrap_or(usize::MAX))
                .collect();
            Ok(Page { rows, total })
        }

        async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
            self.tables
                .lock()
                .unwrap()
                .entry(table.to_string())
                .or_default()
                .push(row.clone());
            Ok(row)
        }

        async fn update(
            &self,
            table: &str,
            query: &Query,
            patch: Value,
        ) -> Result<Vec<Value>, StoreError> {
            let mut tables = self.tables.lock().unwrap();
            let mut updated = Vec::new();
            if let Some(rows) = tables.get_mut(table) {
                for row in rows.iter_mut() {
                    if Self::matches(row, &query.filters) {
                        if let (Some(target), Some(changes)) =
                            (row.as_object_mut(), patch.as_object())
                        {
                            for (key, value) in changes {
                                target.insert(key.clone(), value.clone());
                            }
                        }
                        updated.push(row.clone());
                    }
                }
            }
            Ok(updated)
        }

        async fn count(&self, table: &str, query: &Query) -> Result<u64, StoreError> {
            let tables = self.tables.lock().unwrap();
            let count = tables
                .get(table)
                .map(|rows| {
                    rows.iter()
                        .filter(|row| Self::matches(row, &query.filters))
                        .count()
                })
                .unwrap_or(0);
            Ok(count as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn content_range_variants() {
        assert_eq!(parse_content_range("0-19/45"), Some(45));
        assert_eq!(parse_content_range("items 0-19/45"), Some(45));
        assert_eq!(parse_content_range("*/45"), Some(45));
        assert_eq!(parse_content_range("*/*"), Some(0));
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[tokio::test]
    async fn mem_store_filters_and_paginates() {
        let store = MemStore::default();
        store.seed(
            "players",
            (0..5)
                .map(|i| {
                    json!({
                        "id": i.to_string(),
                        "grad_class": if i % 2 == 0 { "2026" } else { "2027" },
                        "verified": i < 3,
                        "created_at": format!("2026-01-0{}T00:00:00Z", i + 1),
                    })
                })
                .collect(),
        );

        let page = store
            .select("players", &Query::new().eq("grad_class", "2026"))
            .await
            .unwrap();
        assert_eq!(page.total, 3);

        let page = store
            .select("players", &Query::new().eq("verified", true))
            .await
            .unwrap();
        assert_eq!(page.total, 3);

        // Total reflects the filtered set even when the page is clipped.
        let page = store
            .select(
                "players",
                &Query::new().order_desc("created_at").limit(2).offset(4),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0]["id"], "0");
    }

    #[tokio::test]
    async fn mem_store_update_patches_matching_rows() {
        let store = MemStore::default();
        store.seed("players", vec![json!({"id": "a", "verified": false})]);
        let updated = store
            .update(
                "players",
                &Query::new().eq("id", "a"),
                json!({"verified": true}),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["verified"], true);
        assert_eq!(store.rows("players")[0]["verified"], true);
    }
}
