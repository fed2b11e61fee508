use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::players::dto::{ProspectFilter, ProspectPage};
use crate::store::{Query, StoreError, TableStore};

const TABLE: &str = "players";

/// Prospect rows are owned by the intake flow; this layer only reads them
/// and toggles the verification flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prospect {
    pub id: Uuid,
    pub player_name: String,
    #[serde(default)]
    pub grad_class: Option<String>,
    #[serde(default)]
    pub primary_position: Option<String>,
    #[serde(default)]
    pub secondary_position: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Prospect {
    /// Substring match on name and school, case-insensitive.
    fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.player_name.to_lowercase().contains(&needle)
            || self
                .school
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&needle))
    }

    /// A position filter hits on either the primary or secondary position.
    fn matches_position(&self, position: &str) -> bool {
        self.primary_position.as_deref() == Some(position)
            || self.secondary_position.as_deref() == Some(position)
    }
}

/// Paginated prospect listing. Equality filters go to the store; search and
/// position predicates are applied here over a superset fetch, so the
/// returned total always reflects the fully filtered set. `verified_only`
/// forces the coach-portal view regardless of the requested filter.
pub async fn list(
    store: &dyn TableStore,
    filter: &ProspectFilter,
    verified_only: bool,
) -> Result<ProspectPage, ApiError> {
    let page = filter.page.max(1);
    let page_size = filter.page_size.clamp(1, 100);

    let mut query = Query::new().order_desc("created_at");
    if let Some(grad_class) = &filter.grad_class {
        query = query.eq("grad_class", grad_class);
    }
    if let Some(gender) = &filter.gender {
        query = query.eq("gender", gender);
    }
    if verified_only {
        query = query.eq("verified", true);
    } else if let Some(verified) = filter.verified {
        query = query.eq("verified", verified);
    }

    let needs_local_filter = filter.search.is_some() || filter.position.is_some();
    let offset = (page - 1) * page_size;

    if !needs_local_filter {
        // Everything is expressible as equality predicates; let the store
        // paginate and take its exact count.
        let result = store
            .select(TABLE, &query.clone().limit(page_size).offset(offset))
            .await?;
        let players = decode(result.rows)?;
        return Ok(paged(players, result.total, page, page_size));
    }

    let result = store.select(TABLE, &query).await?;
    let mut players = decode(result.rows)?;
    if let Some(search) = &filter.search {
        players.retain(|p| p.matches_search(search));
    }
    if let Some(position) = &filter.position {
        players.retain(|p| p.matches_position(position));
    }
    let total = players.len() as u64;
    let players = players
        .into_iter()
        .skip(offset as usize)
        .take(page_size as usize)
        .collect();
    Ok(paged(players, total, page, page_size))
}

/// Reads the current flag, flips it and returns what was actually
/// persisted. Two concurrent toggles are last-write-wins at the store.
pub async fn toggle_verified(store: &dyn TableStore, id: Uuid) -> Result<bool, ApiError> {
    let page = store
        .select(TABLE, &Query::new().eq("id", id).limit(1))
        .await?;
    let row = page
        .rows
        .into_iter()
        .next()
        .ok_or(ApiError::NotFound("player not found"))?;
    let current = row
        .get("verified")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);

    let updated = store
        .update(TABLE, &Query::new().eq("id", id), json!({"verified": !current}))
        .await?;
    let persisted = updated
        .into_iter()
        .next()
        .ok_or(ApiError::NotFound("player not found"))?;
    Ok(persisted
        .get("verified")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(!current))
}

fn decode(rows: Vec<serde_json::Value>) -> Result<Vec<Prospect>, ApiError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::from)
}

fn paged(players: Vec<Prospect>, total: u64, page: u64, page_size: u64) -> ProspectPage {
    ProspectPage {
        players,
        total,
        page,
        page_size,
        total_pages: total.div_ceil(page_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn seed_players(store: &MemStore, count: usize) {
        let rows = (0..count)
            .map(|i| {
                json!({
                    "id": Uuid::new_v4(),
                    "player_name": if i % 9 == 0 { format!("Jane Smith {i}") } else { format!("Player {i}") },
                    "grad_class": if i % 2 == 0 { "2026" } else { "2027" },
                    "primary_position": if i % 3 == 0 { "PG" } else { "SG" },
                    "secondary_position": if i % 5 == 0 { "PG" } else { "SF" },
                    "school": "Lincoln High",
                    "gender": "F",
                    "height": "5'10\"",
                    "verified": i % 2 == 0,
                    "created_at": format!("2026-01-01T00:00:{:02}Z", i % 60),
                })
            })
            .collect();
        store.seed("players", rows);
    }

    fn filter() -> ProspectFilter {
        ProspectFilter {
            page: 1,
            page_size: 20,
            grad_class: None,
            position: None,
            gender: None,
            verified: None,
            search: None,
        }
    }

    #[tokio::test]
    async fn paginates_forty_five_rows_into_three_pages() {
        let store = MemStore::default();
        seed_players(&store, 45);

        let page1 = list(&store, &filter(), false).await.unwrap();
        assert_eq!(page1.total, 45);
        assert_eq!(page1.total_pages, 3);
        assert_eq!(page1.players.len(), 20);

        let past_the_end = ProspectFilter { page: 4, ..filter() };
        let page4 = list(&store, &past_the_end, false).await.unwrap();
        assert_eq!(page4.players.len(), 0);
        assert_eq!(page4.total, 45);
    }

    #[tokio::test]
    async fn equality_filters_are_exact() {
        let store = MemStore::default();
        seed_players(&store, 20);

        let by_class = ProspectFilter { grad_class: Some("2026".into()), ..filter() };
        let result = list(&store, &by_class, false).await.unwrap();
        assert_eq!(result.total, 10);
        assert!(result.players.iter().all(|p| p.grad_class.as_deref() == Some("2026")));

        let verified = ProspectFilter { verified: Some(true), ..filter() };
        let result = list(&store, &verified, false).await.unwrap();
        assert!(result.players.iter().all(|p| p.verified));
        assert_eq!(result.total, 10);
    }

    #[tokio::test]
    async fn search_and_position_combine_and_count_filtered_total() {
        let store = MemStore::default();
        seed_players(&store, 45);

        let combined = ProspectFilter {
            search: Some("smith".into()),
            position: Some("PG".into()),
            ..filter()
        };
        let result = list(&store, &combined, false).await.unwrap();
        assert!(!result.players.is_empty());
        assert_eq!(result.total, result.players.len() as u64);
        for p in &result.players {
            assert!(p.player_name.to_lowercase().contains("smith"));
            assert!(
                p.primary_position.as_deref() == Some("PG")
                    || p.secondary_position.as_deref() == Some("PG")
            );
        }
    }

    #[tokio::test]
    async fn position_matches_secondary_position_too() {
        let store = MemStore::default();
        store.seed(
            "players",
            vec![json!({
                "id": Uuid::new_v4(),
                "player_name": "Combo Guard",
                "primary_position": "SG",
                "secondary_position": "PG",
                "verified": false,
                "created_at": "2026-01-01T00:00:00Z",
            })],
        );
        let by_position = ProspectFilter { position: Some("PG".into()), ..filter() };
        let result = list(&store, &by_position, false).await.unwrap();
        assert_eq!(result.total, 1);
    }

    #[tokio::test]
    async fn verified_only_overrides_requested_filter() {
        let store = MemStore::default();
        seed_players(&store, 10);
        let asking_for_unverified = ProspectFilter { verified: Some(false), ..filter() };
        let result = list(&store, &asking_for_unverified, true).await.unwrap();
        assert!(result.players.iter().all(|p| p.verified));
    }

    #[tokio::test]
    async fn toggle_twice_restores_original_value() {
        let store = MemStore::default();
        let id = Uuid::new_v4();
        store.seed(
            "players",
            vec![json!({
                "id": id,
                "player_name": "Toggle Me",
                "verified": false,
                "created_at": "2026-01-01T00:00:00Z",
            })],
        );

        assert!(toggle_verified(&store, id).await.unwrap());
        assert!(!toggle_verified(&store, id).await.unwrap());

        let missing = toggle_verified(&store, Uuid::new_v4()).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }
}
