use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        extract::AdminUser,
        repo::{self, AccountKind},
    },
    coaches::dto::{CoachFilter, CoachPage, CoachVerifiedResponse},
    error::ApiError,
    state::AppState,
    store::{Query as StoreQuery, StoreError},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/coaches", get(list_coaches))
        .route("/admin/coaches/:id/verify", patch(toggle_verified))
}

#[instrument(skip(state, _admin))]
pub async fn list_coaches(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(filter): Query<CoachFilter>,
) -> Result<Json<CoachPage>, ApiError> {
    let page = filter.page.max(1);
    let page_size = filter.page_size.clamp(1, 100);

    let mut query = StoreQuery::new()
        .order_desc("created_at")
        .limit(page_size)
        .offset((page - 1) * page_size);
    if let Some(verified) = filter.verified {
        query = query.eq("is_verified", verified);
    }

    let result = state.store.select(AccountKind::Coach.table(), &query).await?;
    let coaches = result
        .rows
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(CoachPage {
        coaches,
        total: result.total,
        page,
        page_size,
        total_pages: result.total.div_ceil(page_size),
    }))
}

/// Flips a coach's verification flag and returns the persisted state.
#[instrument(skip(state, admin))]
pub async fn toggle_verified(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CoachVerifiedResponse>, ApiError> {
    let coach = repo::find_by_id(state.store.as_ref(), AccountKind::Coach, id)
        .await?
        .ok_or(ApiError::NotFound("coach not found"))?;
    let updated = repo::set_flags(
        state.store.as_ref(),
        AccountKind::Coach,
        id,
        None,
        Some(!coach.is_verified),
    )
    .await?;
    info!(coach_id = %id, admin_id = %admin.0.sub, is_verified = updated.is_verified, "coach verification toggled");
    Ok(Json(CoachVerifiedResponse {
        is_verified: updated.is_verified,
    }))
}
