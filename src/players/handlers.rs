use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extract::{ActiveCoach, AdminUser},
    error::ApiError,
    players::{
        dto::{ProspectFilter, ProspectPage, VerifiedResponse},
        repo,
    },
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/players", get(list_players))
        .route("/admin/players/:id/verify", patch(toggle_verified))
}

pub fn coach_routes() -> Router<AppState> {
    Router::new().route("/coach/prospects", get(browse_prospects))
}

#[instrument(skip(state, _admin))]
pub async fn list_players(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(filter): Query<ProspectFilter>,
) -> Result<Json<ProspectPage>, ApiError> {
    let page = repo::list(state.store.as_ref(), &filter, false).await?;
    Ok(Json(page))
}

#[instrument(skip(state, admin))]
pub async fn toggle_verified(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<VerifiedResponse>, ApiError> {
    let verified = repo::toggle_verified(state.store.as_ref(), id).await?;
    info!(player_id = %id, admin_id = %admin.0.sub, verified, "player verification toggled");
    Ok(Json(VerifiedResponse { verified }))
}

/// Coach portal view: always restricted to verified prospects.
#[instrument(skip(state, _coach))]
pub async fn browse_prospects(
    State(state): State<AppState>,
    _coach: ActiveCoach,
    Query(filter): Query<ProspectFilter>,
) -> Result<Json<ProspectPage>, ApiError> {
    let page = repo::list(state.store.as_ref(), &filter, true).await?;
    Ok(Json(page))
}
