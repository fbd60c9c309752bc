//! The thin administrative surface: pause/resume/step on the tick
//! engine and read-only zone/registry inspection, routed through
//! `AdminHandle` so every read goes through the same transactional
//! path the tick pipeline itself uses. Gated on a bearer token checked
//! against the external `AdminAuth` boundary.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use game_model::ZoneId;
use serde_json::json;

use crate::app_state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/pause", post(pause))
        .route("/admin/resume", post(resume))
        .route("/admin/step", post(step))
        .route("/admin/state", get(engine_state))
        .route("/admin/zones/{zone_id}", get(inspect_zone))
        .route("/admin/zones/{zone_id}/subscribers", get(inspect_subscribers))
        .route("/admin/zones", get(inspect_subscribed_zones))
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), StatusCode> {
    let Some(auth) = &state.admin_auth else {
        return Err(StatusCode::NOT_FOUND);
    };
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");
    auth.authorize(token.as_bytes())
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

async fn pause(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(code) = authorize(&state, &headers).await {
        return code;
    }
    state.admin.pause().await;
    StatusCode::OK
}

async fn resume(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(code) = authorize(&state, &headers).await {
        return code;
    }
    state.admin.resume().await;
    StatusCode::OK
}

async fn step(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(code) = authorize(&state, &headers).await {
        return code;
    }
    state.admin.step().await;
    StatusCode::OK
}

async fn engine_state(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, StatusCode> {
    authorize(&state, &headers).await?;
    Ok(Json(json!({
        "state": format!("{:?}", state.admin.engine_state().await),
        "tick_number": state.admin.tick_number(),
    })))
}

async fn inspect_zone(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(zone_id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    authorize(&state, &headers).await?;
    let zone = state
        .admin
        .inspect_zone(ZoneId(zone_id))
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let entities = state
        .admin
        .inspect_entities(ZoneId(zone_id))
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    Ok(Json(json!({ "zone": zone, "entities": entities })))
}

async fn inspect_subscribers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(zone_id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    authorize(&state, &headers).await?;
    let subscribers = state.admin.inspect_subscribers(ZoneId(zone_id)).await;
    let payload: Vec<_> = subscribers
        .into_iter()
        .map(|s| json!({ "player_id": s.player_id, "connection_id": s.connection_id }))
        .collect();
    Ok(Json(json!({ "subscribers": payload })))
}

async fn inspect_subscribed_zones(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, StatusCode> {
    authorize(&state, &headers).await?;
    let zones = state.admin.inspect_subscribed_zones().await;
    Ok(Json(json!({ "zones": zones })))
}
