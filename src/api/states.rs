//! /states

use super::{destroy_one, insert, json_object, list_kind, require, show_one, update_one, ApiResult};
use crate::entities::{self, Entity, Kind};
use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;

pub async fn list(State(app): State<AppState>) -> ApiResult<Json<Value>> {
    let store = app.session()?;
    list_kind(&*store, Kind::State)
}

pub async fn show(
    State(app): State<AppState>,
    Path(state_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = app.session()?;
    show_one(&*store, Kind::State, &state_id)
}

pub async fn create(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut store = app.session()?;
    let payload = json_object(&headers, &body)?;
    require(&payload, "name")?;

    let state = entities::State::from_payload(payload)?;
    insert(&mut *store, state.into())
}

pub async fn update(
    State(app): State<AppState>,
    Path(state_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let mut store = app.session()?;
    update_one(&mut *store, Kind::State, &state_id, &headers, &body, &[])
}

pub async fn destroy(
    State(app): State<AppState>,
    Path(state_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut store = app.session()?;
    destroy_one(&mut *store, Kind::State, &state_id)
}
