//! /states/:state_id/cities and /cities/:city_id

use super::{destroy_one, dicts, find, insert, json_object, require, show_one, update_one, ApiResult};
use crate::entities::{City, Entity, Kind, Record};
use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;

/// Cities of one State
pub async fn list(
    State(app): State<AppState>,
    Path(state_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = app.session()?;
    find(&*store, Kind::State, &state_id)?;

    let cities = store
        .all(Some(Kind::City))?
        .into_values()
        .filter(|record| matches!(record, Record::City(city) if city.state_id == state_id));
    dicts(cities)
}

pub async fn show(
    State(app): State<AppState>,
    Path(city_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = app.session()?;
    show_one(&*store, Kind::City, &city_id)
}

pub async fn create(
    State(app): State<AppState>,
    Path(state_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut store = app.session()?;
    find(&*store, Kind::State, &state_id)?;
    let payload = json_object(&headers, &body)?;
    require(&payload, "name")?;

    let mut city = City::from_payload(payload)?;
    city.state_id = state_id;
    insert(&mut *store, city.into())
}

pub async fn update(
    State(app): State<AppState>,
    Path(city_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let mut store = app.session()?;
    update_one(&mut *store, Kind::City, &city_id, &headers, &body, &["state_id"])
}

pub async fn destroy(
    State(app): State<AppState>,
    Path(city_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut store = app.session()?;
    destroy_one(&mut *store, Kind::City, &city_id)
}
