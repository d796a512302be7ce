//! /cities/:city_id/places and /places/:place_id

use super::{destroy_one, dicts, find, insert, json_object, require, show_one, update_one, ApiResult};
use crate::entities::{Entity, Kind, Place, Record};
use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;

/// Links are managed through /places/:place_id/amenities only
const PROTECTED: [&str; 3] = ["user_id", "city_id", "amenity_ids"];

/// Places of one City
pub async fn list(
    State(app): State<AppState>,
    Path(city_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = app.session()?;
    find(&*store, Kind::City, &city_id)?;

    let places = store
        .all(Some(Kind::Place))?
        .into_values()
        .filter(|record| matches!(record, Record::Place(place) if place.city_id == city_id));
    dicts(places)
}

pub async fn show(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = app.session()?;
    show_one(&*store, Kind::Place, &place_id)
}

pub async fn create(
    State(app): State<AppState>,
    Path(city_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut store = app.session()?;
    find(&*store, Kind::City, &city_id)?;
    let mut payload = json_object(&headers, &body)?;
    let user_id = require(&payload, "user_id")?.to_string();
    find(&*store, Kind::User, &user_id)?;
    require(&payload, "name")?;

    payload.remove("amenity_ids");
    let mut place = Place::from_payload(payload)?;
    place.city_id = city_id;
    place.user_id = user_id;
    insert(&mut *store, place.into())
}

pub async fn update(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let mut store = app.session()?;
    update_one(&mut *store, Kind::Place, &place_id, &headers, &body, &PROTECTED)
}

pub async fn destroy(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut store = app.session()?;
    destroy_one(&mut *store, Kind::Place, &place_id)
}
