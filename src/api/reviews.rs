//! /places/:place_id/reviews and /reviews/:review_id

use super::{destroy_one, dicts, find, insert, json_object, require, show_one, update_one, ApiResult};
use crate::entities::{Entity, Kind, Record, Review};
use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;

/// Reviews of one Place
pub async fn list(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = app.session()?;
    find(&*store, Kind::Place, &place_id)?;

    let reviews = store
        .all(Some(Kind::Review))?
        .into_values()
        .filter(|record| matches!(record, Record::Review(review) if review.place_id == place_id));
    dicts(reviews)
}

pub async fn show(
    State(app): State<AppState>,
    Path(review_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = app.session()?;
    show_one(&*store, Kind::Review, &review_id)
}

pub async fn create(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut store = app.session()?;
    find(&*store, Kind::Place, &place_id)?;
    let payload = json_object(&headers, &body)?;
    let user_id = require(&payload, "user_id")?.to_string();
    find(&*store, Kind::User, &user_id)?;
    require(&payload, "text")?;

    let mut review = Review::from_payload(payload)?;
    review.place_id = place_id;
    review.user_id = user_id;
    insert(&mut *store, review.into())
}

pub async fn update(
    State(app): State<AppState>,
    Path(review_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let mut store = app.session()?;
    update_one(
        &mut *store,
        Kind::Review,
        &review_id,
        &headers,
        &body,
        &["user_id", "place_id"],
    )
}

pub async fn destroy(
    State(app): State<AppState>,
    Path(review_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut store = app.session()?;
    destroy_one(&mut *store, Kind::Review, &review_id)
}
