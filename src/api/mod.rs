//! REST API v1
//!
//! Every handler follows the same validation order:
//! 1. the record named by the path (target or parent) must exist -> 404
//! 2. the body must be a JSON object -> 400 "Not a JSON"
//! 3. required fields, in order -> 400 "Missing <field>"; a field that
//!    references another record is resolved right after its presence check -> 404

pub mod amenities;
pub mod cities;
pub mod error;
pub mod index;
pub mod places;
pub mod places_amenities;
pub mod reviews;
pub mod states;
pub mod users;

pub use error::{ApiError, ApiResult};

use crate::entities::{Kind, Record};
use crate::server::AppState;
use crate::storage::Storage;
use axum::{
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(index::status))
        .route("/stats", get(index::stats))
        .route("/states", get(states::list).post(states::create))
        .route(
            "/states/:state_id",
            get(states::show).put(states::update).delete(states::destroy),
        )
        .route(
            "/states/:state_id/cities",
            get(cities::list).post(cities::create),
        )
        .route(
            "/cities/:city_id",
            get(cities::show).put(cities::update).delete(cities::destroy),
        )
        .route("/amenities", get(amenities::list).post(amenities::create))
        .route(
            "/amenities/:amenity_id",
            get(amenities::show)
                .put(amenities::update)
                .delete(amenities::destroy),
        )
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:user_id",
            get(users::show).put(users::update).delete(users::destroy),
        )
        .route(
            "/cities/:city_id/places",
            get(places::list).post(places::create),
        )
        .route(
            "/places/:place_id",
            get(places::show).put(places::update).delete(places::destroy),
        )
        .route(
            "/places/:place_id/reviews",
            get(reviews::list).post(reviews::create),
        )
        .route(
            "/reviews/:review_id",
            get(reviews::show).put(reviews::update).delete(reviews::destroy),
        )
        .route(
            "/places/:place_id/amenities",
            get(places_amenities::list),
        )
        .route(
            "/places/:place_id/amenities/:amenity_id",
            post(places_amenities::link).delete(places_amenities::unlink),
        )
}

// ============================================================================
// Shared handler steps
// ============================================================================

/// Parse a request body that must be a JSON object sent as application/json
pub(crate) fn json_object(headers: &HeaderMap, body: &[u8]) -> ApiResult<Map<String, Value>> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Err(ApiError::NotJson);
    }

    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ApiError::NotJson),
    }
}

/// A required field, as a string
pub(crate) fn require<'a>(payload: &'a Map<String, Value>, field: &'static str) -> ApiResult<&'a str> {
    match payload.get(field) {
        None | Some(Value::Null) => Err(ApiError::Missing(field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ApiError::BadRequest(format!("{} must be a string", field))),
    }
}

pub(crate) fn find(store: &dyn Storage, kind: Kind, id: &str) -> ApiResult<Record> {
    store.get(kind, id)?.ok_or(ApiError::NotFound)
}

/// Response form of a record. Password digests never leave the server.
pub(crate) fn dict(record: &Record) -> ApiResult<Value> {
    let mut dict = record.to_dict()?;
    dict.remove("password");
    Ok(Value::Object(dict))
}

pub(crate) fn dicts<I>(records: I) -> ApiResult<Json<Value>>
where
    I: IntoIterator<Item = Record>,
{
    let list = records
        .into_iter()
        .map(|record| dict(&record))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(Value::Array(list)))
}

pub(crate) fn list_kind(store: &dyn Storage, kind: Kind) -> ApiResult<Json<Value>> {
    dicts(store.all(Some(kind))?.into_values())
}

pub(crate) fn show_one(store: &dyn Storage, kind: Kind, id: &str) -> ApiResult<Json<Value>> {
    Ok(Json(dict(&find(store, kind, id)?)?))
}

/// Register, persist and answer 201 with the new record
pub(crate) fn insert(store: &mut dyn Storage, record: Record) -> ApiResult<(StatusCode, Json<Value>)> {
    store.new(record.clone())?;
    store.save()?;
    tracing::info!(key = %record.key(), "created");
    Ok((StatusCode::CREATED, Json(dict(&record)?)))
}

/// Apply a payload to an existing record, skipping `protected` fields
pub(crate) fn update_one(
    store: &mut dyn Storage,
    kind: Kind,
    id: &str,
    headers: &HeaderMap,
    body: &[u8],
    protected: &[&str],
) -> ApiResult<Json<Value>> {
    let mut record = find(store, kind, id)?;
    let payload = json_object(headers, body)?;
    record.apply_payload(&payload, protected)?;
    store.save_record(&mut record)?;
    Ok(Json(dict(&record)?))
}

pub(crate) fn destroy_one(store: &mut dyn Storage, kind: Kind, id: &str) -> ApiResult<Json<Value>> {
    let record = find(store, kind, id)?;
    store.delete(&record)?;
    store.save()?;
    tracing::info!(key = %record.key(), "deleted");
    Ok(Json(json!({})))
}
