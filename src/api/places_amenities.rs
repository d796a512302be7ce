//! /places/:place_id/amenities - Place <-> Amenity links

use super::{dict, dicts, find, ApiError, ApiResult};
use crate::entities::{Kind, Place, Record};
use crate::server::AppState;
use crate::storage::Storage;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

fn find_place(store: &dyn Storage, place_id: &str) -> ApiResult<Place> {
    Place::try_from(find(store, Kind::Place, place_id)?).map_err(|_| ApiError::NotFound)
}

/// Amenities linked to a Place. Links to deleted amenities are skipped.
pub async fn list(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = app.session()?;
    let place = find_place(&*store, &place_id)?;

    let mut amenities = Vec::with_capacity(place.amenity_ids.len());
    for amenity_id in &place.amenity_ids {
        if let Some(amenity) = store.get(Kind::Amenity, amenity_id)? {
            amenities.push(amenity);
        }
    }
    dicts(amenities)
}

/// 201 with the amenity when linked now, 200 when it already was
pub async fn link(
    State(app): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut store = app.session()?;
    let mut place = find_place(&*store, &place_id)?;
    let amenity = find(&*store, Kind::Amenity, &amenity_id)?;

    if !place.add_amenity(&amenity_id) {
        return Ok((StatusCode::OK, Json(dict(&amenity)?)));
    }

    let mut record = Record::from(place);
    store.save_record(&mut record)?;
    tracing::info!(place = %place_id, amenity = %amenity_id, "amenity linked");
    Ok((StatusCode::CREATED, Json(dict(&amenity)?)))
}

pub async fn unlink(
    State(app): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let mut store = app.session()?;
    let mut place = find_place(&*store, &place_id)?;
    find(&*store, Kind::Amenity, &amenity_id)?;

    if !place.remove_amenity(&amenity_id) {
        return Err(ApiError::NotFound);
    }

    let mut record = Record::from(place);
    store.save_record(&mut record)?;
    tracing::info!(place = %place_id, amenity = %amenity_id, "amenity unlinked");
    Ok(Json(json!({})))
}
