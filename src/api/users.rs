//! /users
//!
//! Passwords arrive in clear and are stored as digests; `email` is fixed
//! once the account exists.

use super::{
    destroy_one, dict, find, insert, json_object, list_kind, require, show_one, ApiError, ApiResult,
};
use crate::entities::{Entity, Kind, Record, User};
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
    list_kind(&*store, Kind::User)
}

pub async fn show(
    State(app): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = app.session()?;
    show_one(&*store, Kind::User, &user_id)
}

pub async fn create(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut store = app.session()?;
    let payload = json_object(&headers, &body)?;
    require(&payload, "email")?;
    let password = require(&payload, "password")?.to_string();

    let mut user = User::from_payload(payload)?;
    user.set_password(&password);
    insert(&mut *store, user.into())
}

pub async fn update(
    State(app): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let mut store = app.session()?;
    let mut record = find(&*store, Kind::User, &user_id)?;
    let payload = json_object(&headers, &body)?;
    record.apply_payload(&payload, &["email"])?;

    if let (Record::User(user), Some(password)) = (&mut record, payload.get("password")) {
        let password = password
            .as_str()
            .ok_or_else(|| ApiError::BadRequest("password must be a string".to_string()))?;
        user.set_password(password);
    }

    store.save_record(&mut record)?;
    Ok(Json(dict(&record)?))
}

pub async fn destroy(
    State(app): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut store = app.session()?;
    destroy_one(&mut *store, Kind::User, &user_id)
}
