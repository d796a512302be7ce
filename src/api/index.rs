//! Service status and per-kind counts

use super::ApiResult;
use crate::entities::Kind;
use crate::server::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Map, Value};

/// GET /status
pub async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// GET /stats - number of records of each kind
pub async fn stats(State(app): State<AppState>) -> ApiResult<Json<Value>> {
    let store = app.session()?;

    let mut counts = Map::new();
    for kind in Kind::ALL {
        counts.insert(kind.plural().to_string(), json!(store.count(Some(kind))?));
    }

    Ok(Json(Value::Object(counts)))
}
