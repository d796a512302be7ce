//! Server-rendered HTML pages
//!
//! Read-only views over storage. Templates are minijinja files included at
//! compile time; `.html` names get HTML auto-escaping.

use crate::api::ApiError;
use crate::entities::{Amenity, City, Kind, Place, Record, State as StateModel};
use crate::error::StorageError;
use crate::server::AppState;
use crate::storage::Storage;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use minijinja::{context, Environment};
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

const TEMPLATES: [(&str, &str); 6] = [
    ("base.html", include_str!("templates/base.html")),
    ("states_list.html", include_str!("templates/states_list.html")),
    ("cities_by_states.html", include_str!("templates/cities_by_states.html")),
    ("states.html", include_str!("templates/states.html")),
    ("hbnb_filters.html", include_str!("templates/hbnb_filters.html")),
    ("hbnb.html", include_str!("templates/hbnb.html")),
];

/// How many places the /hbnb page shows
const HBNB_PLACES: usize = 6;

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "failed to render page");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

type PageResult = Result<Html<String>, PageError>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(hello))
        .route("/c/:text", get(c_text))
        .route("/python", get(python_default))
        .route("/python/:text", get(python_text))
        .route("/number/:n", get(number))
        .route("/states_list", get(states_list))
        .route("/cities_by_states", get(cities_by_states))
        .route("/states", get(states))
        .route("/states/:state_id", get(state_cities))
        .route("/hbnb_filters", get(hbnb_filters))
        .route("/hbnb", get(hbnb))
}

static ENVIRONMENT: OnceLock<Environment<'static>> = OnceLock::new();

/// The shared template environment, parsed on first use
fn environment() -> Result<&'static Environment<'static>, minijinja::Error> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }

    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(ENVIRONMENT.get_or_init(|| env))
}

fn render<S: Serialize>(name: &str, ctx: S) -> PageResult {
    Ok(Html(environment()?.get_template(name)?.render(ctx)?))
}

// ============================================================================
// View models
// ============================================================================

#[derive(Serialize)]
struct StateView {
    id: String,
    name: String,
    cities: Vec<City>,
}

fn sorted_states(store: &dyn Storage) -> Result<Vec<StateModel>, StorageError> {
    let mut states: Vec<StateModel> = store
        .all(Some(Kind::State))?
        .into_values()
        .filter_map(|record| StateModel::try_from(record).ok())
        .collect();
    states.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(states)
}

/// States by name, each with its cities by name
fn states_with_cities(store: &dyn Storage) -> Result<Vec<StateView>, StorageError> {
    let cities: Vec<City> = store
        .all(Some(Kind::City))?
        .into_values()
        .filter_map(|record| City::try_from(record).ok())
        .collect();

    Ok(sorted_states(store)?
        .into_iter()
        .map(|state| {
            let mut own: Vec<City> = cities
                .iter()
                .filter(|city| city.state_id == state.base.id)
                .cloned()
                .collect();
            own.sort_by(|a, b| a.name.cmp(&b.name));
            StateView {
                id: state.base.id,
                name: state.name,
                cities: own,
            }
        })
        .collect())
}

fn sorted_amenities(store: &dyn Storage) -> Result<Vec<Amenity>, StorageError> {
    let mut amenities: Vec<Amenity> = store
        .all(Some(Kind::Amenity))?
        .into_values()
        .filter_map(|record| Amenity::try_from(record).ok())
        .collect();
    amenities.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(amenities)
}

// ============================================================================
// Plain text routes
// ============================================================================

async fn hello() -> &'static str {
    "Hello HBNB!"
}

/// Underscores in the path read as spaces
fn spaced(text: &str) -> String {
    text.replace('_', " ")
}

async fn c_text(Path(text): Path<String>) -> String {
    format!("C {}", spaced(&text))
}

async fn python_default() -> String {
    "Python is cool".to_string()
}

async fn python_text(Path(text): Path<String>) -> String {
    format!("Python {}", spaced(&text))
}

/// Only unsigned integers match; anything else is an unknown route
async fn number(Path(n): Path<String>) -> Result<String, ApiError> {
    let n: u64 = parse_number(&n).ok_or(ApiError::NotFound)?;
    Ok(format!("{} is a number", n))
}

fn parse_number(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

// ============================================================================
// Storage-backed pages
// ============================================================================

async fn states_list(State(app): State<AppState>) -> PageResult {
    let store = app.session()?;
    let states = sorted_states(&*store)?;
    render("states_list.html", context! { states })
}

async fn cities_by_states(State(app): State<AppState>) -> PageResult {
    let store = app.session()?;
    let states = states_with_cities(&*store)?;
    render("cities_by_states.html", context! { states })
}

async fn states(State(app): State<AppState>) -> PageResult {
    let store = app.session()?;
    let states = sorted_states(&*store)?;
    render("states.html", context! { states, listing => true })
}

async fn state_cities(State(app): State<AppState>, Path(state_id): Path<String>) -> PageResult {
    let store = app.session()?;
    let state = states_with_cities(&*store)?
        .into_iter()
        .find(|state| state.id == state_id);
    render("states.html", context! { state, listing => false })
}

async fn hbnb_filters(State(app): State<AppState>) -> PageResult {
    let store = app.session()?;
    let states = states_with_cities(&*store)?;
    let amenities = sorted_amenities(&*store)?;
    render("hbnb_filters.html", context! { states, amenities })
}

async fn hbnb(State(app): State<AppState>) -> PageResult {
    let store = app.session()?;
    let states = states_with_cities(&*store)?;
    let amenities = sorted_amenities(&*store)?;

    let mut places: Vec<Place> = store
        .all(Some(Kind::Place))?
        .into_values()
        .filter_map(|record: Record| Place::try_from(record).ok())
        .collect();
    places.sort_by(|a, b| a.name.cmp(&b.name));
    places.truncate(HBNB_PLACES);

    render("hbnb.html", context! { states, amenities, places })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Entity;

    #[test]
    fn test_every_template_compiles() {
        let env = environment().unwrap();
        for (name, _) in TEMPLATES {
            env.get_template(name).unwrap();
        }
        assert!(std::ptr::eq(env, environment().unwrap()));
    }

    #[test]
    fn test_parse_number_accepts_digits_only() {
        assert_eq!(parse_number("89"), Some(89));
        assert_eq!(parse_number("0"), Some(0));
        assert_eq!(parse_number("-5"), None);
        assert_eq!(parse_number("+5"), None);
        assert_eq!(parse_number("eighty"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_states_list_escapes_names() {
        let mut state = StateModel::new("<script>");
        state.base.id = "1".to_string();
        let html = render("states_list.html", context! { states => vec![state] }).unwrap();

        assert!(html.0.contains("&lt;script&gt;"));
        assert!(!html.0.contains("<script>"));
    }

    #[test]
    fn test_state_page_not_found() {
        let html = render(
            "states.html",
            context! { state => None::<StateView>, listing => false },
        )
        .unwrap();
        assert!(html.0.contains("Not found!"));
    }

    #[test]
    fn test_states_with_cities_sorts_by_name() {
        let mut store = crate::storage::DbStorage::open_in_memory().unwrap();
        let texas = StateModel::new("Texas");
        let alaska = StateModel::new("Alaska");
        let houston = City::new("Houston", texas.id());
        let austin = City::new("Austin", texas.id());
        for record in [
            Record::from(texas),
            Record::from(alaska),
            Record::from(houston),
            Record::from(austin),
        ] {
            store.new(record).unwrap();
        }
        store.save().unwrap();

        let views = states_with_cities(&store).unwrap();
        let names: Vec<&str> = views.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Alaska", "Texas"]);

        let cities: Vec<&str> = views[1].cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(cities, vec!["Austin", "Houston"]);
    }

    #[test]
    fn test_spaced() {
        assert_eq!(spaced("is_fun"), "is fun");
        assert_eq!(spaced("cool"), "cool");
    }
}
