// Weigh-In - Web Server
// REST API over the contestant registry with Axum

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use weigh_in::{
    dispatch, Command, Config, ContestantRegistry, JsonFileStore, RankedContestant, RegistryError,
    RegistryResult, Response, NO_CONTESTANTS,
};

const ENV_ADDR: &str = "WEIGH_IN_ADDR";
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Shared application state
///
/// One registry behind a mutex: requests run one at a time.
#[derive(Clone)]
struct AppState {
    registry: Arc<Mutex<ContestantRegistry<JsonFileStore>>>,
}

/// Weights may arrive as JSON numbers or as form strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WeightInput {
    Number(f64),
    Text(String),
}

impl WeightInput {
    fn into_text(self) -> String {
        match self {
            WeightInput::Number(n) => n.to_string(),
            WeightInput::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddRequest {
    #[serde(default)]
    name: String,
    weight: Option<WeightInput>,
    #[serde(default)]
    dob: String,
}

#[derive(Debug, Deserialize)]
struct WeightRequest {
    weight: Option<WeightInput>,
}

#[derive(Debug, Default, Deserialize)]
struct EditRequest {
    dob: Option<String>,
    starting_weight: Option<WeightInput>,
    current_weight: Option<WeightInput>,
}

/// Structured leaderboard
#[derive(Serialize)]
struct RankingsResponse {
    count: usize,
    rankings: Vec<RankedContestant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

fn status_for(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::DuplicateName(_) => StatusCode::CONFLICT,
        RegistryError::InvalidDate(_)
        | RegistryError::InvalidNumber { .. }
        | RegistryError::InvalidName
        | RegistryError::MissingInput(_) => StatusCode::BAD_REQUEST,
        RegistryError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run a closure against the registry on the blocking pool
async fn with_registry<T, F>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    T: Send + 'static,
    F: FnOnce(&ContestantRegistry<JsonFileStore>) -> T + Send + 'static,
{
    let registry = Arc::clone(&state.registry);
    tokio::task::spawn_blocking(move || {
        let guard = match registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&guard)
    })
    .await
    .map_err(|e| {
        error!("registry task failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

async fn run(state: &AppState, command: Command, success: StatusCode) -> axum::response::Response {
    let result: Result<RegistryResult<Response>, StatusCode> =
        with_registry(state, move |registry| dispatch(registry, command)).await;

    match result {
        Ok(Ok(response)) => (success, Json(response)).into_response(),
        Ok(Err(err)) => (status_for(&err), Json(Response::from(err))).into_response(),
        Err(status) => (
            status,
            Json(Response::Error {
                error: "Internal server error".to_string(),
            }),
        )
            .into_response(),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(Response::ok())
}

/// GET /api/contestants - Names in registration order
async fn list_contestants(State(state): State<AppState>) -> impl IntoResponse {
    run(&state, Command::List, StatusCode::OK).await
}

/// POST /api/contestants - Register a contestant
async fn add_contestant(
    State(state): State<AppState>,
    Json(req): Json<AddRequest>,
) -> impl IntoResponse {
    let command = Command::Add {
        name: req.name,
        weight: req.weight.map(WeightInput::into_text).unwrap_or_default(),
        dob: req.dob,
    };
    run(&state, command, StatusCode::CREATED).await
}

/// GET /api/contestants/:name - Contestant info
async fn contestant_info(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    run(&state, Command::Info { name }, StatusCode::OK).await
}

/// PATCH /api/contestants/:name - Edit date of birth and/or weights
async fn edit_contestant(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<EditRequest>,
) -> impl IntoResponse {
    let command = Command::Edit {
        name,
        dob: req.dob,
        starting_weight: req.starting_weight.map(WeightInput::into_text),
        current_weight: req.current_weight.map(WeightInput::into_text),
    };
    run(&state, command, StatusCode::OK).await
}

/// PUT /api/contestants/:name/weight - Record current weight
async fn update_weight(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<WeightRequest>,
) -> impl IntoResponse {
    let command = Command::Update {
        name,
        weight: req.weight.map(WeightInput::into_text).unwrap_or_default(),
    };
    run(&state, command, StatusCode::OK).await
}

/// DELETE /api/contestants/:name
async fn delete_contestant(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    run(&state, Command::Delete { name }, StatusCode::OK).await
}

/// GET /api/rankings - Structured leaderboard
async fn get_rankings(State(state): State<AppState>) -> impl IntoResponse {
    match with_registry(&state, |registry| registry.rankings()).await {
        Ok(board) => {
            let message = board.is_empty().then_some(NO_CONTESTANTS);
            let rankings = board.entries().to_vec();
            (
                StatusCode::OK,
                Json(RankingsResponse {
                    count: rankings.len(),
                    rankings,
                    message,
                }),
            )
                .into_response()
        }
        Err(status) => status.into_response(),
    }
}

/// GET /api/rankings/text - Leaderboard as the text report
async fn get_rankings_text(State(state): State<AppState>) -> impl IntoResponse {
    run(&state, Command::Rankings, StatusCode::OK).await
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/contestants", get(list_contestants).post(add_contestant))
        .route(
            "/contestants/:name",
            get(contestant_info)
                .patch(edit_contestant)
                .delete(delete_contestant),
        )
        .route("/contestants/:name/weight", put(update_weight))
        .route("/rankings", get(get_rankings))
        .route("/rankings/text", get(get_rankings_text))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let registry = config.open_registry();
    info!(
        data_file = %config.data_file.display(),
        calculator = registry.calculations().preferred_name(),
        "registry opened"
    );

    let state = AppState {
        registry: Arc::new(Mutex::new(registry)),
    };

    let addr = std::env::var(ENV_ADDR).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    info!("server running on http://{}/api/rankings", addr);

    axum::serve(listener, router(state))
        .await
        .context("server failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(dir: &tempfile::TempDir) -> Router {
        let registry = ContestantRegistry::new(JsonFileStore::new(dir.path().join("c.json")));
        router(AppState {
            registry: Arc::new(Mutex::new(registry)),
        })
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_add_update_rank_flow() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/contestants",
            Some(json!({"name": "Alice", "weight": 200.0, "dob": "1990-01-01"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"status": "ok"}));

        let (status, _) = call(
            &app,
            Method::PUT,
            "/api/contestants/Alice/weight",
            Some(json!({"weight": "180"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&app, Method::GET, "/api/rankings", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["rankings"][0]["name"], "Alice");
        assert_eq!(body["rankings"][0]["percentage_lost"], 10.0);
    }

    #[tokio::test]
    async fn test_error_status_codes() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        let (status, body) = call(&app, Method::GET, "/api/contestants/Ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Contestant not found"}));

        let add = json!({"name": "Bob", "weight": 180, "dob": "1985-05-05"});
        call(&app, Method::POST, "/api/contestants", Some(add.clone())).await;
        let (status, _) = call(&app, Method::POST, "/api/contestants", Some(add)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(
            &app,
            Method::PATCH,
            "/api/contestants/Bob",
            Some(json!({"dob": "3000-01-01"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_rankings_message() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        let (_, body) = call(&app, Method::GET, "/api/rankings", None).await;
        assert_eq!(body["count"], 0);
        assert_eq!(body["message"], "No contestants found");
    }
}
