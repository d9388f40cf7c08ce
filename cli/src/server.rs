use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use larder_core::app::{Action, AppState};
use larder_core::catalog::{Catalog, LoadFailure};
use larder_core::filter::filter_foods;
use larder_core::import::run_import;
use larder_core::models::{Food, FoodCategory, ImportReport};
use larder_core::notifications::{Notification, TICK_INTERVAL};
use larder_core::nutrients::{DailySummary, current_hour};
use larder_core::store::CatalogStore;

const BODY_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

#[derive(Clone)]
struct ServerState {
    store: Arc<dyn CatalogStore>,
    app: Arc<Mutex<AppState>>,
    api_key: Option<String>,
}

impl ServerState {
    fn app(&self) -> MutexGuard<'_, AppState> {
        self.app.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the catalog from the store and swap it in. The lock is only
    /// taken after the store calls complete.
    async fn reload(&self) -> CatalogStatus {
        let catalog = Catalog::load(self.store.as_ref()).await;
        let status = CatalogStatus::of(&catalog);
        self.app().apply(Action::ReplaceCatalog(catalog)).ok();
        status
    }
}

// --- Request / Response types ---

#[derive(Serialize)]
struct CatalogStatus {
    categories: usize,
    foods: usize,
    degraded: bool,
    failures: Vec<LoadFailure>,
}

impl CatalogStatus {
    fn of(catalog: &Catalog) -> Self {
        Self {
            categories: catalog.categories.len(),
            foods: catalog.foods.len(),
            degraded: catalog.is_degraded(),
            failures: catalog.failures.clone(),
        }
    }
}

#[derive(Deserialize)]
struct FoodsQuery {
    category: Option<String>,
    q: Option<String>,
}

#[derive(Deserialize, Serialize)]
struct FilterState {
    category: Option<String>,
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
struct FoodDetail {
    #[serde(flatten)]
    food: Food,
    category_name: Option<String>,
}

#[derive(Deserialize)]
struct AddFoodRequest {
    food_id: String,
}

#[derive(Serialize)]
struct SelectionResponse {
    count: usize,
    entries: Vec<Food>,
}

#[derive(Serialize)]
struct RemoveResponse {
    removed: bool,
    count: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn get_catalog(State(state): State<ServerState>) -> Json<CatalogStatus> {
    Json(CatalogStatus::of(state.app().catalog()))
}

async fn reload_catalog(State(state): State<ServerState>) -> Json<CatalogStatus> {
    Json(state.reload().await)
}

async fn list_categories(State(state): State<ServerState>) -> Json<Vec<FoodCategory>> {
    Json(state.app().catalog().categories.clone())
}

/// Query parameters filter statelessly; without them the session filter
/// applies.
async fn list_foods(
    State(state): State<ServerState>,
    Query(query): Query<FoodsQuery>,
) -> Json<Vec<Food>> {
    let app = state.app();
    let foods = if query.category.is_some() || query.q.is_some() {
        filter_foods(
            &app.catalog().foods,
            query.category.as_deref(),
            query.q.as_deref().unwrap_or_default(),
        )
    } else {
        app.visible_foods()
    };
    Json(foods.into_iter().cloned().collect())
}

async fn get_food(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<FoodDetail>, ApiError> {
    let app = state.app();
    let catalog = app.catalog();
    let food = catalog
        .food(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Food {id} not found")))?;
    Ok(Json(FoodDetail {
        category_name: catalog.category_name(food).map(str::to_string),
        food: food.clone(),
    }))
}

async fn get_filter(State(state): State<ServerState>) -> Json<FilterState> {
    let app = state.app();
    Json(FilterState {
        category: app.selected_category().map(str::to_string),
        q: app.search_query().to_string(),
    })
}

async fn set_filter(
    State(state): State<ServerState>,
    Json(req): Json<FilterState>,
) -> Result<Json<FilterState>, ApiError> {
    let mut app = state.app();
    app.apply(Action::SelectCategory(req.category))?;
    app.apply(Action::Search(req.q))?;
    Ok(Json(FilterState {
        category: app.selected_category().map(str::to_string),
        q: app.search_query().to_string(),
    }))
}

async fn get_selection(State(state): State<ServerState>) -> Json<SelectionResponse> {
    let app = state.app();
    Json(SelectionResponse {
        count: app.selection().len(),
        entries: app.selection().entries().to_vec(),
    })
}

async fn add_to_selection(
    State(state): State<ServerState>,
    Json(req): Json<AddFoodRequest>,
) -> Result<(StatusCode, Json<SelectionResponse>), ApiError> {
    if req.food_id.trim().is_empty() {
        return Err(ApiError::BadRequest("food_id must not be empty".to_string()));
    }
    let mut app = state.app();
    if app.catalog().food(&req.food_id).is_none() {
        return Err(ApiError::NotFound(format!("Food {} not found", req.food_id)));
    }
    app.apply(Action::AddFood(req.food_id))?;
    Ok((
        StatusCode::CREATED,
        Json(SelectionResponse {
            count: app.selection().len(),
            entries: app.selection().entries().to_vec(),
        }),
    ))
}

async fn remove_from_selection(
    State(state): State<ServerState>,
    Path(food_id): Path<String>,
) -> Result<Json<RemoveResponse>, ApiError> {
    let mut app = state.app();
    let before = app.selection().len();
    app.apply(Action::RemoveFood(food_id))?;
    let count = app.selection().len();
    Ok(Json(RemoveResponse {
        removed: count < before,
        count,
    }))
}

async fn clear_selection(State(state): State<ServerState>) -> Result<StatusCode, ApiError> {
    state.app().apply(Action::ClearSelection)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_summary(State(state): State<ServerState>) -> Json<DailySummary> {
    Json(state.app().summary(current_hour()))
}

async fn list_notifications(State(state): State<ServerState>) -> Json<Vec<Notification>> {
    Json(state.app().notifications().cloned().collect())
}

/// Import a raw JSON payload. The report always comes back with 200; a
/// successful import also reloads the catalog.
async fn import_catalog(State(state): State<ServerState>, body: String) -> Json<ImportReport> {
    if body.trim().is_empty() {
        return Json(ImportReport::failed("Please select a JSON file"));
    }
    let report = run_import(state.store.as_ref(), &body).await;
    if report.success {
        state.reload().await;
    }
    Json(report)
}

fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/api/catalog", get(get_catalog))
        .route("/api/reload", post(reload_catalog))
        .route("/api/categories", get(list_categories))
        .route("/api/foods", get(list_foods))
        .route("/api/foods/{id}", get(get_food))
        .route("/api/filter", get(get_filter).put(set_filter))
        .route(
            "/api/selection",
            get(get_selection)
                .post(add_to_selection)
                .delete(clear_selection),
        )
        .route("/api/selection/{food_id}", delete(remove_from_selection))
        .route("/api/summary", get(get_summary))
        .route("/api/notifications", get(list_notifications))
        .route("/api/import", post(import_catalog))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Drive notification decay for the life of the server.
fn spawn_ticker(app: Arc<Mutex<AppState>>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            let mut app = app.lock().unwrap_or_else(PoisonError::into_inner);
            app.apply(Action::Tick).ok();
        }
    });
}

// --- Server startup ---

/// First and last four characters of `key`, or `****` when the key is too
/// short to abbreviate.
fn key_preview(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub async fn start_server(
    store: Arc<dyn CatalogStore>,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let catalog = Catalog::load(store.as_ref()).await;

    let state = ServerState {
        store,
        app: Arc::new(Mutex::new(AppState::new(catalog))),
        api_key: api_key.clone(),
    };
    spawn_ticker(Arc::clone(&state.app));

    let app = build_router(state);

    if let Some(ref key) = api_key {
        eprintln!(
            "API key: {} (see api_key file in data directory)",
            key_preview(key)
        );
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    info!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
