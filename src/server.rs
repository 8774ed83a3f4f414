use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::config::Config;
use crate::query::filters::{param, parse_i64, parse_limit, validate_search};
use crate::query::{
    CandidateLookup, CloseContestAnswer, EducationWinRateAnswer, FilterError, FilterOptions,
    GenderRepresentation, MarginRecord, PartySeatShare, QueryFilters, SeatChangeAnswer,
    StateTurnout, TurnoutAnswer, VoteShare, VoteShareTrendAnswer, WomenParticipationAnswer,
    DEFAULT_CLOSE_MARGIN_LIMIT, DEFAULT_SEARCH_LIMIT, DEFAULT_TOP_VOTE_SHARE_LIMIT,
};
use crate::store::ElectionStore;

#[derive(Debug, Clone)]
pub struct ApiState {
    pub db_path: PathBuf,
    pub search_min_chars: usize,
}

impl ApiState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            db_path: config.resolved_db_path(),
            search_min_chars: config.server.search_min_chars,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "No data available.".to_string(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(error: FilterError) -> Self {
        Self::bad_request(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            detail: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;
type Params = Query<Vec<(String, String)>>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/filters", get(filters))
        .route("/party-seat-share", get(party_seat_share))
        .route("/state-turnout", get(state_turnout))
        .route("/gender-representation", get(gender_representation))
        .route("/top-vote-share", get(top_vote_share))
        .route("/margin-distribution", get(margin_distribution))
        .route("/search", get(search))
        .route("/analytics/highest-turnout", get(highest_turnout))
        .route("/analytics/seat-change", get(seat_change))
        .route("/analytics/women-participation", get(women_participation))
        .route("/analytics/close-margins", get(close_margins))
        .route("/analytics/vote-share-trend", get(vote_share_trend))
        .route("/analytics/education-win-rate", get(education_win_rate))
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let state = ApiState::from_config(&config);
    info!("serving election store {}", state.db_path.display());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn filters(State(state): State<ApiState>) -> ApiResult<FilterOptions> {
    let store = open_store(&state)?;
    store.filter_options().map(Json).map_err(ApiError::internal)
}

async fn party_seat_share(
    State(state): State<ApiState>,
    Query(params): Params,
) -> ApiResult<Vec<PartySeatShare>> {
    let filters = QueryFilters::from_pairs(&params)?;
    let store = open_store(&state)?;
    store
        .party_seat_share(&filters)
        .map(Json)
        .map_err(ApiError::internal)
}

async fn state_turnout(
    State(state): State<ApiState>,
    Query(params): Params,
) -> ApiResult<Vec<StateTurnout>> {
    let filters = QueryFilters::from_pairs(&params)?;
    let store = open_store(&state)?;
    store
        .state_turnout(&filters)
        .map(Json)
        .map_err(ApiError::internal)
}

async fn gender_representation(
    State(state): State<ApiState>,
    Query(params): Params,
) -> ApiResult<Vec<GenderRepresentation>> {
    let year = param(&params, "year")
        .map(|raw| parse_i64("year", raw))
        .transpose()?;
    let store = open_store(&state)?;
    store
        .gender_representation(year)
        .map(Json)
        .map_err(ApiError::internal)
}

async fn top_vote_share(
    State(state): State<ApiState>,
    Query(params): Params,
) -> ApiResult<Vec<VoteShare>> {
    let year = param(&params, "year")
        .ok_or(FilterError::MissingRequired("year"))
        .and_then(|raw| parse_i64("year", raw))?;
    let limit = parse_limit(&params, DEFAULT_TOP_VOTE_SHARE_LIMIT)?;
    let store = open_store(&state)?;
    store
        .top_vote_share(year, limit)
        .map(Json)
        .map_err(ApiError::internal)
}

async fn margin_distribution(
    State(state): State<ApiState>,
    Query(params): Params,
) -> ApiResult<Vec<MarginRecord>> {
    let filters = QueryFilters::from_pairs(&params)?;
    let store = open_store(&state)?;
    store
        .margin_distribution(&filters)
        .map(Json)
        .map_err(ApiError::internal)
}

async fn search(
    State(state): State<ApiState>,
    Query(params): Params,
) -> ApiResult<Vec<CandidateLookup>> {
    let raw_query = params
        .iter()
        .rev()
        .find(|(key, _)| key == "query")
        .map(|(_, value)| value.as_str());
    let query = validate_search(raw_query, state.search_min_chars)?;
    let filters = QueryFilters::from_pairs(&params)?;
    let limit = parse_limit(&params, DEFAULT_SEARCH_LIMIT)?;
    let store = open_store(&state)?;
    store
        .search_candidates(&query, &filters, limit)
        .map(Json)
        .map_err(ApiError::internal)
}

async fn highest_turnout(State(state): State<ApiState>) -> ApiResult<TurnoutAnswer> {
    let store = open_store(&state)?;
    found(store.highest_turnout())
}

async fn seat_change(State(state): State<ApiState>) -> ApiResult<SeatChangeAnswer> {
    let store = open_store(&state)?;
    found(store.biggest_seat_change())
}

async fn women_participation(
    State(state): State<ApiState>,
) -> ApiResult<WomenParticipationAnswer> {
    let store = open_store(&state)?;
    found(store.women_participation())
}

async fn close_margins(
    State(state): State<ApiState>,
    Query(params): Params,
) -> ApiResult<Vec<CloseContestAnswer>> {
    let limit = parse_limit(&params, DEFAULT_CLOSE_MARGIN_LIMIT)?;
    let store = open_store(&state)?;
    store
        .closest_margins(limit)
        .map(Json)
        .map_err(ApiError::internal)
}

async fn vote_share_trend(State(state): State<ApiState>) -> ApiResult<Vec<VoteShareTrendAnswer>> {
    let store = open_store(&state)?;
    store
        .vote_share_trend()
        .map(Json)
        .map_err(ApiError::internal)
}

async fn education_win_rate(
    State(state): State<ApiState>,
) -> ApiResult<Vec<EducationWinRateAnswer>> {
    let store = open_store(&state)?;
    store
        .education_win_rate()
        .map(Json)
        .map_err(ApiError::internal)
}

fn open_store(state: &ApiState) -> std::result::Result<ElectionStore, ApiError> {
    debug!("opening {} for request", state.db_path.display());
    ElectionStore::open_read_only(&state.db_path).map_err(ApiError::internal)
}

fn found<T>(answer: Result<Option<T>>) -> ApiResult<T> {
    match answer {
        Ok(Some(value)) => Ok(Json(value)),
        Ok(None) => Err(ApiError::not_found()),
        Err(error) => Err(ApiError::internal(error)),
    }
}
