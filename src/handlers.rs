use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::fare::{FareEstimate, FareRequest, estimate_fare};
use crate::flows::local_assistant::get_local_assistant_response;
use crate::flows::room_matcher::find_pg_room_matches;
use crate::flows::vibe_checker::get_live_vibe;
use crate::flows::{
    AssistantAnswer, AssistantQuery, RoomMatchList, RoomSearchCriteria, VibeQuery, VibeReport,
};
use crate::models::HealthResponse;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::Json as ResponseJson;
use tracing::{debug, info};

/// Health check handler
/// Returns the service status and health information
pub async fn health_check() -> AppResult<ResponseJson<HealthResponse>> {
    debug!("Health check endpoint called");

    let response = HealthResponse::ok();

    info!("Health check successful");
    Ok(ResponseJson(response))
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Local assistant: free-text query in, recommendation and reason out
pub async fn local_assistant_handler(
    State(state): State<AppState>,
    payload: Result<Json<AssistantQuery>, JsonRejection>,
) -> AppResult<ResponseJson<AssistantAnswer>> {
    let query = parse_body(payload)?;
    info!("Local assistant called with query: {}", query.user_query);

    let answer = get_local_assistant_response(state.model.as_ref(), &query).await?;

    info!("Successfully answered local assistant query");
    Ok(ResponseJson(answer))
}

/// PG/room matcher: search criteria in, ranked matches out
pub async fn pg_matcher_handler(
    State(state): State<AppState>,
    payload: Result<Json<RoomSearchCriteria>, JsonRejection>,
) -> AppResult<ResponseJson<RoomMatchList>> {
    let criteria = parse_body(payload)?;
    info!(
        "PG matcher called for {} with budget {}",
        criteria.location, criteria.budget
    );

    let list = find_pg_room_matches(state.model.as_ref(), &criteria).await?;

    info!("Returning {} PG/room matches", list.matches.len());
    Ok(ResponseJson(list))
}

/// Vibe checker: place (and optional city) in, vibe snapshot out
pub async fn vibe_check_handler(
    State(state): State<AppState>,
    payload: Result<Json<VibeQuery>, JsonRejection>,
) -> AppResult<ResponseJson<VibeReport>> {
    let query = parse_body(payload)?;
    info!(
        "Vibe check called for {} (city: {})",
        query.place_name,
        query.city().unwrap_or("-")
    );

    let report = get_live_vibe(state.model.as_ref(), &query).await?;

    if let Some(level) = report.crowd_level {
        info!(
            "Vibe for {}: {} ({}% occupancy)",
            query.place_name,
            level,
            level.occupancy_percent()
        );
    }
    Ok(ResponseJson(report))
}

/// Fare estimator: transport mode and two locations in, fare out
pub async fn fare_estimate_handler(
    payload: Result<Json<FareRequest>, JsonRejection>,
) -> AppResult<ResponseJson<FareEstimate>> {
    let request = parse_body(payload)?;
    debug!("Fare estimate requested: {:?}", request);

    let estimate = estimate_fare(&request).map_err(AppError::ValidationError)?;

    info!(
        "Estimated {} km for {:?}: {}",
        estimate.distance_km, estimate.transport_type, estimate.estimated_fare
    );
    Ok(ResponseJson(estimate))
}
