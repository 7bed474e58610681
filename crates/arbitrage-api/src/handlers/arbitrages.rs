//! Arbitrage CRUD handlers.
//!
//! - `GET /api/arbitrages` - all records
//! - `GET /api/arbitrages/{key}` - by id when `key` is an ObjectId, else by sport
//! - `GET /api/arbitrages/sport/{sport}` - by sport
//! - `POST /api/arbitrages` - create
//! - `PUT /api/arbitrages/{id}` - partial update
//! - `DELETE /api/arbitrages/{id}` - delete
//!
//! All routes sit behind `require_auth`; handlers can rely on `Claims` in
//! request extensions.

use crate::auth::Claims;
use crate::errors::ApiError;
use crate::models::{ApiResponse, ArbitrageRecord, ArbitrageUpdate, NewArbitrage};
use crate::routes::AppState;
use crate::services::{parse_object_id, CreateOutcome};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

const INVALID_BODY_MESSAGE: &str =
    "Invalid data, a JSON body with the arbitrage fields is required";

const NOT_FOUND_MESSAGE: &str = "arbitrage not found";

/// Unwrap a JSON body, turning every extractor rejection into a 400.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(
            target: "arb.handlers.arbitrages",
            reason = %rejection.body_text(),
            "Rejected request body"
        );
        ApiError::BadRequest(INVALID_BODY_MESSAGE.to_string())
    })
}

/// Handler for GET /api/arbitrages
#[instrument(skip_all, name = "arb.arbitrages.list")]
pub async fn list_arbitrages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ArbitrageRecord>>>, ApiError> {
    let records = state
        .gateway
        .list_all()
        .await
        .map_err(ApiError::store("failed to retrieve all arbitrages"))?;

    Ok(Json(ApiResponse::success(
        "successfully retrieved all arbitrages",
        records,
    )))
}

/// Handler for GET /api/arbitrages/{key}
///
/// A 24-hex-digit key is looked up as an identifier (200/404). Any other key
/// is treated as a sport name (200/204).
#[instrument(skip_all, name = "arb.arbitrages.get", fields(key = %key))]
pub async fn get_arbitrage(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    if parse_object_id(&key).is_some() {
        arbitrage_by_id(&state, &key).await
    } else {
        arbitrages_by_sport(&state, &key).await
    }
}

/// Handler for GET /api/arbitrages/sport/{sport}
#[instrument(skip_all, name = "arb.arbitrages.by_sport", fields(sport = %sport))]
pub async fn get_arbitrages_by_sport(
    State(state): State<Arc<AppState>>,
    Path(sport): Path<String>,
) -> Result<Response, ApiError> {
    arbitrages_by_sport(&state, &sport).await
}

async fn arbitrage_by_id(state: &AppState, id: &str) -> Result<Response, ApiError> {
    let record = state
        .gateway
        .get_by_id(id)
        .await
        .map_err(ApiError::store("failed to retrieve arbitrage"))?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;

    Ok(Json(ApiResponse::success("successfully retrieved arbitrage", record)).into_response())
}

async fn arbitrages_by_sport(state: &AppState, sport: &str) -> Result<Response, ApiError> {
    let records = state
        .gateway
        .get_by_sport(sport)
        .await
        .map_err(ApiError::store("failed to retrieve arbitrages"))?;

    if records.is_empty() {
        // 204 carries no body
        tracing::debug!(target: "arb.handlers.arbitrages", sport = %sport, "no arbitrages found");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(Json(ApiResponse::success("successfully retrieved arbitrages", records)).into_response())
}

/// Handler for POST /api/arbitrages
///
/// - 201 Created: record stored, returned with its identifier
/// - 400 Bad Request: missing, malformed or incomplete body
/// - 409 Conflict: same home team, away team and time already stored
#[instrument(skip_all, name = "arb.arbitrages.create")]
pub async fn create_arbitrage(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<NewArbitrage>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ArbitrageRecord>>), ApiError> {
    let new = json_body(payload)?;

    let outcome = state
        .gateway
        .create(new)
        .await
        .map_err(ApiError::store("failed to create arbitrage"))?;

    match outcome {
        CreateOutcome::Created(record) => {
            tracing::info!(
                target: "arb.handlers.arbitrages",
                id = %record.id,
                azp = ?claims.azp,
                "Arbitrage created"
            );
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::success("Arbitrage created successfully", record)),
            ))
        }
        CreateOutcome::Duplicate => Err(ApiError::Conflict("Arbitrage already exists".to_string())),
    }
}

/// Handler for PUT /api/arbitrages/{id}
///
/// Only `away_team`, `away_stake`, `home_team`, `home_stake` and `roi` are
/// updatable; empty values are ignored. A body that supplies none of them
/// is a 400.
#[instrument(skip_all, name = "arb.arbitrages.update", fields(id = %id))]
pub async fn update_arbitrage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<ArbitrageUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<ArbitrageRecord>>, ApiError> {
    let changes = json_body(payload)?;
    if changes.is_empty() {
        return Err(ApiError::BadRequest(INVALID_BODY_MESSAGE.to_string()));
    }

    let record = state
        .gateway
        .update(&id, changes)
        .await
        .map_err(ApiError::store("failed to update arbitrage"))?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;

    tracing::info!(target: "arb.handlers.arbitrages", azp = ?claims.azp, "Arbitrage updated");

    Ok(Json(ApiResponse::success(
        "arbitrage updated successfully",
        record,
    )))
}

/// Handler for DELETE /api/arbitrages/{id}
///
/// Existence is checked first so that a missing record is a 404.
#[instrument(skip_all, name = "arb.arbitrages.delete", fields(id = %id))]
pub async fn delete_arbitrage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let existing = state
        .gateway
        .get_by_id(&id)
        .await
        .map_err(ApiError::store("failed to delete arbitrage"))?;
    if existing.is_none() {
        return Err(ApiError::NotFound(NOT_FOUND_MESSAGE.to_string()));
    }

    state
        .gateway
        .delete(&id)
        .await
        .map_err(ApiError::store("failed to delete arbitrage"))?;

    tracing::info!(target: "arb.handlers.arbitrages", azp = ?claims.azp, "Arbitrage deleted");

    Ok(Json(ApiResponse::empty("arbitrage deleted successfully")))
}
