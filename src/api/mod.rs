use crate::models::{Neighbor, RecommendationRequest, RecommendationResponse, SeenItem, UserId};
use crate::utils::validation::InvalidRequest;
use crate::{AppState, RecError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    num_neighbors: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct NeighborQuery {
    n: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

/// Unknown users map to 404, rejected requests to 400, anything else to 500.
pub fn error_response<T>(e: anyhow::Error) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = if e.downcast_ref::<InvalidRequest>().is_some() {
        StatusCode::BAD_REQUEST
    } else {
        match e.downcast_ref::<RecError>() {
            Some(RecError::UnknownUser(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Request failed: {:#}", e);
    }
    (status, Json(ApiResponse::error(e.to_string())))
}

async fn health_check() -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "neighborec".to_string());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());

    Json(ApiResponse::success(status))
}

async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserId>> {
    match state.recommendation_service.scoped_users().await {
        Ok(users) => Ok(Json(ApiResponse::success(users))),
        Err(e) => Err(error_response(e)),
    }
}

async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<RecommendationQuery>,
) -> ApiResult<RecommendationResponse> {
    let request = RecommendationRequest {
        user_id,
        num_neighbors: params
            .num_neighbors
            .unwrap_or_else(|| state.recommendation_service.default_neighbors()),
    };

    match state.recommendation_service.get_recommendations(&request).await {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(e) => Err(error_response(e)),
    }
}

async fn get_neighbors(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<NeighborQuery>,
) -> ApiResult<Vec<Neighbor>> {
    let n = params
        .n
        .unwrap_or_else(|| state.recommendation_service.default_neighbors());

    match state.recommendation_service.nearest_neighbors(user_id, n).await {
        Ok(neighbors) => Ok(Json(ApiResponse::success(neighbors))),
        Err(e) => Err(error_response(e)),
    }
}

async fn get_seen_items(State(state): State<AppState>, Path(user_id): Path<UserId>) -> ApiResult<Vec<SeenItem>> {
    match state.recommendation_service.seen_items(user_id).await {
        Ok(seen) => Ok(Json(ApiResponse::success(seen))),
        Err(e) => Err(error_response(e)),
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", get(list_users))
        .route("/users/:user_id/seen", get(get_seen_items))
        .route("/users/:user_id/neighbors", get(get_neighbors))
        .route("/recommendations/:user_id", get(get_recommendations))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
