use axum::{
    extract::{Json, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{
    BotLogRequest, BotsOnlineRequest, FundingUpdateRequest, WithdrawRequest,
};
use super::{ApiError, ApiServer};
use crate::gateway::CacheEntry;

#[derive(Clone)]
struct AppState {
    api_server: Arc<ApiServer>,
}

pub fn build_router(api_server: Arc<ApiServer>) -> Router {
    let state = AppState { api_server };

    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Pinned content, via the gateway fetch cache
        .route("/ipfs", get(ipfs_default_handler))
        .route("/ipfs/:cid", get(ipfs_handler))
        // Bot registry and activity
        .route("/bot/log", post(bot_log_handler))
        .route("/bot/balance/:wallet", get(balance_handler))
        .route("/bot/:cid", get(bot_handler))
        // Withdrawal fee quoting
        .route("/withdraw", post(withdraw_handler))
        // Funding/status dashboard state
        .route("/status", get(status_handler))
        .route("/status/funding", post(funding_handler))
        .route("/status/bots", post(bots_online_handler))
        .fallback(not_found_handler)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(api_server: ApiServer) -> Result<(), Box<dyn std::error::Error>> {
    let port = api_server.config().port;
    let app = build_router(Arc::new(api_server));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::response::Json(state.api_server.health().await)
}

async fn ipfs_handler(State(state): State<AppState>, Path(cid): Path<String>) -> Response {
    match state.api_server.fetch_content(Some(&cid)).await {
        Ok(entry) => content_response(&entry),
        Err(e) => ApiErrorResponse(e).into_response(),
    }
}

async fn ipfs_default_handler(State(state): State<AppState>) -> Response {
    match state.api_server.fetch_content(None).await {
        Ok(entry) => content_response(&entry),
        Err(e) => ApiErrorResponse(e).into_response(),
    }
}

fn content_response(entry: &CacheEntry) -> Response {
    (
        [(header::CONTENT_TYPE, entry.content_type.clone())],
        entry.payload.clone(),
    )
        .into_response()
}

async fn bot_handler(State(state): State<AppState>, Path(cid): Path<String>) -> Response {
    match state.api_server.bot(&cid).await {
        Ok(params) => axum::response::Json(params).into_response(),
        Err(e) => ApiErrorResponse(e).into_response(),
    }
}

async fn bot_log_handler(
    State(state): State<AppState>,
    Json(request): Json<BotLogRequest>,
) -> Response {
    match state.api_server.log_activation(request).await {
        Ok(response) => axum::response::Json(response).into_response(),
        Err(e) => ApiErrorResponse(e).into_response(),
    }
}

async fn balance_handler(State(state): State<AppState>, Path(wallet): Path<String>) -> Response {
    match state.api_server.balance(&wallet).await {
        Ok(response) => axum::response::Json(response).into_response(),
        Err(e) => ApiErrorResponse(e).into_response(),
    }
}

async fn withdraw_handler(
    State(state): State<AppState>,
    Json(request): Json<WithdrawRequest>,
) -> Response {
    match state.api_server.withdraw(request).await {
        Ok(response) => axum::response::Json(response).into_response(),
        Err(e) => ApiErrorResponse(e).into_response(),
    }
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::response::Json(state.api_server.status().await)
}

async fn funding_handler(
    State(state): State<AppState>,
    Json(request): Json<FundingUpdateRequest>,
) -> Response {
    match state.api_server.update_funding(request).await {
        Ok(response) => axum::response::Json(response).into_response(),
        Err(e) => ApiErrorResponse(e).into_response(),
    }
}

async fn bots_online_handler(
    State(state): State<AppState>,
    Json(request): Json<BotsOnlineRequest>,
) -> Response {
    match state.api_server.update_bots_online(request).await {
        Ok(response) => axum::response::Json(response).into_response(),
        Err(e) => ApiErrorResponse(e).into_response(),
    }
}

async fn not_found_handler() -> Response {
    ApiErrorResponse(ApiError::NotFound("Endpoint not found".to_string())).into_response()
}

// Error response wrapper
struct ApiErrorResponse(ApiError);

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let error_response = self.0.to_response();

        (status, axum::response::Json(error_response)).into_response()
    }
}
