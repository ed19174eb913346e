use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, PlaceOrderRequest, PlacedOrder, UpdateOrderStatusRequest},
    error::AppResult,
    middleware::auth::Actor,
    models::TableOrder,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(place_order).get(list_orders))
        .route("/session/{session_id}", get(list_by_session))
        .route("/{id}/status", patch(update_status))
}

/// Guest-facing: authenticated by nothing more than knowing the table.
/// Access control happens against the table's open bill inside the service.
#[utoipa::path(post, path = "/orders", request_body = PlaceOrderRequest, tag = "Orders")]
pub async fn place_order(
    State(state): State<AppState>,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<PlacedOrder>>> {
    Ok(Json(order_service::place_order(&state, payload).await?))
}

#[utoipa::path(get, path = "/orders", tag = "Orders")]
pub async fn list_orders(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(
        order_service::list_orders(&state, &actor, query).await?,
    ))
}

#[utoipa::path(get, path = "/orders/session/{session_id}", tag = "Orders")]
pub async fn list_by_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(
        order_service::list_by_session(&state, &session_id).await?,
    ))
}

#[utoipa::path(patch, path = "/orders/{id}/status", request_body = UpdateOrderStatusRequest, tag = "Orders")]
pub async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<TableOrder>>> {
    Ok(Json(
        order_service::advance_status(&state, &actor, id, payload).await?,
    ))
}
