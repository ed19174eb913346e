use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::bills::{BillList, SettlePaymentRequest},
    error::AppResult,
    middleware::auth::Actor,
    models::Bill,
    response::ApiResponse,
    routes::params::BillListQuery,
    services::bill_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bills))
        .route("/{id}", get(get_bill))
        .route("/{id}/settle", post(complete_bill))
}

#[utoipa::path(get, path = "/bills", tag = "Bills")]
pub async fn list_bills(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<BillListQuery>,
) -> AppResult<Json<ApiResponse<BillList>>> {
    Ok(Json(bill_service::list_bills(&state, &actor, query).await?))
}

#[utoipa::path(get, path = "/bills/{id}", tag = "Bills")]
pub async fn get_bill(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Bill>>> {
    Ok(Json(bill_service::get_bill(&state, &actor, id).await?))
}

#[utoipa::path(post, path = "/bills/{id}/settle", request_body = SettlePaymentRequest, tag = "Bills")]
pub async fn complete_bill(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<SettlePaymentRequest>,
) -> AppResult<Json<ApiResponse<Bill>>> {
    Ok(Json(
        bill_service::complete_bill(&state, &actor, id, payload).await?,
    ))
}
