use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::tables::{AccessQuery, AccessReport, CreateTableRequest, ReconcileReport, TableList},
    dto::bills::SettlePaymentRequest,
    error::AppResult,
    middleware::auth::Actor,
    models::{ActiveTableEntry, Bill, DiningTable},
    response::ApiResponse,
    services::{active_table_service, bill_service, guest_access, table_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_table).get(list_tables))
        .route("/active", get(list_active_entries))
        .route("/reconcile", post(reconcile))
        .route("/{id}", get(get_table).delete(delete_table))
        .route("/{id}/access", post(verify_access))
        .route("/{id}/settle", post(settle_payment))
}

#[utoipa::path(post, path = "/tables", request_body = CreateTableRequest, tag = "Tables")]
pub async fn create_table(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateTableRequest>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    Ok(Json(
        table_service::create_table(&state, &actor, payload).await?,
    ))
}

#[utoipa::path(get, path = "/tables", tag = "Tables")]
pub async fn list_tables(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<ApiResponse<TableList>>> {
    Ok(Json(table_service::list_tables(&state, &actor).await?))
}

#[utoipa::path(get, path = "/tables/{id}", tag = "Tables")]
pub async fn get_table(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    Ok(Json(table_service::get_table(&state, &actor, id).await?))
}

#[utoipa::path(delete, path = "/tables/{id}", tag = "Tables")]
pub async fn delete_table(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    Ok(Json(table_service::delete_table(&state, &actor, id).await?))
}

/// Guest-facing: no bearer token, a QR scan carries only the table id.
#[utoipa::path(post, path = "/tables/{id}/access", request_body = AccessQuery, tag = "Tables")]
pub async fn verify_access(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccessQuery>,
) -> AppResult<Json<ApiResponse<AccessReport>>> {
    Ok(Json(
        guest_access::verify(&state, id, &payload.guest_name).await?,
    ))
}

#[utoipa::path(post, path = "/tables/{id}/settle", request_body = SettlePaymentRequest, tag = "Tables")]
pub async fn settle_payment(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<SettlePaymentRequest>,
) -> AppResult<Json<ApiResponse<Bill>>> {
    Ok(Json(
        bill_service::settle_payment(&state, &actor, id, payload).await?,
    ))
}

#[utoipa::path(get, path = "/tables/active", tag = "Tables")]
pub async fn list_active_entries(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<ApiResponse<Vec<ActiveTableEntry>>>> {
    Ok(Json(
        active_table_service::list_entries(&state, &actor).await?,
    ))
}

#[utoipa::path(post, path = "/tables/reconcile", tag = "Tables")]
pub async fn reconcile(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<ApiResponse<ReconcileReport>>> {
    Ok(Json(active_table_service::reconcile(&state, &actor).await?))
}
