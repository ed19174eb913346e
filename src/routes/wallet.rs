use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};

use crate::{
    dto::wallet::{
        RechargeRequest, SufficiencyReport, TransactionList, UpdateChargesRequest, WalletDetails,
    },
    error::AppResult,
    middleware::auth::Actor,
    models::ChargeKind,
    response::ApiResponse,
    routes::params::Pagination,
    services::wallet_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_wallet))
        .route("/recharge", post(recharge))
        .route("/charges", put(update_charges))
        .route("/transactions", get(list_transactions))
        .route("/sufficiency/{kind}", get(check_sufficiency))
}

#[utoipa::path(get, path = "/wallet", tag = "Wallet")]
pub async fn get_wallet(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<ApiResponse<WalletDetails>>> {
    Ok(Json(wallet_service::get_wallet(&state, &actor).await?))
}

#[utoipa::path(post, path = "/wallet/recharge", request_body = RechargeRequest, tag = "Wallet")]
pub async fn recharge(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<RechargeRequest>,
) -> AppResult<Json<ApiResponse<WalletDetails>>> {
    Ok(Json(wallet_service::credit(&state, &actor, payload).await?))
}

#[utoipa::path(put, path = "/wallet/charges", request_body = UpdateChargesRequest, tag = "Wallet")]
pub async fn update_charges(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<UpdateChargesRequest>,
) -> AppResult<Json<ApiResponse<WalletDetails>>> {
    Ok(Json(
        wallet_service::update_charges(&state, &actor, payload).await?,
    ))
}

#[utoipa::path(get, path = "/wallet/transactions", tag = "Wallet")]
pub async fn list_transactions(
    State(state): State<AppState>,
    actor: Actor,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<TransactionList>>> {
    Ok(Json(
        wallet_service::list_transactions(&state, &actor, pagination).await?,
    ))
}

#[utoipa::path(get, path = "/wallet/sufficiency/{kind}", tag = "Wallet")]
pub async fn check_sufficiency(
    State(state): State<AppState>,
    actor: Actor,
    Path(kind): Path<ChargeKind>,
) -> AppResult<Json<ApiResponse<SufficiencyReport>>> {
    Ok(Json(
        wallet_service::check_sufficiency(&state, &actor, kind).await?,
    ))
}
