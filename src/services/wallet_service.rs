use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    activity::log_activity,
    dto::wallet::{
        RechargeRequest, SufficiencyReport, TransactionList, UpdateChargesRequest, WalletDetails,
    },
    entity::{
        HotelWallets, WalletTransactions,
        hotel_wallets::{ActiveModel as WalletActive, Column as WalletCol, Model as WalletModel},
        wallet_transactions::{ActiveModel as TxnActive, Column as TxnCol},
    },
    error::{AppError, AppResult},
    middleware::auth::{Actor, ensure_admin},
    models::{ChargeKind, Wallet, WalletTransaction},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Result of a metered debit. Zero configured charges make the operation
/// free: no balance change and no ledger row.
#[derive(Debug, Clone, PartialEq)]
pub enum DebitOutcome {
    NoCharge,
    Debited { amount: Decimal, balance_after: Decimal },
}

/// Fetch the hotel's wallet, creating a zero-balance one on first touch so
/// callers never have to special-case missing wallets.
pub async fn get_or_create<C: ConnectionTrait>(
    conn: &C,
    hotel_id: Uuid,
) -> AppResult<WalletModel> {
    if let Some(wallet) = HotelWallets::find()
        .filter(WalletCol::HotelId.eq(hotel_id))
        .one(conn)
        .await?
    {
        return Ok(wallet);
    }

    let wallet = WalletActive {
        id: Set(Uuid::new_v4()),
        hotel_id: Set(hotel_id),
        balance: Set(Decimal::ZERO),
        per_verification_charge: Set(Decimal::ZERO),
        per_order_charge: Set(Decimal::ZERO),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;

    Ok(wallet)
}

/// Charge the hotel for one metered operation. Check-and-decrement runs
/// against a locked wallet row, so concurrent debits cannot both pass the
/// balance check. Callers run this inside the transaction that commits the
/// operation being charged for; `InsufficientBalance` aborts both together.
pub async fn debit<C: ConnectionTrait>(
    conn: &C,
    hotel_id: Uuid,
    kind: ChargeKind,
    reference_id: Option<Uuid>,
) -> AppResult<DebitOutcome> {
    get_or_create(conn, hotel_id).await?;

    let wallet = HotelWallets::find()
        .filter(WalletCol::HotelId.eq(hotel_id))
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    let charge = match kind {
        ChargeKind::Verification => wallet.per_verification_charge,
        ChargeKind::Order => wallet.per_order_charge,
    }
    .round_dp(2);

    if charge <= Decimal::ZERO {
        return Ok(DebitOutcome::NoCharge);
    }

    if wallet.balance < charge {
        return Err(AppError::InsufficientBalance {
            required: charge,
            balance: wallet.balance,
            shortfall: (charge - wallet.balance).round_dp(2),
        });
    }

    let balance_after = (wallet.balance - charge).round_dp(2);
    let wallet_hotel_id = wallet.hotel_id;

    let mut active: WalletActive = wallet.into();
    active.balance = Set(balance_after);
    active.updated_at = Set(Utc::now().into());
    active.update(conn).await?;

    TxnActive {
        id: Set(Uuid::new_v4()),
        hotel_id: Set(wallet_hotel_id),
        direction: Set("DEBIT".into()),
        amount: Set(charge),
        balance_after: Set(balance_after),
        description: Set(Some(format!(
            "{} charge",
            kind.reference_kind().to_lowercase()
        ))),
        reference_kind: Set(kind.reference_kind().into()),
        reference_id: Set(reference_id),
        actor_kind: Set("SYSTEM".into()),
        actor_id: Set(None),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;

    Ok(DebitOutcome::Debited {
        amount: charge,
        balance_after,
    })
}

/// Top up a hotel wallet. Managers recharge their own hotel; admins must
/// name one.
pub async fn credit(
    state: &AppState,
    actor: &Actor,
    payload: RechargeRequest,
) -> AppResult<ApiResponse<WalletDetails>> {
    let hotel_id = match payload.hotel_id {
        Some(id) => {
            actor.ensure_hotel(id)?;
            id
        }
        None => actor.hotel_id()?,
    };

    let amount = payload.amount.round_dp(2);
    if amount <= Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Recharge amount must be positive".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    get_or_create(&txn, hotel_id).await?;
    let wallet = HotelWallets::find()
        .filter(WalletCol::HotelId.eq(hotel_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let balance_after = (wallet.balance + amount).round_dp(2);

    let mut active: WalletActive = wallet.into();
    active.balance = Set(balance_after);
    active.updated_at = Set(Utc::now().into());
    let wallet = active.update(&txn).await?;

    TxnActive {
        id: Set(Uuid::new_v4()),
        hotel_id: Set(hotel_id),
        direction: Set("CREDIT".into()),
        amount: Set(amount),
        balance_after: Set(balance_after),
        description: Set(payload.description.or_else(|| Some("Recharge".into()))),
        reference_kind: Set("RECHARGE".into()),
        reference_id: Set(None),
        actor_kind: Set(actor.role.actor_kind().into()),
        actor_id: Set(Some(actor.actor_id)),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_activity(
        &state.pool,
        Some(hotel_id),
        Some(actor.actor_id),
        "wallet_recharged",
        &format!("Wallet recharged by {amount}"),
        Some(serde_json::json!({ "amount": amount, "balance_after": balance_after })),
    )
    .await
    {
        tracing::warn!(error = %err, "activity log failed");
    }

    Ok(ApiResponse::success(
        "Wallet recharged",
        WalletDetails {
            wallet: wallet_from_entity(wallet),
        },
        Some(Meta::empty()),
    ))
}

/// Advisory pre-flight check. The binding check is the locked debit.
pub async fn check_sufficiency(
    state: &AppState,
    actor: &Actor,
    kind: ChargeKind,
) -> AppResult<ApiResponse<SufficiencyReport>> {
    let hotel_id = actor.hotel_id()?;
    let wallet = get_or_create(&state.orm, hotel_id).await?;

    let charge = match kind {
        ChargeKind::Verification => wallet.per_verification_charge,
        ChargeKind::Order => wallet.per_order_charge,
    }
    .round_dp(2);

    let sufficient = charge <= Decimal::ZERO || wallet.balance >= charge;
    let shortfall = if sufficient {
        Decimal::ZERO
    } else {
        (charge - wallet.balance).round_dp(2)
    };

    Ok(ApiResponse::success(
        "Ok",
        SufficiencyReport {
            sufficient,
            charge,
            balance: wallet.balance,
            shortfall,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_wallet(state: &AppState, actor: &Actor) -> AppResult<ApiResponse<WalletDetails>> {
    let hotel_id = actor.hotel_id()?;
    let wallet = get_or_create(&state.orm, hotel_id).await?;

    Ok(ApiResponse::success(
        "Ok",
        WalletDetails {
            wallet: wallet_from_entity(wallet),
        },
        Some(Meta::empty()),
    ))
}

/// Admin-only: set the per-operation rates for a hotel.
pub async fn update_charges(
    state: &AppState,
    actor: &Actor,
    payload: UpdateChargesRequest,
) -> AppResult<ApiResponse<WalletDetails>> {
    ensure_admin(actor)?;

    if payload.per_verification_charge < Decimal::ZERO || payload.per_order_charge < Decimal::ZERO {
        return Err(AppError::BadRequest("Charges must not be negative".into()));
    }

    let txn = state.orm.begin().await?;

    get_or_create(&txn, payload.hotel_id).await?;
    let wallet = HotelWallets::find()
        .filter(WalletCol::HotelId.eq(payload.hotel_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: WalletActive = wallet.into();
    active.per_verification_charge = Set(payload.per_verification_charge.round_dp(2));
    active.per_order_charge = Set(payload.per_order_charge.round_dp(2));
    active.updated_at = Set(Utc::now().into());
    let wallet = active.update(&txn).await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Charges updated",
        WalletDetails {
            wallet: wallet_from_entity(wallet),
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_transactions(
    state: &AppState,
    actor: &Actor,
    pagination: Pagination,
) -> AppResult<ApiResponse<TransactionList>> {
    let hotel_id = actor.hotel_id()?;
    let (page, limit, offset) = pagination.normalize();

    let condition = Condition::all().add(TxnCol::HotelId.eq(hotel_id));

    let total = WalletTransactions::find()
        .filter(condition.clone())
        .count(&state.orm)
        .await? as i64;

    let rows = WalletTransactions::find()
        .filter(condition)
        .order_by_desc(TxnCol::CreatedAt)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|t| WalletTransaction {
            id: t.id,
            hotel_id: t.hotel_id,
            direction: t.direction,
            amount: t.amount,
            balance_after: t.balance_after,
            description: t.description,
            reference_kind: t.reference_kind,
            reference_id: t.reference_id,
            actor_kind: t.actor_kind,
            actor_id: t.actor_id,
            created_at: t.created_at.with_timezone(&Utc),
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        TransactionList { items },
        Some(meta),
    ))
}

pub(crate) fn wallet_from_entity(model: WalletModel) -> Wallet {
    Wallet {
        id: model.id,
        hotel_id: model.hotel_id,
        balance: model.balance,
        per_verification_charge: model.per_verification_charge,
        per_order_charge: model.per_order_charge,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
