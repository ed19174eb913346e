use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    activity::log_activity,
    dto::orders::{OrderList, PlaceOrderRequest, PlacedOrder, UpdateOrderStatusRequest},
    entity::{
        TableOrders, Tables,
        table_orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::Actor,
    models::{ChargeKind, LineItem, OrderStatus, PaymentStatus, TableOrder},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        active_table_service, bill_service,
        guest_access::{self, AccessDecision},
        table_service, wallet_service,
    },
    state::AppState,
};

fn validate_items(items: &[LineItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }
    for item in items {
        if item.name.trim().is_empty() {
            return Err(AppError::BadRequest("Item name is required".into()));
        }
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(format!(
                "Item '{}' has a non-positive quantity",
                item.name
            )));
        }
        if item.price < Decimal::ZERO {
            return Err(AppError::BadRequest(format!(
                "Item '{}' has a negative price",
                item.name
            )));
        }
    }
    Ok(())
}

/// Guest order placement. One transaction covers the access re-check, the
/// order insert, the bill merge and the occupancy bookkeeping; the table row
/// lock serializes concurrent guests racing for a free table.
pub async fn place_order(
    state: &AppState,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlacedOrder>> {
    let guest_name = payload.guest_name.trim().to_string();
    if guest_name.is_empty() {
        return Err(AppError::BadRequest("Guest name is required".into()));
    }
    validate_items(&payload.items)?;

    let txn = state.orm.begin().await?;

    let table = Tables::find_by_id(payload.table_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let open_bill = bill_service::open_bill_for_table_locked(&txn, table.id).await?;

    // The QR-scan check was advisory; this one, against the locked bill
    // row, is binding.
    let session_id = match guest_access::evaluate(open_bill.as_ref(), &guest_name) {
        AccessDecision::DenyViewOnly { holder } => {
            return Err(AppError::TableOccupied { holder });
        }
        AccessDecision::Allow { session_id } => session_id
            .or(payload.session_id)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
    };

    let total_amount: Decimal = payload
        .items
        .iter()
        .map(|i| i.price * Decimal::from(i.quantity))
        .sum::<Decimal>()
        .round_dp(2);

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        hotel_id: Set(table.hotel_id),
        table_id: Set(table.id),
        session_id: Set(session_id.clone()),
        guest_name: Set(Some(guest_name.clone())),
        items: Set(serde_json::to_value(&payload.items).map_err(anyhow::Error::from)?),
        total_amount: Set(total_amount),
        order_status: Set(OrderStatus::Active.as_str().into()),
        payment_status: Set(PaymentStatus::Pending.as_str().into()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let bill = bill_service::fold_order_into_bill(
        &txn,
        open_bill,
        &table,
        &guest_name,
        &session_id,
        &payload.items,
        state.tax_rate,
    )
    .await?;

    table_service::mark_busy(&txn, table.id, &session_id, &guest_name).await?;
    active_table_service::create_or_reuse_entry(&txn, &table, &bill).await?;

    txn.commit().await?;

    if let Err(err) = log_activity(
        &state.pool,
        Some(order.hotel_id),
        None,
        "order_placed",
        &format!("Order placed at table {}", table.table_number),
        Some(serde_json::json!({ "order_id": order.id, "bill_id": bill.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "activity log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        PlacedOrder {
            order: order_from_entity(order)?,
            bill: bill_service::bill_from_entity(bill)?,
        },
        Some(Meta::empty()),
    ))
}

/// Kitchen-side status progression. Completing an order debits the hotel's
/// per-order charge in the same transaction; an insufficient balance leaves
/// the order untouched.
pub async fn advance_status(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<TableOrder>> {
    let txn = state.orm.begin().await?;

    let order = TableOrders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    actor.ensure_hotel(order.hotel_id)?;

    let current = OrderStatus::parse(&order.order_status)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("corrupt order status")))?;

    if !current.can_advance_to(payload.status) {
        return Err(AppError::InvalidTransition(format!(
            "order cannot move from {} to {}",
            current.as_str(),
            payload.status.as_str()
        )));
    }

    if payload.status == OrderStatus::Completed {
        wallet_service::debit(&txn, order.hotel_id, ChargeKind::Order, Some(order.id)).await?;
    }

    let hotel_id = order.hotel_id;
    let mut active: OrderActive = order.into();
    active.order_status = Set(payload.status.as_str().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_activity(
        &state.pool,
        Some(hotel_id),
        Some(actor.actor_id),
        "order_status_updated",
        &format!("Order moved to {}", payload.status.as_str()),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "activity log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    actor: &Actor,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let hotel_id = actor.hotel_id()?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(OrderCol::HotelId.eq(hotel_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::OrderStatus.eq(status.clone()));
    }
    if let Some(table_id) = query.table_id {
        condition = condition.add(OrderCol::TableId.eq(table_id));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = TableOrders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Guest-facing view of a visit's orders, addressed by session.
pub async fn list_by_session(
    state: &AppState,
    session_id: &str,
) -> AppResult<ApiResponse<OrderList>> {
    let orders = TableOrders::find()
        .filter(OrderCol::SessionId.eq(session_id))
        .order_by_asc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(Meta::empty()),
    ))
}

pub(crate) fn order_from_entity(model: OrderModel) -> AppResult<TableOrder> {
    let items = bill_service::parse_items(&model.items)?;
    let order_status = OrderStatus::parse(&model.order_status)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("corrupt order status")))?;
    let payment_status = PaymentStatus::parse(&model.payment_status)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("corrupt payment status")))?;

    Ok(TableOrder {
        id: model.id,
        hotel_id: model.hotel_id,
        table_id: model.table_id,
        session_id: model.session_id,
        guest_name: model.guest_name,
        items,
        total_amount: model.total_amount,
        order_status,
        payment_status,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, price: i64, quantity: i32) -> LineItem {
        LineItem {
            name: name.into(),
            price: Decimal::from(price),
            quantity,
        }
    }

    #[test]
    fn empty_order_is_rejected() {
        assert!(validate_items(&[]).is_err());
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        assert!(validate_items(&[item("burger", 200, 0)]).is_err());
        assert!(validate_items(&[item("burger", 200, -1)]).is_err());
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(validate_items(&[item("burger", -1, 1)]).is_err());
    }

    #[test]
    fn free_items_are_allowed() {
        assert!(validate_items(&[item("water", 0, 2)]).is_ok());
    }
}
