use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    activity::log_activity,
    dto::bills::{BillList, SettlePaymentRequest},
    entity::{
        Bills, Hotels, TableOrders, Tables,
        bills::{ActiveModel as BillActive, Column as BillCol, Model as BillModel},
        table_orders::Column as OrderCol,
        tables,
    },
    error::{AppError, AppResult},
    middleware::auth::Actor,
    models::{Bill, BillStatus, LineItem, PaymentStatus},
    response::{ApiResponse, Meta},
    routes::params::{BillListQuery, SortOrder},
    services::{active_table_service, table_service},
    state::AppState,
};

pub(crate) fn parse_items(value: &serde_json::Value) -> AppResult<Vec<LineItem>> {
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt item list: {e}")))
}

/// Combine quantities for lines with identical (name, price) instead of
/// appending duplicates.
pub fn merge_line_items(existing: &mut Vec<LineItem>, new_items: &[LineItem]) {
    for item in new_items {
        match existing
            .iter_mut()
            .find(|e| e.name == item.name && e.price == item.price)
        {
            Some(found) => found.quantity += item.quantity,
            None => existing.push(item.clone()),
        }
    }
}

/// Subtotal, tax and total for a merged item list. Every step rounds to two
/// decimals so repeated merges drift by at most one rounding per merge.
pub fn compute_totals(items: &[LineItem], tax_rate: Decimal) -> (Decimal, Decimal, Decimal) {
    let subtotal: Decimal = items
        .iter()
        .map(|i| i.price * Decimal::from(i.quantity))
        .sum::<Decimal>()
        .round_dp(2);
    let tax_amount = (subtotal * tax_rate / Decimal::ONE_HUNDRED).round_dp(2);
    let total = (subtotal + tax_amount).round_dp(2);
    (subtotal, tax_amount, total)
}

fn generate_bill_number() -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("BILL-{}-{}", timestamp, &suffix[..6])
}

/// The table's open bill, if any. At most one exists by invariant; the
/// `created_at` ordering is defensive against legacy data.
pub async fn open_bill_for_table<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
) -> AppResult<Option<BillModel>> {
    let bill = Bills::find()
        .filter(
            Condition::all()
                .add(BillCol::TableId.eq(table_id))
                .add(BillCol::BillStatus.eq(BillStatus::Open.as_str())),
        )
        .order_by_desc(BillCol::CreatedAt)
        .one(conn)
        .await?;
    Ok(bill)
}

/// Same lookup with a row lock, serializing concurrent order placement and
/// settlement for the table.
pub(crate) async fn open_bill_for_table_locked(
    txn: &DatabaseTransaction,
    table_id: Uuid,
) -> AppResult<Option<BillModel>> {
    let bill = Bills::find()
        .filter(
            Condition::all()
                .add(BillCol::TableId.eq(table_id))
                .add(BillCol::BillStatus.eq(BillStatus::Open.as_str())),
        )
        .order_by_desc(BillCol::CreatedAt)
        .lock(LockType::Update)
        .one(txn)
        .await?;
    Ok(bill)
}

/// Merge an order's items into the table's open bill, or open a new bill
/// with receipt snapshots. `open_bill` must be the row locked by the caller's
/// transaction. An orphaned bill (no guest recorded) is adopted: the placing
/// guest's name and session are written onto it.
pub(crate) async fn fold_order_into_bill(
    txn: &DatabaseTransaction,
    open_bill: Option<BillModel>,
    table: &tables::Model,
    guest_name: &str,
    session_id: &str,
    new_items: &[LineItem],
    tax_rate: Decimal,
) -> AppResult<BillModel> {
    if let Some(bill) = open_bill {
        let mut items = parse_items(&bill.items)?;
        merge_line_items(&mut items, new_items);
        let (subtotal, tax_amount, total_amount) = compute_totals(&items, bill.tax_rate);

        let orphaned = bill
            .guest_name
            .as_deref()
            .map(|g| g.trim().is_empty())
            .unwrap_or(true);

        let mut active: BillActive = bill.into();
        active.items = Set(serde_json::to_value(&items).map_err(anyhow::Error::from)?);
        active.subtotal = Set(subtotal);
        active.tax_amount = Set(tax_amount);
        active.total_amount = Set(total_amount);
        if orphaned {
            active.guest_name = Set(Some(guest_name.to_string()));
            active.session_id = Set(Some(session_id.to_string()));
        }
        let bill = active.update(txn).await?;
        return Ok(bill);
    }

    // Snapshot hotel name/address and table label for the receipt.
    let hotel = Hotels::find_by_id(table.hotel_id).one(txn).await?;
    let (hotel_name, hotel_address) = match hotel {
        Some(h) => {
            let address = if h.address.is_empty() {
                h.city
            } else if h.city.is_empty() {
                h.address
            } else {
                format!("{}, {}", h.address, h.city)
            };
            (h.hotel_name, address)
        }
        None => (String::new(), String::new()),
    };

    let (subtotal, tax_amount, total_amount) = compute_totals(new_items, tax_rate);

    let bill = BillActive {
        id: Set(Uuid::new_v4()),
        bill_number: Set(generate_bill_number()),
        hotel_id: Set(table.hotel_id),
        table_id: Set(table.id),
        session_id: Set(Some(session_id.to_string())),
        guest_name: Set(Some(guest_name.to_string())),
        hotel_name: Set(hotel_name),
        hotel_address: Set(hotel_address),
        table_number: Set(table.table_number.clone()),
        items: Set(serde_json::to_value(new_items).map_err(anyhow::Error::from)?),
        subtotal: Set(subtotal),
        tax_rate: Set(tax_rate),
        tax_amount: Set(tax_amount),
        total_amount: Set(total_amount),
        bill_status: Set(BillStatus::Open.as_str().into()),
        payment_status: Set(PaymentStatus::Pending.as_str().into()),
        payment_method: Set(None),
        paid_at: Set(None),
        created_at: NotSet,
    }
    .insert(txn)
    .await?;

    Ok(bill)
}

/// Mark a locked OPEN bill paid, flip its orders to PAID, and release the
/// table if no other open bill remains. Runs entirely inside the caller's
/// transaction.
async fn finalize_bill(
    txn: &DatabaseTransaction,
    bill: BillModel,
    payment_method: &str,
) -> AppResult<BillModel> {
    let paid_at = Utc::now();

    // Orders are matched by the bill's session; guest name is the fallback
    // for legacy rows without one.
    let mut orders_update = TableOrders::update_many()
        .col_expr(
            OrderCol::PaymentStatus,
            Expr::value(PaymentStatus::Paid.as_str()),
        )
        .filter(OrderCol::TableId.eq(bill.table_id));
    if let Some(session_id) = bill.session_id.clone() {
        orders_update = orders_update.filter(OrderCol::SessionId.eq(session_id));
    } else if let Some(guest_name) = bill.guest_name.clone() {
        orders_update = orders_update.filter(OrderCol::GuestName.eq(guest_name));
    }
    orders_update.exec(txn).await?;

    let table_id = bill.table_id;
    let bill_id = bill.id;

    let mut active: BillActive = bill.into();
    active.bill_status = Set(BillStatus::Completed.as_str().into());
    active.payment_status = Set(PaymentStatus::Paid.as_str().into());
    active.payment_method = Set(Some(payment_method.to_string()));
    active.paid_at = Set(Some(paid_at.into()));
    let bill = active.update(txn).await?;

    // There should never be another open bill, but check defensively before
    // freeing the table.
    let other_open = Bills::find()
        .filter(
            Condition::all()
                .add(BillCol::TableId.eq(table_id))
                .add(BillCol::BillStatus.eq(BillStatus::Open.as_str()))
                .add(BillCol::Id.ne(bill_id)),
        )
        .count(txn)
        .await?;

    if other_open == 0 {
        active_table_service::close_entry(txn, table_id, paid_at.into()).await?;
        table_service::mark_available(txn, table_id).await?;
    }

    Ok(bill)
}

/// Settle the table's open bill. All-or-nothing: a failure partway leaves
/// neither a PAID bill on a BUSY table nor the reverse.
pub async fn settle_payment(
    state: &AppState,
    actor: &Actor,
    table_id: Uuid,
    payload: SettlePaymentRequest,
) -> AppResult<ApiResponse<Bill>> {
    let txn = state.orm.begin().await?;

    // Lock the table row before the bill row. Order placement takes the
    // same locks in the same order, so the two flows serialize instead of
    // deadlocking.
    let table = Tables::find_by_id(table_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    actor.ensure_hotel(table.hotel_id)?;

    let bill = open_bill_for_table_locked(&txn, table.id)
        .await?
        .ok_or(AppError::NoOpenBill)?;

    let bill = finalize_bill(&txn, bill, &payload.payment_method).await?;

    txn.commit().await?;

    if let Err(err) = log_activity(
        &state.pool,
        Some(bill.hotel_id),
        Some(actor.actor_id),
        "payment_settled",
        &format!("Bill {} settled", bill.bill_number),
        Some(serde_json::json!({ "bill_id": bill.id, "table_id": table_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "activity log failed");
    }

    Ok(ApiResponse::success(
        "Payment settled",
        bill_from_entity(bill)?,
        Some(Meta::empty()),
    ))
}

/// Administrative settlement addressed by bill id rather than table.
pub async fn complete_bill(
    state: &AppState,
    actor: &Actor,
    bill_id: Uuid,
    payload: SettlePaymentRequest,
) -> AppResult<ApiResponse<Bill>> {
    let txn = state.orm.begin().await?;

    // Resolve the table id unlocked, then take the table lock before the
    // bill lock to match settlement and order placement.
    let bill = Bills::find_by_id(bill_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    actor.ensure_hotel(bill.hotel_id)?;

    Tables::find_by_id(bill.table_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let bill = Bills::find_by_id(bill_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if bill.bill_status != BillStatus::Open.as_str() {
        return Err(AppError::InvalidTransition(format!(
            "bill {} is already {}",
            bill.bill_number, bill.bill_status
        )));
    }

    let bill = finalize_bill(&txn, bill, &payload.payment_method).await?;

    txn.commit().await?;

    if let Err(err) = log_activity(
        &state.pool,
        Some(bill.hotel_id),
        Some(actor.actor_id),
        "bill_completed",
        &format!("Bill {} completed", bill.bill_number),
        Some(serde_json::json!({ "bill_id": bill.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "activity log failed");
    }

    Ok(ApiResponse::success(
        "Bill completed",
        bill_from_entity(bill)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_bills(
    state: &AppState,
    actor: &Actor,
    query: BillListQuery,
) -> AppResult<ApiResponse<BillList>> {
    let hotel_id = actor.hotel_id()?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(BillCol::HotelId.eq(hotel_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(BillCol::BillStatus.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Bills::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(BillCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(BillCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let bills = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(bill_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        BillList { items: bills },
        Some(meta),
    ))
}

pub async fn get_bill(state: &AppState, actor: &Actor, id: Uuid) -> AppResult<ApiResponse<Bill>> {
    let bill = Bills::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    actor.ensure_hotel(bill.hotel_id)?;

    Ok(ApiResponse::success(
        "Ok",
        bill_from_entity(bill)?,
        Some(Meta::empty()),
    ))
}

pub(crate) fn bill_from_entity(model: BillModel) -> AppResult<Bill> {
    let items = parse_items(&model.items)?;
    let bill_status = BillStatus::parse(&model.bill_status)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("corrupt bill status")))?;
    let payment_status = PaymentStatus::parse(&model.payment_status)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("corrupt payment status")))?;

    Ok(Bill {
        id: model.id,
        bill_number: model.bill_number,
        hotel_id: model.hotel_id,
        table_id: model.table_id,
        session_id: model.session_id,
        guest_name: model.guest_name,
        hotel_name: model.hotel_name,
        hotel_address: model.hotel_address,
        table_number: model.table_number,
        items,
        subtotal: model.subtotal,
        tax_rate: model.tax_rate,
        tax_amount: model.tax_amount,
        total_amount: model.total_amount,
        bill_status,
        payment_status,
        payment_method: model.payment_method,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
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
    fn merge_combines_matching_lines() {
        let mut existing = vec![item("burger", 200, 1)];
        merge_line_items(&mut existing, &[item("burger", 200, 1), item("fries", 80, 2)]);

        assert_eq!(existing.len(), 2);
        assert_eq!(existing[0].quantity, 2);
        assert_eq!(existing[1].name, "fries");
        assert_eq!(existing[1].quantity, 2);
    }

    #[test]
    fn merge_keeps_same_name_different_price_apart() {
        let mut existing = vec![item("burger", 200, 1)];
        merge_line_items(&mut existing, &[item("burger", 250, 1)]);

        assert_eq!(existing.len(), 2);
        assert_eq!(existing[0].quantity, 1);
        assert_eq!(existing[1].quantity, 1);
    }

    #[test]
    fn merge_conserves_quantities() {
        let mut existing = vec![item("burger", 200, 1), item("cola", 50, 3)];
        let incoming = vec![item("burger", 200, 2), item("fries", 80, 1)];
        let before: i32 = existing.iter().chain(incoming.iter()).map(|i| i.quantity).sum();

        merge_line_items(&mut existing, &incoming);

        let after: i32 = existing.iter().map(|i| i.quantity).sum();
        assert_eq!(before, after);
    }

    #[test]
    fn totals_apply_five_percent_tax() {
        let items = vec![item("burger", 200, 1)];
        let (subtotal, tax, total) = compute_totals(&items, Decimal::new(500, 2));
        assert_eq!(subtotal, Decimal::from(200));
        assert_eq!(tax, Decimal::new(1000, 2));
        assert_eq!(total, Decimal::new(21000, 2));
    }

    #[test]
    fn totals_round_to_two_decimals_each_step() {
        // 3 × 33.33 = 99.99; 5% tax = 4.9995 -> 5.00
        let items = vec![LineItem {
            name: "thali".into(),
            price: Decimal::new(3333, 2),
            quantity: 3,
        }];
        let (subtotal, tax, total) = compute_totals(&items, Decimal::new(500, 2));
        assert_eq!(subtotal, Decimal::new(9999, 2));
        assert_eq!(tax, Decimal::new(500, 2));
        assert_eq!(total, Decimal::new(10499, 2));
    }

    #[test]
    fn scenario_second_order_merges_into_one_bill() {
        // First order: 1 burger @200. Second: 1 burger @200 + 2 fries @80.
        let mut items = vec![item("burger", 200, 1)];
        merge_line_items(&mut items, &[item("burger", 200, 1), item("fries", 80, 2)]);
        let (subtotal, tax, total) = compute_totals(&items, Decimal::new(500, 2));

        assert_eq!(subtotal, Decimal::from(560));
        assert_eq!(tax, Decimal::new(2800, 2));
        assert_eq!(total, Decimal::new(58800, 2));
    }

    #[test]
    fn bill_numbers_are_unique() {
        let a = generate_bill_number();
        let b = generate_bill_number();
        assert!(a.starts_with("BILL-"));
        assert_ne!(a, b);
    }
}
