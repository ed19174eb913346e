use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    activity::log_activity,
    dto::tables::ReconcileReport,
    entity::{
        ActiveTables,
        active_tables::{ActiveModel as EntryActive, Column as EntryCol, Model as EntryModel},
        bills::Model as BillModel,
        tables::Model as TableModel,
    },
    error::AppResult,
    middleware::auth::Actor,
    models::{ActiveTableEntry, EntryStatus},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Record the occupancy for a table. An existing ACTIVE entry is updated in
/// place rather than duplicated; the partial unique index allows at most one.
pub(crate) async fn create_or_reuse_entry(
    txn: &DatabaseTransaction,
    table: &TableModel,
    bill: &BillModel,
) -> AppResult<EntryModel> {
    let existing = ActiveTables::find()
        .filter(
            Condition::all()
                .add(EntryCol::TableId.eq(table.id))
                .add(EntryCol::Status.eq(EntryStatus::Active.as_str())),
        )
        .one(txn)
        .await?;

    if let Some(entry) = existing {
        let mut active: EntryActive = entry.into();
        active.bill_id = Set(Some(bill.id));
        active.guest_name = Set(bill.guest_name.clone());
        active.session_id = Set(bill.session_id.clone());
        let entry = active.update(txn).await?;
        return Ok(entry);
    }

    let entry = EntryActive {
        id: Set(Uuid::new_v4()),
        table_id: Set(table.id),
        bill_id: Set(Some(bill.id)),
        hotel_id: Set(table.hotel_id),
        guest_name: Set(bill.guest_name.clone()),
        session_id: Set(bill.session_id.clone()),
        status: Set(EntryStatus::Active.as_str().into()),
        created_at: NotSet,
        closed_at: Set(None),
    }
    .insert(txn)
    .await?;

    Ok(entry)
}

/// Close any ACTIVE entry for the table. Idempotent; a table with no entry
/// is a no-op.
pub(crate) async fn close_entry<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
    closed_at: DateTime<FixedOffset>,
) -> AppResult<()> {
    ActiveTables::update_many()
        .col_expr(EntryCol::Status, Expr::value(EntryStatus::Closed.as_str()))
        .col_expr(EntryCol::ClosedAt, Expr::value(closed_at))
        .filter(
            Condition::all()
                .add(EntryCol::TableId.eq(table_id))
                .add(EntryCol::Status.eq(EntryStatus::Active.as_str())),
        )
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn list_entries(
    state: &AppState,
    actor: &Actor,
) -> AppResult<ApiResponse<Vec<ActiveTableEntry>>> {
    let hotel_id = actor.hotel_id()?;

    let entries = ActiveTables::find()
        .filter(
            Condition::all()
                .add(EntryCol::HotelId.eq(hotel_id))
                .add(EntryCol::Status.eq(EntryStatus::Active.as_str())),
        )
        .order_by_desc(EntryCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(entry_from_entity)
        .collect();

    Ok(ApiResponse::success("Ok", entries, Some(Meta::empty())))
}

/// Repair drift between the tracker, the bills and the cached table status.
/// Crash between a settlement's steps, or rows edited out of band, can leave
/// an ACTIVE entry with no open bill behind it; this sweep closes those and
/// releases the affected tables.
pub async fn reconcile(state: &AppState, actor: &Actor) -> AppResult<ApiResponse<ReconcileReport>> {
    let hotel_id = actor.hotel_id()?;

    let mut txn = state.pool.begin().await?;

    let entries_closed = sqlx::query(
        r#"
        UPDATE active_tables a
        SET status = 'CLOSED', closed_at = now()
        WHERE a.hotel_id = $1
          AND a.status = 'ACTIVE'
          AND NOT EXISTS (
              SELECT 1 FROM bills b
              WHERE b.id = a.bill_id
                AND b.table_id = a.table_id
                AND b.bill_status = 'OPEN'
          )
        "#,
    )
    .bind(hotel_id)
    .execute(&mut *txn)
    .await?
    .rows_affected();

    let tables_released = sqlx::query(
        r#"
        UPDATE tables t
        SET status = 'AVAILABLE', current_session_id = NULL, current_guest_name = NULL
        WHERE t.hotel_id = $1
          AND t.status = 'BUSY'
          AND NOT EXISTS (
              SELECT 1 FROM bills b
              WHERE b.table_id = t.id AND b.bill_status = 'OPEN'
          )
        "#,
    )
    .bind(hotel_id)
    .execute(&mut *txn)
    .await?
    .rows_affected();

    txn.commit().await?;

    if entries_closed > 0 || tables_released > 0 {
        if let Err(err) = log_activity(
            &state.pool,
            Some(hotel_id),
            Some(actor.actor_id),
            "tables_reconciled",
            &format!(
                "Reconcile closed {entries_closed} entries, released {tables_released} tables"
            ),
            None,
        )
        .await
        {
            tracing::warn!(error = %err, "activity log failed");
        }
    }

    Ok(ApiResponse::success(
        "Reconcile complete",
        ReconcileReport {
            entries_closed,
            tables_released,
        },
        Some(Meta::empty()),
    ))
}

pub(crate) fn entry_from_entity(model: EntryModel) -> ActiveTableEntry {
    ActiveTableEntry {
        id: model.id,
        table_id: model.table_id,
        bill_id: model.bill_id,
        hotel_id: model.hotel_id,
        guest_name: model.guest_name,
        session_id: model.session_id,
        status: EntryStatus::parse(&model.status).unwrap_or(EntryStatus::Closed),
        created_at: model.created_at.with_timezone(&Utc),
        closed_at: model.closed_at.map(|dt| dt.with_timezone(&Utc)),
    }
}
