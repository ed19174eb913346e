use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    activity::log_activity,
    dto::tables::{CreateTableRequest, TableList},
    entity::{
        Tables,
        tables::{ActiveModel as TableActive, Column as TableCol, Model as TableModel},
    },
    error::{AppError, AppResult},
    middleware::auth::Actor,
    models::{DiningTable, TableOverview},
    response::{ApiResponse, Meta},
    services::bill_service,
    state::AppState,
};

pub async fn create_table(
    state: &AppState,
    actor: &Actor,
    payload: CreateTableRequest,
) -> AppResult<ApiResponse<DiningTable>> {
    let hotel_id = actor.hotel_id()?;

    let table_number = payload.table_number.trim().to_string();
    if table_number.is_empty() {
        return Err(AppError::BadRequest("Table number is required".into()));
    }

    // Friendly pre-check; the unique index on (hotel_id, table_number) is
    // the real guard against a racing duplicate.
    let existing = Tables::find()
        .filter(
            Condition::all()
                .add(TableCol::HotelId.eq(hotel_id))
                .add(TableCol::TableNumber.eq(table_number.clone())),
        )
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::DuplicateLabel(table_number));
    }

    let table = TableActive {
        id: Set(Uuid::new_v4()),
        hotel_id: Set(hotel_id),
        table_number: Set(table_number),
        status: Set("AVAILABLE".into()),
        current_session_id: Set(None),
        current_guest_name: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_activity(
        &state.pool,
        Some(hotel_id),
        Some(actor.actor_id),
        "table_created",
        &format!("Table {} created", table.table_number),
        Some(serde_json::json!({ "table_id": table.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "activity log failed");
    }

    Ok(ApiResponse::success(
        "Table created",
        table_from_entity(table),
        Some(Meta::empty()),
    ))
}

#[derive(sqlx::FromRow)]
struct OverviewRow {
    id: Uuid,
    hotel_id: Uuid,
    table_number: String,
    derived_status: String,
    current_guest_name: Option<String>,
    active_bill_id: Option<Uuid>,
    active_bill_number: Option<String>,
    active_bill_total: Option<Decimal>,
    created_at: DateTime<Utc>,
}

/// Dashboard listing. Occupancy is derived from the open bill, not the
/// cached `status` column, so a stale cache never shows a free table as
/// busy here.
pub async fn list_tables(state: &AppState, actor: &Actor) -> AppResult<ApiResponse<TableList>> {
    let hotel_id = actor.hotel_id()?;

    let rows: Vec<OverviewRow> = sqlx::query_as(
        r#"
        SELECT t.id, t.hotel_id, t.table_number, t.created_at,
               CASE WHEN b.id IS NOT NULL THEN 'BUSY' ELSE 'AVAILABLE' END AS derived_status,
               a.guest_name AS current_guest_name,
               b.id AS active_bill_id,
               b.bill_number AS active_bill_number,
               b.total_amount AS active_bill_total
        FROM tables t
        LEFT JOIN bills b ON b.table_id = t.id AND b.bill_status = 'OPEN'
        LEFT JOIN active_tables a ON a.table_id = t.id AND a.status = 'ACTIVE'
        WHERE t.hotel_id = $1
        ORDER BY t.table_number
        "#,
    )
    .bind(hotel_id)
    .fetch_all(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|r| TableOverview {
            id: r.id,
            hotel_id: r.hotel_id,
            table_number: r.table_number,
            derived_status: r.derived_status,
            current_guest_name: r.current_guest_name,
            active_bill_id: r.active_bill_id,
            active_bill_number: r.active_bill_number,
            active_bill_total: r.active_bill_total,
            created_at: r.created_at,
        })
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        TableList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_table(
    state: &AppState,
    actor: &Actor,
    id: Uuid,
) -> AppResult<ApiResponse<DiningTable>> {
    let table = Tables::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    actor.ensure_hotel(table.hotel_id)?;

    Ok(ApiResponse::success(
        "Ok",
        table_from_entity(table),
        Some(Meta::empty()),
    ))
}

pub async fn delete_table(
    state: &AppState,
    actor: &Actor,
    id: Uuid,
) -> AppResult<ApiResponse<()>> {
    let table = Tables::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    actor.ensure_hotel(table.hotel_id)?;

    if bill_service::open_bill_for_table(&state.orm, table.id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "Table has an open bill and cannot be deleted".into(),
        ));
    }

    let hotel_id = table.hotel_id;
    let table_number = table.table_number.clone();
    table.delete(&state.orm).await?;

    if let Err(err) = log_activity(
        &state.pool,
        Some(hotel_id),
        Some(actor.actor_id),
        "table_deleted",
        &format!("Table {table_number} deleted"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "activity log failed");
    }

    Ok(ApiResponse::success("Table deleted", (), Some(Meta::empty())))
}

/// Cache the occupancy on the table row. COALESCE keeps the first guest's
/// name and session in place when a returning guest re-orders.
pub(crate) async fn mark_busy<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
    session_id: &str,
    guest_name: &str,
) -> AppResult<()> {
    Tables::update_many()
        .col_expr(TableCol::Status, Expr::value("BUSY"))
        .col_expr(
            TableCol::CurrentSessionId,
            Func::coalesce([
                Expr::col(TableCol::CurrentSessionId).into(),
                Expr::value(session_id).into(),
            ])
            .into(),
        )
        .col_expr(
            TableCol::CurrentGuestName,
            Func::coalesce([
                Expr::col(TableCol::CurrentGuestName).into(),
                Expr::value(guest_name).into(),
            ])
            .into(),
        )
        .filter(TableCol::Id.eq(table_id))
        .exec(conn)
        .await?;
    Ok(())
}

pub(crate) async fn mark_available<C: ConnectionTrait>(conn: &C, table_id: Uuid) -> AppResult<()> {
    Tables::update_many()
        .col_expr(TableCol::Status, Expr::value("AVAILABLE"))
        .col_expr(TableCol::CurrentSessionId, Expr::value(Option::<String>::None))
        .col_expr(TableCol::CurrentGuestName, Expr::value(Option::<String>::None))
        .filter(TableCol::Id.eq(table_id))
        .exec(conn)
        .await?;
    Ok(())
}

pub(crate) fn table_from_entity(model: TableModel) -> DiningTable {
    DiningTable {
        id: model.id,
        hotel_id: model.hotel_id,
        table_number: model.table_number,
        status: model.status,
        current_session_id: model.current_session_id,
        current_guest_name: model.current_guest_name,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
