use axum_dinein_api::{
    db::{create_orm_conn, create_pool},
    dto::{
        bills::SettlePaymentRequest,
        orders::PlaceOrderRequest,
        tables::CreateTableRequest,
    },
    entity::{
        ActiveTables, Bills, TableOrders, Tables,
        active_tables::{ActiveModel as EntryActive, Column as EntryCol},
        hotels::ActiveModel as HotelActive,
        tables::Column as TableCol,
    },
    error::AppError,
    middleware::auth::{Actor, Role},
    models::LineItem,
    services::{active_table_service, bill_service, guest_access, order_service, table_service},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

// Integration flow: guest scans QR -> orders accumulate on one bill ->
// a second guest is view-only -> settlement frees the table.
#[tokio::test]
async fn dine_in_flow_from_first_order_to_settlement() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let state = setup_state(&database_url).await?;
    let hotel_id = create_hotel(&state).await?;
    let manager = Actor {
        actor_id: Uuid::new_v4(),
        hotel_id: Some(hotel_id),
        role: Role::Manager,
    };

    // Register a table; a duplicate label must be rejected.
    let table = table_service::create_table(
        &state,
        &manager,
        CreateTableRequest {
            table_number: "T1".into(),
        },
    )
    .await?
    .data
    .unwrap();

    let duplicate = table_service::create_table(
        &state,
        &manager,
        CreateTableRequest {
            table_number: "T1".into(),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::DuplicateLabel(_))));

    // Alice's first order opens a bill: 1 burger @ 200 -> 5% tax -> 210.
    let placed = order_service::place_order(
        &state,
        PlaceOrderRequest {
            table_id: table.id,
            guest_name: "Alice".into(),
            session_id: None,
            items: vec![item("burger", 200, 1)],
        },
    )
    .await?
    .data
    .unwrap();

    let bill = &placed.bill;
    assert_eq!(bill.subtotal, Decimal::from(200));
    assert_eq!(bill.tax_amount, Decimal::new(1000, 2));
    assert_eq!(bill.total_amount, Decimal::new(21000, 2));
    let session_id = placed.order.session_id.clone();

    // Bob scanning the QR sees the table held by Alice, view-only.
    let report = guest_access::verify(&state, table.id, "Bob")
        .await?
        .data
        .unwrap();
    assert!(!report.allowed);
    assert!(report.view_only);
    assert_eq!(report.holder.as_deref(), Some("Alice"));

    // And Bob cannot place an order either.
    let denied = order_service::place_order(
        &state,
        PlaceOrderRequest {
            table_id: table.id,
            guest_name: "Bob".into(),
            session_id: None,
            items: vec![item("tea", 30, 1)],
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::TableOccupied { .. })));

    // Alice orders again; the items merge into the same bill.
    let placed = order_service::place_order(
        &state,
        PlaceOrderRequest {
            table_id: table.id,
            guest_name: "alice ".into(),
            session_id: None,
            items: vec![item("burger", 200, 1), item("fries", 80, 2)],
        },
    )
    .await?
    .data
    .unwrap();

    let bill = &placed.bill;
    assert_eq!(placed.order.session_id, session_id);
    assert_eq!(bill.subtotal, Decimal::from(560));
    assert_eq!(bill.tax_amount, Decimal::new(2800, 2));
    assert_eq!(bill.total_amount, Decimal::new(58800, 2));
    let burger = bill.items.iter().find(|i| i.name == "burger").unwrap();
    assert_eq!(burger.quantity, 2);

    let open_bills = Bills::find()
        .filter(
            axum_dinein_api::entity::bills::Column::TableId
                .eq(table.id)
                .and(axum_dinein_api::entity::bills::Column::BillStatus.eq("OPEN")),
        )
        .all(&state.orm)
        .await?;
    assert_eq!(open_bills.len(), 1, "second order must not open a new bill");

    // Settle: bill completed, orders paid, table released, entry closed.
    let settled = bill_service::settle_payment(
        &state,
        &manager,
        table.id,
        SettlePaymentRequest {
            payment_method: "cash".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(settled.payment_method.as_deref(), Some("cash"));
    assert!(settled.paid_at.is_some());

    let table_row = Tables::find_by_id(table.id).one(&state.orm).await?.unwrap();
    assert_eq!(table_row.status, "AVAILABLE");
    assert!(table_row.current_guest_name.is_none());

    let unpaid = TableOrders::find()
        .filter(
            axum_dinein_api::entity::table_orders::Column::TableId
                .eq(table.id)
                .and(axum_dinein_api::entity::table_orders::Column::PaymentStatus.eq("PENDING")),
        )
        .all(&state.orm)
        .await?;
    assert!(unpaid.is_empty(), "all orders must be paid after settlement");

    let active_entries = ActiveTables::find()
        .filter(EntryCol::TableId.eq(table.id).and(EntryCol::Status.eq("ACTIVE")))
        .all(&state.orm)
        .await?;
    assert!(active_entries.is_empty());

    // Settling again has nothing to settle.
    let again = bill_service::settle_payment(
        &state,
        &manager,
        table.id,
        SettlePaymentRequest {
            payment_method: "cash".into(),
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::NoOpenBill)));

    Ok(())
}

#[tokio::test]
async fn reconcile_heals_stale_tracker_state() -> anyhow::Result<()> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let state = setup_state(&database_url).await?;
    let hotel_id = create_hotel(&state).await?;
    let manager = Actor {
        actor_id: Uuid::new_v4(),
        hotel_id: Some(hotel_id),
        role: Role::Manager,
    };

    let stale = table_service::create_table(
        &state,
        &manager,
        CreateTableRequest {
            table_number: "T9".into(),
        },
    )
    .await?
    .data
    .unwrap();
    let occupied = table_service::create_table(
        &state,
        &manager,
        CreateTableRequest {
            table_number: "T10".into(),
        },
    )
    .await?
    .data
    .unwrap();
    let mislinked = table_service::create_table(
        &state,
        &manager,
        CreateTableRequest {
            table_number: "T11".into(),
        },
    )
    .await?
    .data
    .unwrap();

    // T10 is genuinely occupied with an open bill.
    let placed = order_service::place_order(
        &state,
        PlaceOrderRequest {
            table_id: occupied.id,
            guest_name: "Alice".into(),
            session_id: None,
            items: vec![item("tea", 30, 1)],
        },
    )
    .await?
    .data
    .unwrap();

    // Fabricate drift: T9 is BUSY with an ACTIVE entry pointing at no bill,
    // and T11 is BUSY with an ACTIVE entry pointing at T10's open bill.
    for (table_id, bill_id) in [(stale.id, None), (mislinked.id, Some(placed.bill.id))] {
        Tables::update_many()
            .col_expr(TableCol::Status, sea_orm::sea_query::Expr::value("BUSY"))
            .filter(TableCol::Id.eq(table_id))
            .exec(&state.orm)
            .await?;

        EntryActive {
            id: Set(Uuid::new_v4()),
            table_id: Set(table_id),
            bill_id: Set(bill_id),
            hotel_id: Set(hotel_id),
            guest_name: Set(Some("Ghost".into())),
            session_id: Set(Some("stale".into())),
            status: Set("ACTIVE".into()),
            created_at: NotSet,
            closed_at: Set(None),
        }
        .insert(&state.orm)
        .await?;
    }

    let report = active_table_service::reconcile(&state, &manager)
        .await?
        .data
        .unwrap();
    assert_eq!(report.entries_closed, 2);
    assert_eq!(report.tables_released, 2);

    for table_id in [stale.id, mislinked.id] {
        let table_row = Tables::find_by_id(table_id).one(&state.orm).await?.unwrap();
        assert_eq!(table_row.status, "AVAILABLE");
    }

    // The genuinely occupied table is untouched.
    let occupied_row = Tables::find_by_id(occupied.id).one(&state.orm).await?.unwrap();
    assert_eq!(occupied_row.status, "BUSY");
    let live_entries = ActiveTables::find()
        .filter(EntryCol::TableId.eq(occupied.id).and(EntryCol::Status.eq("ACTIVE")))
        .all(&state.orm)
        .await?;
    assert_eq!(live_entries.len(), 1);

    // A second sweep finds nothing to repair.
    let report = active_table_service::reconcile(&state, &manager)
        .await?
        .data
        .unwrap();
    assert_eq!(report.entries_closed, 0);
    assert_eq!(report.tables_released, 0);

    Ok(())
}

// Settlement and a racing guest order take the table and bill locks in the
// same order, so the transactions queue instead of deadlocking; any failure
// must be a domain outcome, never a database error.
#[tokio::test]
async fn concurrent_settlement_and_order_serialize_cleanly() -> anyhow::Result<()> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let state = setup_state(&database_url).await?;
    let hotel_id = create_hotel(&state).await?;
    let manager = Actor {
        actor_id: Uuid::new_v4(),
        hotel_id: Some(hotel_id),
        role: Role::Manager,
    };

    let table = table_service::create_table(
        &state,
        &manager,
        CreateTableRequest {
            table_number: "T5".into(),
        },
    )
    .await?
    .data
    .unwrap();

    for _ in 0..5 {
        order_service::place_order(
            &state,
            PlaceOrderRequest {
                table_id: table.id,
                guest_name: "Alice".into(),
                session_id: None,
                items: vec![item("burger", 200, 1)],
            },
        )
        .await?;

        let settle = bill_service::settle_payment(
            &state,
            &manager,
            table.id,
            SettlePaymentRequest {
                payment_method: "cash".into(),
            },
        );
        let order = order_service::place_order(
            &state,
            PlaceOrderRequest {
                table_id: table.id,
                guest_name: "Alice".into(),
                session_id: None,
                items: vec![item("fries", 80, 1)],
            },
        );
        let (settled, ordered) = tokio::join!(settle, order);

        for err in [settled.err(), ordered.err()].into_iter().flatten() {
            assert!(
                matches!(err, AppError::NoOpenBill | AppError::TableOccupied { .. }),
                "expected clean serialization, got {err:?}"
            );
        }

        // Drain whatever bill the racing order may have left open.
        match bill_service::settle_payment(
            &state,
            &manager,
            table.id,
            SettlePaymentRequest {
                payment_method: "cash".into(),
            },
        )
        .await
        {
            Ok(_) | Err(AppError::NoOpenBill) => {}
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn item(name: &str, price: i64, quantity: i32) -> LineItem {
    LineItem {
        name: name.into(),
        price: Decimal::from(price),
        quantity,
    }
}

// Each test creates its own hotel, so concurrent tests sharing the database
// never see each other's rows.
async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(AppState {
        pool,
        orm,
        tax_rate: Decimal::new(500, 2),
    })
}

async fn create_hotel(state: &AppState) -> anyhow::Result<Uuid> {
    let hotel = HotelActive {
        id: Set(Uuid::new_v4()),
        hotel_name: Set("Test Hotel".into()),
        address: Set("1 Main St".into()),
        city: Set("Springfield".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(hotel.id)
}
