use axum_dinein_api::{
    db::{create_orm_conn, create_pool},
    dto::{
        orders::{PlaceOrderRequest, UpdateOrderStatusRequest},
        tables::CreateTableRequest,
        wallet::{RechargeRequest, UpdateChargesRequest},
    },
    entity::{
        WalletTransactions, hotels::ActiveModel as HotelActive,
        wallet_transactions::Column as TxnCol,
    },
    error::AppError,
    middleware::auth::{Actor, Role},
    models::{LineItem, OrderStatus},
    services::{order_service, table_service, wallet_service},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

// Wallet flow: charges are configured by an admin, debited atomically on
// order completion, and refused when the balance falls short.
#[tokio::test]
async fn order_completion_debits_wallet_atomically() -> anyhow::Result<()> {
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
    let admin = Actor {
        actor_id: Uuid::new_v4(),
        hotel_id: None,
        role: Role::Admin,
    };

    // First touch auto-creates a zero wallet.
    let wallet = wallet_service::get_wallet(&state, &manager)
        .await?
        .data
        .unwrap()
        .wallet;
    assert_eq!(wallet.balance, Decimal::ZERO);
    assert_eq!(wallet.per_order_charge, Decimal::ZERO);

    // Only admins set rates.
    let forbidden = wallet_service::update_charges(
        &state,
        &manager,
        UpdateChargesRequest {
            hotel_id,
            per_verification_charge: Decimal::ZERO,
            per_order_charge: Decimal::from(75),
        },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    wallet_service::update_charges(
        &state,
        &admin,
        UpdateChargesRequest {
            hotel_id,
            per_verification_charge: Decimal::ZERO,
            per_order_charge: Decimal::from(75),
        },
    )
    .await?;

    // Non-positive recharges are rejected.
    let rejected = wallet_service::credit(
        &state,
        &manager,
        RechargeRequest {
            hotel_id: None,
            amount: Decimal::ZERO,
            description: None,
        },
    )
    .await;
    assert!(matches!(rejected, Err(AppError::BadRequest(_))));

    wallet_service::credit(
        &state,
        &manager,
        RechargeRequest {
            hotel_id: None,
            amount: Decimal::from(50),
            description: Some("initial top-up".into()),
        },
    )
    .await?;

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

    let order = order_service::place_order(
        &state,
        PlaceOrderRequest {
            table_id: table.id,
            guest_name: "Alice".into(),
            session_id: None,
            items: vec![LineItem {
                name: "burger".into(),
                price: Decimal::from(200),
                quantity: 1,
            }],
        },
    )
    .await?
    .data
    .unwrap()
    .order;

    // Balance 50 vs charge 75: completion is refused with the shortfall,
    // and neither the order nor the balance changes.
    let refused = order_service::advance_status(
        &state,
        &manager,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Completed,
        },
    )
    .await;
    match refused {
        Err(AppError::InsufficientBalance { shortfall, balance, .. }) => {
            assert_eq!(shortfall, Decimal::from(25));
            assert_eq!(balance, Decimal::from(50));
        }
        other => panic!("expected InsufficientBalance, got {other:?}"),
    }

    let wallet = wallet_service::get_wallet(&state, &manager)
        .await?
        .data
        .unwrap()
        .wallet;
    assert_eq!(wallet.balance, Decimal::from(50));

    let unchanged = order_service::list_by_session(&state, &order.session_id)
        .await?
        .data
        .unwrap();
    assert_eq!(unchanged.items[0].order_status, OrderStatus::Active);

    // Top up past the charge and retry.
    wallet_service::credit(
        &state,
        &manager,
        RechargeRequest {
            hotel_id: None,
            amount: Decimal::from(100),
            description: None,
        },
    )
    .await?;

    let completed = order_service::advance_status(
        &state,
        &manager,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Completed,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(completed.order_status, OrderStatus::Completed);

    let wallet = wallet_service::get_wallet(&state, &manager)
        .await?
        .data
        .unwrap()
        .wallet;
    assert_eq!(wallet.balance, Decimal::from(75));

    // The debit left one ledger row referencing the order.
    let debits = WalletTransactions::find()
        .filter(TxnCol::HotelId.eq(hotel_id).and(TxnCol::Direction.eq("DEBIT")))
        .all(&state.orm)
        .await?;
    assert_eq!(debits.len(), 1);
    assert_eq!(debits[0].amount, Decimal::from(75));
    assert_eq!(debits[0].balance_after, Decimal::from(75));
    assert_eq!(debits[0].reference_id, Some(order.id));
    assert_eq!(debits[0].reference_kind, "ORDER");

    Ok(())
}

#[tokio::test]
async fn zero_charge_completion_is_free_and_unrecorded() -> anyhow::Result<()> {
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
            table_number: "T2".into(),
        },
    )
    .await?
    .data
    .unwrap();

    let order = order_service::place_order(
        &state,
        PlaceOrderRequest {
            table_id: table.id,
            guest_name: "Alice".into(),
            session_id: None,
            items: vec![LineItem {
                name: "tea".into(),
                price: Decimal::from(30),
                quantity: 1,
            }],
        },
    )
    .await?
    .data
    .unwrap()
    .order;

    // Charges default to zero, so completion succeeds on an empty wallet
    // and writes no ledger row.
    let completed = order_service::advance_status(
        &state,
        &manager,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Completed,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(completed.order_status, OrderStatus::Completed);

    let rows = WalletTransactions::find()
        .filter(TxnCol::HotelId.eq(hotel_id))
        .all(&state.orm)
        .await?;
    assert!(rows.is_empty());

    let wallet = wallet_service::get_wallet(&state, &manager)
        .await?
        .data
        .unwrap()
        .wallet;
    assert_eq!(wallet.balance, Decimal::ZERO);

    Ok(())
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
        hotel_name: Set("Wallet Hotel".into()),
        address: Set("2 Side St".into()),
        city: Set("Springfield".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(hotel.id)
}
