use axum_dinein_api::{config::AppConfig, db::create_pool};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let hotel_id = ensure_hotel(&pool, "Demo Hotel", "12 Lake Road", "Pune").await?;
    seed_tables(&pool, hotel_id).await?;
    seed_wallet(&pool, hotel_id).await?;

    println!("Seed completed. Hotel ID: {hotel_id}");
    Ok(())
}

async fn ensure_hotel(
    pool: &sqlx::PgPool,
    name: &str,
    address: &str,
    city: &str,
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM hotels WHERE hotel_name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO hotels (id, hotel_name, address, city)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(address)
    .bind(city)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_tables(pool: &sqlx::PgPool, hotel_id: Uuid) -> anyhow::Result<()> {
    for n in 1..=6 {
        sqlx::query(
            r#"
            INSERT INTO tables (id, hotel_id, table_number, status)
            VALUES ($1, $2, $3, 'AVAILABLE')
            ON CONFLICT (hotel_id, table_number) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(hotel_id)
        .bind(format!("T{n}"))
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_wallet(pool: &sqlx::PgPool, hotel_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO hotel_wallets (id, hotel_id, balance, per_verification_charge, per_order_charge)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (hotel_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(hotel_id)
    .bind(Decimal::from(1000))
    .bind(Decimal::ZERO)
    .bind(Decimal::new(150, 2))
    .execute(pool)
    .await?;
    Ok(())
}
