use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Best-effort observability log. Callers must never let a failure here
/// propagate into a state-mutating path; log a warning and move on.
pub async fn log_activity(
    pool: &DbPool,
    hotel_id: Option<Uuid>,
    actor_id: Option<Uuid>,
    activity_type: &str,
    description: &str,
    metadata: Option<Value>,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO activity_logs (id, hotel_id, actor_id, activity_type, description, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(hotel_id)
    .bind(actor_id)
    .bind(activity_type)
    .bind(description)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}
