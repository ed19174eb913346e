use sea_orm::{EntityTrait, TransactionTrait};
use uuid::Uuid;

use crate::{
    dto::tables::AccessReport,
    entity::{Tables, bills},
    error::{AppError, AppResult},
    models::ChargeKind,
    response::{ApiResponse, Meta},
    services::{bill_service, wallet_service},
    state::AppState,
};

/// Whether a guest may place orders at a table. This is the sole gate
/// keeping two unrelated guests from interleaving orders into one bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Ordering permitted. `session_id` is the open bill's session when the
    /// guest is returning (or adopting an orphaned bill), `None` for a
    /// fresh occupancy.
    Allow { session_id: Option<String> },
    /// Another guest holds the table's open bill; menu is view-only.
    DenyViewOnly { holder: String },
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Pure decision over the table's open bill, if any. Callers placing orders
/// must re-evaluate this inside the same transaction that inserts the order,
/// against the locked bill row, since a second guest could scan between the
/// QR check and the order submit.
pub fn evaluate(open_bill: Option<&bills::Model>, guest_name: &str) -> AccessDecision {
    let Some(bill) = open_bill else {
        return AccessDecision::Allow { session_id: None };
    };

    let holder = bill.guest_name.as_deref().unwrap_or("");
    if holder.trim().is_empty() {
        // Orphaned bill with no guest recorded. The next guest adopts it
        // rather than stranding an unpaid OPEN bill next to a new one.
        return AccessDecision::Allow {
            session_id: bill.session_id.clone(),
        };
    }

    if normalize(holder) == normalize(guest_name) {
        AccessDecision::Allow {
            session_id: bill.session_id.clone(),
        }
    } else {
        AccessDecision::DenyViewOnly {
            holder: holder.to_string(),
        }
    }
}

/// QR-scan verification. Grants access per `evaluate` and debits the
/// hotel's per-verification charge when access is granted; a denied guest
/// costs nothing. The decision here is advisory; the binding check happens
/// inside `order_service::place_order` against the locked bill row.
pub async fn verify(
    state: &AppState,
    table_id: Uuid,
    guest_name: &str,
) -> AppResult<ApiResponse<AccessReport>> {
    let guest_name = guest_name.trim();
    if guest_name.is_empty() {
        return Err(AppError::BadRequest("Guest name is required".into()));
    }

    let txn = state.orm.begin().await?;

    let table = Tables::find_by_id(table_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let open_bill = bill_service::open_bill_for_table(&txn, table.id).await?;

    let report = match evaluate(open_bill.as_ref(), guest_name) {
        AccessDecision::Allow { session_id } => {
            wallet_service::debit(&txn, table.hotel_id, ChargeKind::Verification, Some(table.id))
                .await?;
            AccessReport {
                allowed: true,
                view_only: false,
                holder: None,
                session_id,
            }
        }
        AccessDecision::DenyViewOnly { holder } => AccessReport {
            allowed: false,
            view_only: true,
            holder: Some(holder),
            session_id: None,
        },
    };

    txn.commit().await?;

    Ok(ApiResponse::success("Ok", report, Some(Meta::empty())))
}
