use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::TableOverview;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTableRequest {
    pub table_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableList {
    pub items: Vec<TableOverview>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AccessQuery {
    pub guest_name: String,
}

/// Outcome of the guest-access check for the QR-scan page. A denied guest
/// still sees the menu, read-only.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccessReport {
    pub allowed: bool,
    pub view_only: bool,
    pub holder: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconcileReport {
    pub entries_closed: u64,
    pub tables_released: u64,
}
