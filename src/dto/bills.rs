use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Bill;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SettlePaymentRequest {
    pub payment_method: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BillList {
    pub items: Vec<Bill>,
}
