use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Wallet, WalletTransaction};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RechargeRequest {
    /// Admins recharge any hotel; managers may omit this and recharge their own.
    pub hotel_id: Option<Uuid>,
    pub amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateChargesRequest {
    pub hotel_id: Uuid,
    pub per_verification_charge: Decimal,
    pub per_order_charge: Decimal,
}

/// Pre-flight answer for a gated operation. A zero configured charge is
/// always sufficient; metering is opt-in per hotel.
#[derive(Debug, Serialize, ToSchema)]
pub struct SufficiencyReport {
    pub sufficient: bool,
    pub charge: Decimal,
    pub balance: Decimal,
    pub shortfall: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletDetails {
    pub wallet: Wallet,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionList {
    pub items: Vec<WalletTransaction>,
}
