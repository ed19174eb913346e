use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kitchen-side order lifecycle. Forward-only; `Completed` means served,
/// not paid. Payment is tracked separately on the bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Active,
    Preparing,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Active => "ACTIVE",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(OrderStatus::Active),
            "PREPARING" => Some(OrderStatus::Preparing),
            "COMPLETED" => Some(OrderStatus::Completed),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Active => 0,
            OrderStatus::Preparing => 1,
            OrderStatus::Completed => 2,
        }
    }

    /// Backward and repeated transitions are rejected.
    pub fn can_advance_to(&self, next: OrderStatus) -> bool {
        next.rank() > self.rank()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "PAID" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    Open,
    Completed,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Open => "OPEN",
            BillStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(BillStatus::Open),
            "COMPLETED" => Some(BillStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Active,
    Closed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Active => "ACTIVE",
            EntryStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(EntryStatus::Active),
            "CLOSED" => Some(EntryStatus::Closed),
            _ => None,
        }
    }
}

/// Which per-unit rate a wallet debit applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChargeKind {
    Verification,
    Order,
}

impl ChargeKind {
    pub fn reference_kind(&self) -> &'static str {
        match self {
            ChargeKind::Verification => "VERIFICATION",
            ChargeKind::Order => "ORDER",
        }
    }
}

/// One menu line on an order or bill. Items arrive already resolved from
/// the catalog; only price/quantity well-formedness is validated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DiningTable {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub table_number: String,
    pub status: String,
    pub current_session_id: Option<String>,
    pub current_guest_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Table row annotated with occupancy derived from the active-table
/// tracker, not the cached `status` column.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TableOverview {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub table_number: String,
    pub derived_status: String,
    pub current_guest_name: Option<String>,
    pub active_bill_id: Option<Uuid>,
    pub active_bill_number: Option<String>,
    pub active_bill_total: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TableOrder {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub table_id: Uuid,
    pub session_id: String,
    pub guest_name: Option<String>,
    pub items: Vec<LineItem>,
    pub total_amount: Decimal,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Bill {
    pub id: Uuid,
    pub bill_number: String,
    pub hotel_id: Uuid,
    pub table_id: Uuid,
    pub session_id: Option<String>,
    pub guest_name: Option<String>,
    pub hotel_name: String,
    pub hotel_address: String,
    pub table_number: String,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub bill_status: BillStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActiveTableEntry {
    pub id: Uuid,
    pub table_id: Uuid,
    pub bill_id: Option<Uuid>,
    pub hotel_id: Uuid,
    pub guest_name: Option<String>,
    pub session_id: Option<String>,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Wallet {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub balance: Decimal,
    pub per_verification_charge: Decimal,
    pub per_order_charge: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub direction: String,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub description: Option<String>,
    pub reference_kind: String,
    pub reference_id: Option<Uuid>,
    pub actor_kind: String,
    pub actor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_moves_forward_only() {
        assert!(OrderStatus::Active.can_advance_to(OrderStatus::Preparing));
        assert!(OrderStatus::Active.can_advance_to(OrderStatus::Completed));
        assert!(OrderStatus::Preparing.can_advance_to(OrderStatus::Completed));

        assert!(!OrderStatus::Preparing.can_advance_to(OrderStatus::Active));
        assert!(!OrderStatus::Completed.can_advance_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Completed.can_advance_to(OrderStatus::Completed));
    }

    #[test]
    fn order_status_round_trips_through_strings() {
        for status in [
            OrderStatus::Active,
            OrderStatus::Preparing,
            OrderStatus::Completed,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("SHIPPED"), None);
    }
}
