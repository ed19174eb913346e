use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Bill, LineItem, OrderStatus, TableOrder};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub table_id: Uuid,
    pub guest_name: String,
    /// Present when the guest is adding to an existing visit.
    pub session_id: Option<String>,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedOrder {
    pub order: TableOrder,
    pub bill: Bill,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<TableOrder>,
}
