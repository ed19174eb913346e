pub mod active_table_service;
pub mod bill_service;
pub mod guest_access;
pub mod order_service;
pub mod table_service;
pub mod wallet_service;
