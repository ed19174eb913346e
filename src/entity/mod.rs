pub mod active_tables;
pub mod activity_logs;
pub mod bills;
pub mod hotel_wallets;
pub mod hotels;
pub mod table_orders;
pub mod tables;
pub mod wallet_transactions;

pub use active_tables::Entity as ActiveTables;
pub use activity_logs::Entity as ActivityLogs;
pub use bills::Entity as Bills;
pub use hotel_wallets::Entity as HotelWallets;
pub use hotels::Entity as Hotels;
pub use table_orders::Entity as TableOrders;
pub use tables::Entity as Tables;
pub use wallet_transactions::Entity as WalletTransactions;
