use rust_decimal::Decimal;

use crate::db::{DbPool, OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    /// Bill tax rate in percent, from `AppConfig`.
    pub tax_rate: Decimal,
}
