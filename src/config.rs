use std::env;

use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Tax rate applied to bill subtotals, in percent.
    pub tax_rate_percent: Decimal,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let tax_rate_percent = env::var("TAX_RATE_PERCENT")
            .ok()
            .and_then(|t| t.parse::<Decimal>().ok())
            .unwrap_or_else(|| Decimal::new(500, 2));
        Ok(Self {
            port,
            database_url,
            host,
            tax_rate_percent,
        })
    }
}
