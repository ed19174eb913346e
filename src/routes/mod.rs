use axum::Router;

use crate::state::AppState;

pub mod bills;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod tables;
pub mod wallet;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/tables", tables::router())
        .nest("/orders", orders::router())
        .nest("/bills", bills::router())
        .nest("/wallet", wallet::router())
}
