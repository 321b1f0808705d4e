// Windowed CSV - serves uploaded CSV files back in fixed-size windows

pub mod config;
pub mod middleware;
pub mod models;
pub mod records;
pub mod routes;
pub mod staging;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use records::Record;
pub use store::{CursorStore, StoreError};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
