//! HTTP server for the CityLiving backend

pub mod error;
pub mod http;
pub mod state;

pub use error::ApiError;
pub use http::create_router;
pub use state::AppState;
