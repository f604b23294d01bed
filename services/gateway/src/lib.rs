pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod sweeper;

// Re-exports for convenience
pub use errors::{ApiError, ApiResult};
pub use middleware::SessionAuth;
