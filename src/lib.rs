// Core modules
pub mod aggregator;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

// Re-exports
pub use aggregator::{AggregationController, Session};
pub use config::{AggregatorConfig, AppConfig, TokenOwner};
pub use models::*;
pub use services::*;
pub use utils::*;
