//! # Pulseboard
//!
//! Marketing analytics API: paginated and filterable views over influencer (KOL)
//! accounts, search-insight keywords, TikTok creators and products, ad campaigns,
//! private channel metrics and A/B test ideas.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulseboard::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let context = AppContext::new(config).await?;
//!
//!     let page = PageRequest::new(1, 20)?;
//!     let accounts = context.kol().list_accounts(&KolFilter::default(), page).await?;
//!     tracing::info!(total = accounts.total, "loaded KOL accounts");
//!
//!     let app = pulseboard::api::router(context.clone());
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod api;
pub mod core;
pub mod errors;
pub mod migration;
pub mod prelude;
pub mod services;

// Re-export the main public types for convenience
pub use core::AppContext;
pub use errors::PulseboardError;

// Re-export centralized config
pub use config::{AppConfig, CacheConfig, DatabaseConfig, ServerConfig};

// Re-export internal crates used in the public API
pub use cache_system;
pub use store_object;

// Re-export external dependencies used in public API
pub use async_trait;
