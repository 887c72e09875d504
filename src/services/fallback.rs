//! Explicit degradation to demo data
//!
//! Services never hide a failed query. A caller that prefers a fixed dataset
//! over an error says so with [`OrFallback::or_fallback`], which logs the
//! failure before substituting the fallback.

use std::fmt::Display;
use tracing::warn;

pub trait OrFallback<T> {
    /// Return the value, or log the error under `context` and use `fallback`
    fn or_fallback(self, context: &str, fallback: impl FnOnce() -> T) -> T;
}

impl<T, E: Display> OrFallback<T> for Result<T, E> {
    fn or_fallback(self, context: &str, fallback: impl FnOnce() -> T) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                warn!(context, error = %e, "query failed, serving fallback data");
                fallback()
            }
        }
    }
}
