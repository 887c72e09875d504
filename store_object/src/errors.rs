use cache_system::CacheError;
use thiserror::Error;

/// SQLite primary result code for a locked database
const SQLITE_BUSY: i32 = 5;

/// Extended result codes keep the primary code in the low byte
fn is_busy_code(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| c & 0xff == SQLITE_BUSY)
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Error reported by the hosted database, message kept as received
    #[error("{message}")]
    Remote {
        message: String,
        code: Option<String>,
    },

    #[error("Query timed out after {0} ms")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl StoreError {
    /// Whether the failure means the database cannot serve requests right now
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Busy(_) | StoreError::Unavailable(_) | StoreError::Timeout(_)
        )
    }

    pub(crate) fn query_failed(context: &str, error: sqlx::Error) -> Self {
        let classified = StoreError::from(error);
        match classified {
            StoreError::DatabaseError(msg) => {
                StoreError::DatabaseError(format!("{}: {}", context, msg))
            }
            other => other,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) if is_busy_code(db.code().as_deref()) => {
                StoreError::Busy(db.message().to_string())
            }
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(error.to_string())
            }
            _ => StoreError::DatabaseError(error.to_string()),
        }
    }
}

impl From<crate::validation::ValidationError> for StoreError {
    fn from(error: crate::validation::ValidationError) -> Self {
        StoreError::ValidationError(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::SerializationError(error.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            StoreError::Unavailable(error.to_string())
        } else {
            StoreError::Remote {
                message: error.to_string(),
                code: error.status().map(|s| s.as_u16().to_string()),
            }
        }
    }
}
