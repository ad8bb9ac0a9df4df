use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use sqlx::{
    pool::PoolConnection,
    postgres::{PgPool, PgPoolOptions},
    Error as SqlxError, Postgres,
};

mod error;
mod memory;
mod record;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use record::{Record, Value};
pub use store::{PgStore, Store};

pub type PostgresClient = Arc<dyn Client + Send + Sync>;

/// Pool sizing and timeouts for a service's single database.
///
/// `acquire_timeout` is the ceiling on how long a request waits for a free
/// connection before the store reports itself unavailable.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub statement_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(300), // Close idle connections after 5 minutes
            max_lifetime: Duration::from_secs(1800), // Force refresh every 30 minutes
        }
    }
}

/// A pool that hands out connections to the store.
#[async_trait]
pub trait Client {
    async fn get_connection(&self) -> Result<PoolConnection<Postgres>, StoreError>;

    fn get_pool_stats(&self) -> Option<PoolStats>;
}

#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub num_idle: usize,
}

/// Build the pool and open its first connection. Errors here are meant to be fatal.
pub async fn get_pool(url: &str, settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    let statement_ms = settings.statement_timeout.as_millis();

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .test_before_acquire(true)
        .idle_timeout(settings.idle_timeout)
        .max_lifetime(settings.max_lifetime)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                // SET does not accept bind parameters
                sqlx::query(&format!("SET statement_timeout = '{statement_ms}ms'"))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(url)
        .await
}

#[async_trait]
impl Client for PgPool {
    fn get_pool_stats(&self) -> Option<PoolStats> {
        Some(PoolStats {
            size: self.size(),
            num_idle: self.num_idle(),
        })
    }

    async fn get_connection(&self) -> Result<PoolConnection<Postgres>, StoreError> {
        let conn = self.acquire().await?;
        Ok(conn)
    }
}

/// Determines if a sqlx::Error is an integrity constraint violation (SQLSTATE class 23)
pub fn is_constraint_violation(error: &SqlxError) -> bool {
    match error {
        SqlxError::Database(db_error) => {
            // See: https://www.postgresql.org/docs/current/errcodes-appendix.html
            if let Some(code) = db_error.code() {
                code.starts_with("23")
            } else {
                let msg = db_error.message().to_lowercase();
                msg.contains("violates") && msg.contains("constraint")
            }
        }
        _ => false,
    }
}

/// Determines if a sqlx::Error represents a timeout-related failure
pub fn is_timeout_error(error: &SqlxError) -> bool {
    match error {
        // Pool acquisition timed out
        SqlxError::PoolTimedOut => true,

        // IO-level timeout (network/socket)
        SqlxError::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => true,

        SqlxError::Protocol(msg) => msg.to_lowercase().contains("timeout"),

        SqlxError::Database(db_error) => {
            if let Some(code) = db_error.code() {
                let code = code.as_ref();
                // 57014: query_canceled (statement_timeout)
                // 55P03: lock_not_available
                code == "57014" || code == "55P03"
            } else {
                let msg = db_error.message().to_lowercase();
                msg.contains("timeout") || msg.contains("canceling")
            }
        }

        _ => false,
    }
}

/// Determines if a sqlx::Error means the backend is unreachable or out of capacity
pub fn is_transient_error(error: &SqlxError) -> bool {
    match error {
        SqlxError::Io(_)
        | SqlxError::PoolTimedOut
        | SqlxError::PoolClosed
        | SqlxError::Tls(_) => true,

        SqlxError::Database(db_error) => {
            if let Some(code) = db_error.code() {
                let code = code.as_ref();

                // 08***  Connection Exception
                // 53***  Insufficient Resources
                // 57***  Operator Intervention
                // 58***  System Error
                // 40001  Serialization Failure
                // 40P01  Deadlock Detected
                code.starts_with("08")
                    || code.starts_with("53")
                    || code.starts_with("57")
                    || code.starts_with("58")
                    || code == "40001"
                    || code == "40P01"
            } else {
                let msg = db_error.message().to_lowercase();
                msg.contains("connection")
                    || msg.contains("timeout")
                    || msg.contains("timed out")
                    || msg.contains("terminating connection due to")
            }
        }

        SqlxError::Protocol(msg) => {
            let m = msg.to_lowercase();
            m.contains("connection") || m.contains("timeout")
        }

        _ => false,
    }
}
