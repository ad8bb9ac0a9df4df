use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Postgres;
use tracing::{error, instrument};

use crate::record::{insert_statement, select_all_statement, select_one_statement};
use crate::{PostgresClient, Record, StoreError, Value};

/// Record operations a handler may perform. Implementations must tolerate
/// any number of concurrent callers.
#[async_trait]
pub trait Store<R: Record>: Send + Sync {
    /// Insert a new row and return it with its assigned identity.
    async fn insert_returning_id(&self, new: R::New) -> Result<R, StoreError>;

    /// Point lookup on `id`.
    async fn query_one(&self, id: i64) -> Result<Option<R>, StoreError>;

    /// Every row, ordered by ascending `id`.
    async fn query_many(&self) -> Result<Vec<R>, StoreError>;
}

/// Postgres-backed store. Each operation holds one pooled connection for its duration.
#[derive(Clone)]
pub struct PgStore {
    client: PostgresClient,
}

impl PgStore {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(Arc::new(pool))
    }
}

#[async_trait]
impl<R: Record> Store<R> for PgStore {
    #[instrument(name = "insert_returning_id", skip_all, fields(table = R::TABLE))]
    async fn insert_returning_id(&self, new: R::New) -> Result<R, StoreError> {
        let values = R::insert_values(&new);
        let columns: Vec<&str> = values.iter().map(|(column, _)| *column).collect();
        let sql = insert_statement(R::TABLE, &columns);

        let mut query = sqlx::query_scalar::<Postgres, i64>(&sql);
        for (_, value) in values {
            query = match value {
                Value::Int(v) => query.bind(v),
                Value::Text(v) => query.bind(v),
                Value::Timestamp(v) => query.bind(v),
            };
        }

        let mut conn = self.client.get_connection().await?;
        let id = query.fetch_one(&mut *conn).await.map_err(|e| {
            error!(table = R::TABLE, error = %e, "insert failed");
            StoreError::from(e)
        })?;

        Ok(R::from_new(id, new))
    }

    #[instrument(name = "query_one", skip(self), fields(table = R::TABLE))]
    async fn query_one(&self, id: i64) -> Result<Option<R>, StoreError> {
        let sql = select_one_statement(R::TABLE, R::COLUMNS);

        let mut conn = self.client.get_connection().await?;
        let row = sqlx::query_as::<Postgres, R>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                error!(table = R::TABLE, id, error = %e, "point lookup failed");
                StoreError::from(e)
            })?;

        Ok(row)
    }

    #[instrument(name = "query_many", skip_all, fields(table = R::TABLE))]
    async fn query_many(&self) -> Result<Vec<R>, StoreError> {
        let sql = select_all_statement(R::TABLE, R::COLUMNS);

        let mut conn = self.client.get_connection().await?;
        let rows = sqlx::query_as::<Postgres, R>(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                error!(table = R::TABLE, error = %e, "listing failed");
                StoreError::from(e)
            })?;

        Ok(rows)
    }
}
