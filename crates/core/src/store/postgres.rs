//! PostgreSQL-backed durable store.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use super::{DurableStore, StoreError};
use crate::record::ResultRecord;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS inference_results (
    id BIGSERIAL PRIMARY KEY,
    request_id TEXT NOT NULL,
    result TEXT NOT NULL
)";

/// Tables created by older deployments carry only `(request_id, result)`.
const ADD_ROW_ID: &str = "ALTER TABLE inference_results ADD COLUMN IF NOT EXISTS id BIGSERIAL";

const INSERT_ROW: &str = "INSERT INTO inference_results (request_id, result) VALUES ($1, $2) RETURNING id";

/// Connection parameters for [`PostgresStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            host: "postgresql-service".into(),
            port: 5432,
            user: "user".into(),
            password: "password".into(),
            database: "ollama".into(),
            max_connections: 5,
        }
    }
}

impl PgConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

/// [`DurableStore`] over a shared PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect a pool and make sure the results table exists.
    pub async fn connect(config: &PgConfig) -> Result<Self, StoreError> {
        tracing::debug!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "connecting to PostgreSQL"
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await
            .map_err(map_sqlx_error)?;

        let store = Self::from_pool(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an existing pool. The schema is not touched.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the results table, or give an existing two-column table a row id.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in [CREATE_TABLE, ADD_ROW_ID] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        }
        Ok(())
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db)
            if matches!(
                db.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            ) =>
        {
            StoreError::Constraint(err.to_string())
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}

#[async_trait]
impl DurableStore for PostgresStore {
    async fn insert(&self, record: &ResultRecord) -> Result<i64, StoreError> {
        let payload = record.payload_text()?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Dropping `tx` without commit rolls the insert back.
        let (id,): (i64,) = sqlx::query_as(INSERT_ROW)
            .bind(&record.request_id)
            .bind(&payload)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(|e| StoreError::Commit(e.to_string()))?;

        Ok(id)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
