use crate::config::DatabaseConfig;
use crate::domain::ports::{Warehouse, WarehouseSession};
use crate::utils::error::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::path::Path;
use std::time::Duration;

/// Postgres warehouse. Connects lazily, when a load opens its session.
#[derive(Debug, Clone)]
pub struct PgWarehouse {
    config: DatabaseConfig,
}

impl PgWarehouse {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    #[tracing::instrument(skip(self), fields(database_type = "postgresql"))]
    async fn open_session(&self) -> Result<Box<dyn WarehouseSession>> {
        tracing::info!("Connecting to PostgreSQL database");

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(self.config.connect_timeout_seconds))
            .connect(&self.config.url)
            .await?;
        let tx = pool.begin().await?;

        Ok(Box::new(PgSession { pool, tx: Some(tx) }))
    }
}

/// One connection, at most one open transaction. After a commit the next
/// statement begins a fresh transaction.
pub struct PgSession {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgSession {
    async fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => {
                tracing::debug!("Beginning warehouse transaction");
                self.pool.begin().await?
            }
        };
        Ok(self.tx.insert(tx))
    }
}

/// `COPY` statement for a CSV file with an optional header line.
pub fn copy_statement(table: &str, header: bool) -> String {
    format!(
        "COPY {} FROM STDIN WITH (FORMAT csv, HEADER {})",
        table,
        if header { "true" } else { "false" }
    )
}

#[async_trait]
impl WarehouseSession for PgSession {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        let tx = self.tx().await?;
        sqlx::Executor::execute(&mut **tx, sqlx::raw_sql(sql)).await?;
        Ok(())
    }

    async fn copy_csv(&mut self, table: &str, path: &Path, header: bool) -> Result<u64> {
        let data = tokio::fs::read(path).await?;
        tracing::debug!("Copying {} bytes from {} into {}", data.len(), path.display(), table);

        let tx = self.tx().await?;
        let mut copy = tx.copy_in_raw(&copy_statement(table, header)).await?;
        let sent = copy.send(data).await.map(|_| ());
        if let Err(e) = sent {
            let _ = copy.abort(e.to_string()).await;
            return Err(e.into());
        }
        let rows = copy.finish().await?;

        tracing::info!("Copied {} rows into {}", rows, table);
        Ok(rows)
    }

    async fn commit(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => {
                tx.commit().await?;
                tracing::debug!("Committed warehouse transaction");
            }
            None => tracing::debug!("Nothing to commit"),
        }
        Ok(())
    }
}
