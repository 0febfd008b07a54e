use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::codec::{DecoderOptions, EncoderOptions};
use crate::error::SqlMiddlewareDbError;
use crate::executor::PreparedBatch;
use crate::pool::ConfigAndPool;
use crate::query::Query;
use crate::results::ResultSet;
use crate::template::TemplateCache;
use crate::types::DatabaseType;

/// Backend-neutral execution surface.
#[async_trait]
pub trait Database: Send + Sync {
    fn database_type(&self) -> DatabaseType;

    /// Execute a batch of queries in order on one connection.
    ///
    /// Every query is resolved before anything is sent. A statement failure
    /// stops the batch; statements already run are not rolled back.
    async fn execute(&self, queries: &[Query]) -> Result<(), SqlMiddlewareDbError>;

    async fn execute_one(&self, query: Query) -> Result<(), SqlMiddlewareDbError> {
        self.execute(std::slice::from_ref(&query)).await
    }

    /// Run a query and decode each returned row into `T`.
    async fn execute_as<T>(&self, query: Query) -> Result<Vec<T>, SqlMiddlewareDbError>
    where
        T: DeserializeOwned + Send;

    /// Run a query and return its rows undecoded.
    async fn fetch(&self, query: Query) -> Result<ResultSet, SqlMiddlewareDbError>;
}

/// [`Database`] over a [`ConfigAndPool`].
#[derive(Debug, Clone)]
pub struct MiddlewareDatabase {
    config_and_pool: ConfigAndPool,
    encoder: EncoderOptions,
    decoder: DecoderOptions,
    cache: Option<Arc<TemplateCache>>,
}

impl MiddlewareDatabase {
    #[must_use]
    pub fn new(config_and_pool: ConfigAndPool) -> Self {
        Self {
            config_and_pool,
            encoder: EncoderOptions::default(),
            decoder: DecoderOptions::default(),
            cache: Some(Arc::new(TemplateCache::default())),
        }
    }

    #[must_use]
    pub fn with_encoder(mut self, encoder: EncoderOptions) -> Self {
        self.encoder = encoder;
        self
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: DecoderOptions) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replace the template cache; `None` parses every template on use.
    #[must_use]
    pub fn with_cache(mut self, cache: Option<Arc<TemplateCache>>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn config_and_pool(&self) -> &ConfigAndPool {
        &self.config_and_pool
    }

    #[must_use]
    pub fn encoder(&self) -> &EncoderOptions {
        &self.encoder
    }

    #[must_use]
    pub fn decoder(&self) -> &DecoderOptions {
        &self.decoder
    }

    fn prepare(&self, queries: &[Query]) -> Result<PreparedBatch, SqlMiddlewareDbError> {
        PreparedBatch::resolve(
            self.config_and_pool.db_type,
            queries,
            &self.encoder,
            self.cache.as_deref(),
        )
    }

    /// Release the underlying pool.
    pub async fn shutdown(self) {
        self.config_and_pool.shutdown().await;
    }
}

#[async_trait]
impl Database for MiddlewareDatabase {
    fn database_type(&self) -> DatabaseType {
        self.config_and_pool.db_type
    }

    async fn execute(&self, queries: &[Query]) -> Result<(), SqlMiddlewareDbError> {
        let batch = self.prepare(queries)?;
        if batch.is_empty() {
            return Ok(());
        }
        self.config_and_pool
            .lease(|conn| async move {
                let affected = conn.run_prepared(batch).await?;
                tracing::debug!(affected, "executed batch");
                Ok::<(), SqlMiddlewareDbError>(())
            })
            .await
    }

    async fn execute_as<T>(&self, query: Query) -> Result<Vec<T>, SqlMiddlewareDbError>
    where
        T: DeserializeOwned + Send,
    {
        let result_set = self.fetch(query).await?;
        Ok(result_set.decode_all(&self.decoder)?)
    }

    async fn fetch(&self, query: Query) -> Result<ResultSet, SqlMiddlewareDbError> {
        let batch = self.prepare(std::slice::from_ref(&query))?;
        self.config_and_pool
            .lease(|conn| async move { conn.fetch_prepared(batch).await })
            .await
    }
}
