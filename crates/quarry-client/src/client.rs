//! High-level query execution

use std::sync::Arc;

use quarry_ir::QuerySpec;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::response::QueryResponse;
use crate::retry::{self, RetryPolicy};
use crate::rows::ParseOptions;
use crate::service::QueryService;
use crate::ClientError;

/// Executes query specs against a [`QueryService`] with retry, paging, and
/// row decoding.
#[derive(Clone)]
pub struct QuarryClient {
    service: Arc<dyn QueryService>,
    retry: RetryPolicy,
    max_results: Option<u64>,
    options: ParseOptions,
}

impl QuarryClient {
    pub fn new(service: Arc<dyn QueryService>) -> Self {
        Self {
            service,
            retry: RetryPolicy::default(),
            max_results: None,
            options: ParseOptions::default(),
        }
    }

    pub fn from_config(service: Arc<dyn QueryService>, config: &ClientConfig) -> Self {
        Self {
            service,
            retry: config.retry,
            max_results: config.query.max_results,
            options: ParseOptions {
                type_overrides: Default::default(),
                utc_to_local: config.query.local_timestamps,
            },
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_results(mut self, max_results: u64) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Render `spec` to SQL and run it, returning the first page.
    pub async fn run<T: DeserializeOwned>(
        &self,
        spec: &QuerySpec,
        cancel: &CancellationToken,
    ) -> Result<QueryResponse<T>, ClientError> {
        let sql = spec.to_sql()?;
        tracing::debug!(fingerprint = %spec.fingerprint(), "submitting query");
        self.run_sql(&sql, cancel).await
    }

    /// Run already-rendered SQL text, returning the first page.
    pub async fn run_sql<T: DeserializeOwned>(
        &self,
        sql: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryResponse<T>, ClientError> {
        let started = std::time::Instant::now();
        let page = retry::with_retry(&self.retry, cancel, || {
            let service = Arc::clone(&self.service);
            let sql = sql.to_string();
            let max_results = self.max_results;
            async move { service.submit(&sql, max_results).await }
        })
        .await?;

        tracing::info!(
            job_id = %page.job.job_id,
            total_rows = page.total_rows,
            bytes_processed = page.total_bytes_processed,
            cache_hit = page.cache_hit,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query accepted"
        );
        QueryResponse::from_page(
            page,
            sql.to_string(),
            started.elapsed(),
            1,
            Arc::clone(&self.service),
            self.options.clone(),
            self.max_results,
        )
    }
}
