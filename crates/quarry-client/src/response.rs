//! Paged query results
//!
//! A [`QueryResponse`] is one decoded page plus enough state to pull the
//! next one from the same job. `fetch_all` drains the remaining pages and
//! never discards rows already received: a mid-stream failure is returned
//! alongside them.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::rows::{self, ParseOptions};
use crate::service::{JobReference, QueryPage, QueryService};
use crate::ClientError;

pub struct QueryResponse<T> {
    rows: Vec<T>,
    query: String,
    execution_time: Duration,
    page_number: u32,
    job: JobReference,
    job_complete: bool,
    page_token: Option<String>,
    total_rows: u64,
    total_bytes_processed: u64,
    cache_hit: bool,
    service: Arc<dyn QueryService>,
    options: ParseOptions,
    max_results: Option<u64>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for QueryResponse<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResponse")
            .field("rows", &self.rows)
            .field("query", &self.query)
            .field("execution_time", &self.execution_time)
            .field("page_number", &self.page_number)
            .field("job", &self.job)
            .field("job_complete", &self.job_complete)
            .field("page_token", &self.page_token)
            .field("total_rows", &self.total_rows)
            .field("total_bytes_processed", &self.total_bytes_processed)
            .field("cache_hit", &self.cache_hit)
            .field("options", &self.options)
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}

/// Everything `fetch_all` managed to collect. `error` is set when paging
/// stopped early.
pub struct PartialFetch<T> {
    pub rows: Vec<T>,
    pub error: Option<ClientError>,
}

impl<T: DeserializeOwned> QueryResponse<T> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_page(
        page: QueryPage,
        query: String,
        execution_time: Duration,
        page_number: u32,
        service: Arc<dyn QueryService>,
        options: ParseOptions,
        max_results: Option<u64>,
    ) -> Result<Self, ClientError> {
        let rows = if page.job_complete {
            rows::parse_rows(&page.schema, &page.rows, &options)?
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<T>, _>>()?
        } else {
            Vec::new()
        };
        Ok(Self {
            rows,
            query,
            execution_time,
            page_number,
            job: page.job,
            job_complete: page.job_complete,
            page_token: page.page_token,
            total_rows: page.total_rows,
            total_bytes_processed: page.total_bytes_processed,
            cache_hit: page.cache_hit,
            service,
            options,
            max_results,
        })
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    /// SQL text this response answers.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Time the initial submit took, including retries.
    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }

    /// 1-based page index within the job.
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn job(&self) -> &JobReference {
        &self.job
    }

    pub fn job_complete(&self) -> bool {
        self.job_complete
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    pub fn total_bytes_processed(&self) -> u64 {
        self.total_bytes_processed
    }

    pub fn cache_hit(&self) -> bool {
        self.cache_hit
    }

    pub fn has_next_page(&self) -> bool {
        self.page_token.is_some()
    }

    /// Fetch the next page of this job.
    pub async fn next_page(&self) -> Result<QueryResponse<T>, ClientError> {
        if !self.job_complete {
            return Err(ClientError::JobNotComplete {
                job_id: self.job.job_id.clone(),
            });
        }
        let Some(token) = self.page_token.as_deref() else {
            return Err(ClientError::NoMorePages);
        };
        let started = std::time::Instant::now();
        let page = self
            .service
            .next_page(&self.job, token, self.max_results)
            .await?;
        tracing::debug!(job_id = %self.job.job_id, rows = page.rows.len(), "fetched page");
        QueryResponse::from_page(
            page,
            self.query.clone(),
            started.elapsed(),
            self.page_number + 1,
            Arc::clone(&self.service),
            self.options.clone(),
            self.max_results,
        )
    }

    /// Drain this page and all remaining ones into a single row vector.
    pub async fn fetch_all(self) -> PartialFetch<T> {
        let mut rows = self.rows;
        let mut job = self.job;
        let mut job_complete = self.job_complete;
        let mut page_token = self.page_token;
        let service = self.service;
        let options = self.options;
        let max_results = self.max_results;

        loop {
            if !job_complete {
                return PartialFetch {
                    rows,
                    error: Some(ClientError::JobNotComplete { job_id: job.job_id }),
                };
            }
            let Some(token) = page_token.take() else {
                return PartialFetch { rows, error: None };
            };
            let page = match service.next_page(&job, &token, max_results).await {
                Ok(page) => page,
                Err(err) => return PartialFetch { rows, error: Some(err) },
            };
            let parsed = rows::parse_rows(&page.schema, &page.rows, &options)
                .and_then(|values| {
                    values
                        .into_iter()
                        .map(|value| serde_json::from_value(value).map_err(ClientError::from))
                        .collect::<Result<Vec<T>, _>>()
                });
            match parsed {
                Ok(mut next) => rows.append(&mut next),
                Err(err) => return PartialFetch { rows, error: Some(err) },
            }
            job = page.job;
            job_complete = page.job_complete;
            page_token = page.page_token;
        }
    }
}
