//! End-to-end client behavior against an in-memory service

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use quarry_client::{
    ClientError, JobReference, QuarryClient, QueryPage, QueryService, RetryPolicy, WireField,
    WireRow, WireSchema,
};

#[derive(Debug, Deserialize, PartialEq)]
struct WordCount {
    word: String,
    word_count: i64,
}

fn page(rows: &[(&str, i64)], token: Option<&str>, job_complete: bool) -> QueryPage {
    QueryPage {
        job: JobReference {
            project_id: "test-project".to_string(),
            job_id: "job-1".to_string(),
        },
        job_complete,
        schema: WireSchema {
            fields: vec![
                WireField { name: "word".to_string(), kind: "STRING".to_string() },
                WireField { name: "word_count".to_string(), kind: "INTEGER".to_string() },
            ],
        },
        rows: rows
            .iter()
            .map(|(word, count)| WireRow {
                cells: vec![Some(word.to_string()), Some(count.to_string())],
            })
            .collect(),
        total_rows: rows.len() as u64,
        page_token: token.map(str::to_string),
        total_bytes_processed: 1024,
        cache_hit: false,
    }
}

/// Serves a scripted sequence of responses; the first `submit_failures`
/// submits fail with a transient service error.
struct MockService {
    responses: Mutex<VecDeque<Result<QueryPage, ClientError>>>,
    submit_failures: AtomicU32,
    submits: AtomicU32,
}

impl MockService {
    fn new(responses: Vec<Result<QueryPage, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            submit_failures: AtomicU32::new(0),
            submits: AtomicU32::new(0),
        })
    }

    fn failing_first(self: Arc<Self>, failures: u32) -> Arc<Self> {
        self.submit_failures.store(failures, Ordering::SeqCst);
        self
    }

    fn next_response(&self) -> Result<QueryPage, ClientError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Service("script exhausted".to_string())))
    }
}

#[async_trait]
impl QueryService for MockService {
    async fn submit(&self, _sql: &str, _max: Option<u64>) -> Result<QueryPage, ClientError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let remaining = self.submit_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.submit_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ClientError::Service("transient".to_string()));
        }
        self.next_response()
    }

    async fn next_page(
        &self,
        _job: &JobReference,
        _token: &str,
        _max: Option<u64>,
    ) -> Result<QueryPage, ClientError> {
        self.next_response()
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy { attempts: 3, delay_ms: 1 }
}

#[tokio::test]
async fn test_single_page_rows_decode() {
    let service = MockService::new(vec![Ok(page(&[("the", 100), ("of", 50)], None, true))]);
    let client = QuarryClient::new(service).with_retry_policy(fast_retry());

    let response = client
        .run_sql::<WordCount>("SELECT 1", &CancellationToken::new())
        .await
        .unwrap();

    assert!(!response.has_next_page());
    assert_eq!(
        response.rows(),
        [
            WordCount { word: "the".to_string(), word_count: 100 },
            WordCount { word: "of".to_string(), word_count: 50 },
        ]
    );
}

#[tokio::test]
async fn test_fetch_all_accumulates_pages_in_order() {
    let service = MockService::new(vec![
        Ok(page(&[("a", 1)], Some("t1"), true)),
        Ok(page(&[("b", 2)], Some("t2"), true)),
        Ok(page(&[("c", 3)], None, true)),
    ]);
    let client = QuarryClient::new(service).with_retry_policy(fast_retry());

    let response = client
        .run_sql::<WordCount>("SELECT 1", &CancellationToken::new())
        .await
        .unwrap();
    assert!(response.has_next_page());

    let all = response.fetch_all().await;
    assert!(all.error.is_none());
    let words: Vec<&str> = all.rows.iter().map(|r| r.word.as_str()).collect();
    assert_eq!(words, ["a", "b", "c"]);
}

#[tokio::test]
async fn test_fetch_all_keeps_rows_on_midstream_failure() {
    let service = MockService::new(vec![
        Ok(page(&[("a", 1)], Some("t1"), true)),
        Err(ClientError::Service("page fetch failed".to_string())),
    ]);
    let client = QuarryClient::new(service).with_retry_policy(fast_retry());

    let response = client
        .run_sql::<WordCount>("SELECT 1", &CancellationToken::new())
        .await
        .unwrap();

    let all = response.fetch_all().await;
    assert_eq!(all.rows.len(), 1);
    assert!(matches!(all.error, Some(ClientError::Service(_))));
}

#[tokio::test]
async fn test_next_page_without_token_fails() {
    let service = MockService::new(vec![Ok(page(&[("a", 1)], None, true))]);
    let client = QuarryClient::new(service).with_retry_policy(fast_retry());

    let response = client
        .run_sql::<WordCount>("SELECT 1", &CancellationToken::new())
        .await
        .unwrap();

    let err = response.next_page().await.unwrap_err();
    assert!(matches!(err, ClientError::NoMorePages));
}

#[tokio::test]
async fn test_incomplete_job_blocks_paging() {
    let service = MockService::new(vec![Ok(page(&[], Some("t1"), false))]);
    let client = QuarryClient::new(service).with_retry_policy(fast_retry());

    let response = client
        .run_sql::<WordCount>("SELECT 1", &CancellationToken::new())
        .await
        .unwrap();

    assert!(!response.job_complete());
    assert!(response.rows().is_empty());
    let err = response.next_page().await.unwrap_err();
    assert!(matches!(err, ClientError::JobNotComplete { job_id } if job_id == "job-1"));
}

#[tokio::test]
async fn test_submit_retries_transient_failures() {
    let service = MockService::new(vec![Ok(page(&[("a", 1)], None, true))]).failing_first(2);
    let client = QuarryClient::new(Arc::clone(&service) as Arc<dyn QueryService>)
        .with_retry_policy(fast_retry());

    let response = client
        .run_sql::<WordCount>("SELECT 1", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.rows().len(), 1);
    assert_eq!(service.submits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_submit_retry_exhaustion() {
    let service = MockService::new(vec![]).failing_first(10);
    let client = QuarryClient::new(Arc::clone(&service) as Arc<dyn QueryService>)
        .with_retry_policy(fast_retry());

    let err = client
        .run_sql::<WordCount>("SELECT 1", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::RetryExhausted { attempts: 3, .. }));
    assert_eq!(service.submits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_cancelled_token_aborts_submit() {
    let service = MockService::new(vec![Ok(page(&[("a", 1)], None, true))]);
    let client = QuarryClient::new(service).with_retry_policy(fast_retry());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client
        .run_sql::<WordCount>("SELECT 1", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
}
