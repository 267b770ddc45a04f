//! Wire-level service abstraction
//!
//! [`QueryService`] is the seam between the client and a concrete transport.
//! The wire types mirror the job-based result shape of the warehouse API:
//! every response carries a job reference, a completion flag, the result
//! schema, and at most one page of rows.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Identifies a query job so later pages can be fetched from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
}

/// One column of the result schema as declared on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireField {
    pub name: String,
    /// Wire type name: STRING, INTEGER, FLOAT, BOOLEAN, TIMESTAMP.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireSchema {
    pub fields: Vec<WireField>,
}

/// One result row. Cells arrive as strings in schema order; a missing cell
/// is a SQL NULL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireRow {
    pub cells: Vec<Option<String>>,
}

/// A single page of a job's results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPage {
    pub job: JobReference,
    pub job_complete: bool,
    pub schema: WireSchema,
    pub rows: Vec<WireRow>,
    pub total_rows: u64,
    /// Present when more pages follow.
    pub page_token: Option<String>,
    pub total_bytes_processed: u64,
    pub cache_hit: bool,
}

/// Transport to the query service. Implementations are expected to be cheap
/// to share behind an `Arc`.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Start a query job and return its first page.
    async fn submit(&self, sql: &str, max_results: Option<u64>)
        -> Result<QueryPage, ClientError>;

    /// Fetch a subsequent page of an existing job.
    async fn next_page(
        &self,
        job: &JobReference,
        page_token: &str,
        max_results: Option<u64>,
    ) -> Result<QueryPage, ClientError>;
}
