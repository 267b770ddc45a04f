//! Asynchronous execution client
//!
//! Submits rendered SQL to a [`QueryService`], pages through job results,
//! and decodes wire rows into caller types. Transient service failures are
//! retried under a [`RetryPolicy`] and every wait point honors a
//! cancellation token.

pub mod client;
pub mod config;
pub mod logging;
pub mod response;
pub mod retry;
pub mod rows;
pub mod service;

pub use client::QuarryClient;
pub use config::ClientConfig;
pub use response::{PartialFetch, QueryResponse};
pub use retry::RetryPolicy;
pub use rows::ParseOptions;
pub use service::{JobReference, QueryPage, QueryService, WireField, WireRow, WireSchema};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote service rejected or failed the request.
    #[error("service error: {0}")]
    Service(String),

    /// Results were requested before the job finished running.
    #[error("job {job_id} has not completed")]
    JobNotComplete { job_id: String },

    /// `next_page` was called with no page token left.
    #[error("no more pages")]
    NoMorePages,

    /// Every attempt failed; carries the last failure.
    #[error("query failed after {attempts} attempts")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<ClientError>,
    },

    #[error("operation cancelled")]
    Cancelled,

    /// A wire cell could not be converted to its declared type.
    #[error("malformed cell for field {field}: {reason}")]
    Parse { field: String, reason: String },

    /// A decoded row did not match the caller's row type.
    #[error("row decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Sql(#[from] quarry_ir::SqlError),
}
