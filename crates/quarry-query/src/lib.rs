//! Quarry query frontend
//!
//! Fluent, non-mutating builder producing immutable [`quarry_ir::QuerySpec`]
//! values, plus the window-function builder and the dialect's named function
//! helpers. Every operation returns a fresh builder; the one it was called on
//! stays valid, so partially built queries can branch freely.

mod builder;
pub mod funcs;
mod validate;
mod window;

pub use builder::QueryBuilder;
pub use window::WindowBuilder;

use quarry_ir::sql::SqlError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Builder chain invoked out of order, or a single-specification clause
    /// given twice.
    #[error("invalid query configuration: {0}")]
    Configuration(String),

    /// A supplied value violates a structural constraint.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Sql(#[from] SqlError),
}
