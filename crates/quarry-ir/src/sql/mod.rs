//! SQL text rendering for `QuerySpec`
//!
//! The rendered text is the wire artifact: exact clause order, indentation,
//! and identifier quoting are part of the contract and covered byte-for-byte
//! by tests. Rendering never mutates the spec and is deterministic.

mod assemble;
mod expr;
mod literal;

pub use assemble::render;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error("select clause not specified")]
    MissingSelect,

    #[error("unsupported expression ({kind}) in {clause} clause")]
    UnsupportedExpression { kind: String, clause: String },

    #[error("no SQL lowering for function: {0}")]
    UnsupportedFunction(String),

    #[error("no SQL literal form for {0} values")]
    UnsupportedLiteral(&'static str),
}
