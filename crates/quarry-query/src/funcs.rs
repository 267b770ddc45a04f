//! Named function helpers for the warehouse dialect
//!
//! Scalar and aggregate helpers return plain expressions; analytic helpers
//! return a [`WindowBuilder`] to accumulate the `OVER (...)` specification.

use quarry_ir::{func, lit, Expr};

use crate::WindowBuilder;

pub fn abs(value: impl Into<Expr>) -> Expr {
    func("ABS", vec![value.into()])
}

pub fn hash(value: impl Into<Expr>) -> Expr {
    func("HASH", vec![value.into()])
}

pub fn count(value: impl Into<Expr>) -> Expr {
    func("COUNT", vec![value.into()])
}

pub fn length(value: impl Into<Expr>) -> Expr {
    func("LENGTH", vec![value.into()])
}

/// 1 for a rollup subtotal row, 0 for a regular group row.
pub fn grouping(value: impl Into<Expr>) -> Expr {
    func("GROUPING", vec![value.into()])
}

pub fn sum(value: impl Into<Expr>) -> Expr {
    func("SUM", vec![value.into()])
}

pub fn avg(value: impl Into<Expr>) -> Expr {
    func("AVG", vec![value.into()])
}

pub fn min(value: impl Into<Expr>) -> Expr {
    func("MIN", vec![value.into()])
}

pub fn max(value: impl Into<Expr>) -> Expr {
    func("MAX", vec![value.into()])
}

pub fn row_number() -> WindowBuilder {
    WindowBuilder::new("ROW_NUMBER", vec![])
}

pub fn rank() -> WindowBuilder {
    WindowBuilder::new("RANK", vec![])
}

pub fn dense_rank() -> WindowBuilder {
    WindowBuilder::new("DENSE_RANK", vec![])
}

pub fn cume_dist() -> WindowBuilder {
    WindowBuilder::new("CUME_DIST", vec![])
}

pub fn lag(value: impl Into<Expr>, offset: i64, default: impl Into<Expr>) -> WindowBuilder {
    WindowBuilder::new("LAG", vec![value.into(), lit(offset), default.into()])
}

pub fn lead(value: impl Into<Expr>, offset: i64, default: impl Into<Expr>) -> WindowBuilder {
    WindowBuilder::new("LEAD", vec![value.into(), lit(offset), default.into()])
}
