//! Quarry query model (IR)
//!
//! Immutable description of one query against the warehouse's SQL dialect.
//! All types are deterministically serializable for caching and provenance.
//! Builders produce new `QuerySpec` values instead of mutating in place, so
//! partially built queries can be reused and shared across threads freely.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

mod types;
pub use types::*;

pub mod sql;
pub use sql::SqlError;

/// One query: ordered select list, source, joins, predicate, grouping,
/// ordering, row limit, and dialect flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub select: Vec<SelectItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<QuerySource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<Join>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Expr>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderKey>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,

    #[serde(default, skip_serializing_if = "QueryFlags::is_empty")]
    pub flags: QueryFlags,
}

impl QuerySpec {
    /// Render this spec to its canonical SQL text.
    pub fn to_sql(&self) -> Result<String, sql::SqlError> {
        sql::render(self)
    }

    /// Calculate fingerprint (SHA-256) for deterministic caching
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("query spec should always serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Query-wide dialect toggles, emitted as trailing clauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFlags {
    #[serde(default)]
    pub ignore_case: bool,
}

impl QueryFlags {
    pub fn is_empty(&self) -> bool {
        !self.ignore_case
    }
}

/// One projected output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    pub expr: Expr,

    /// Explicit output alias. When absent, member and enum expressions
    /// fall back to their bare name at render time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn named(alias: impl Into<String>, expr: Expr) -> Self {
        Self { expr, alias: Some(alias.into()) }
    }

    /// Output column name: the explicit alias, or the bare member / enum
    /// member name when one can be inferred.
    pub fn output_alias(&self) -> Option<&str> {
        if let Some(alias) = &self.alias {
            return Some(alias);
        }
        match &self.expr {
            Expr::Member { name, .. } => Some(name),
            Expr::Constant { value: Value::Enum { member, .. } } => Some(member),
            _ => None,
        }
    }
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        Self { expr, alias: None }
    }
}

/// Data source of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuerySource {
    Table {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
    Query {
        spec: Box<QuerySpec>,
        alias: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub source: QuerySource,
    pub kind: JoinKind,
    pub on: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBy {
    pub columns: Vec<Expr>,
    #[serde(default)]
    pub rollup: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderKey {
    pub expr: Expr,
    #[serde(default)]
    pub desc: bool,
}

/// Expression graph node. Nodes are immutable and may be shared across
/// `QuerySpec` versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    Constant {
        value: Value,
    },
    Member {
        #[serde(skip_serializing_if = "Option::is_none")]
        table: Option<String>,
        name: String,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    Func {
        name: String,
        args: Vec<Expr>,
    },
    Window {
        func: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Expr>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        partition_by: Vec<Expr>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        order_by: Vec<OrderKey>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    // Arithmetic
    Add, Sub, Mul, Div, Mod,
    // Comparison
    Eq, Ne, Lt, Le, Gt, Ge,
    // Logical
    And, Or,
    // String
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
}

/// Scalar literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Enumerated constant: renders as the underlying numeric value, the
    /// member name only ever serves as an inferred output alias.
    Enum { member: String, value: i64 },
    Timestamp(DateTime<FixedOffset>),
}

impl Value {
    pub fn enumerated(member: impl Into<String>, value: i64) -> Self {
        Value::Enum { member: member.into(), value }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(v)
    }
}

/// Unqualified member access: `col("title")` renders as `[title]`.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Member { table: None, name: name.into() }
}

/// Alias-qualified member access: `field("kp", "title")` renders as
/// `[kp.title]`.
pub fn field(table: impl Into<String>, name: impl Into<String>) -> Expr {
    Expr::Member { table: Some(table.into()), name: name.into() }
}

/// Constant expression from any literal value.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Constant { value: value.into() }
}

/// The null constant; comparisons against it lower to `IS [NOT] NULL`.
pub fn null_lit() -> Expr {
    Expr::Constant { value: Value::Null }
}

/// Function call by canonical name; names outside the dialect's fixed table
/// are rejected at render time.
pub fn func(name: impl Into<String>, args: Vec<Expr>) -> Expr {
    Expr::Func { name: name.into(), args }
}

/// Ternary conditional, rendered as `IF(test, when_true, when_false)`.
pub fn cond(test: Expr, when_true: impl Into<Expr>, when_false: impl Into<Expr>) -> Expr {
    Expr::Conditional {
        test: Box::new(test),
        when_true: Box::new(when_true.into()),
        when_false: Box::new(when_false.into()),
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Constant { value }
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        lit(v)
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Self {
        lit(i64::from(v))
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        lit(v)
    }
}

impl From<&str> for Expr {
    fn from(v: &str) -> Self {
        lit(v)
    }
}

impl From<String> for Expr {
    fn from(v: String) -> Self {
        lit(v)
    }
}

macro_rules! binary_combinator {
    ($(#[$doc:meta])* $name:ident => $op:ident) => {
        $(#[$doc])*
        pub fn $name(self, other: impl Into<Expr>) -> Expr {
            Expr::Binary {
                op: BinOp::$op,
                left: Box::new(self),
                right: Box::new(other.into()),
            }
        }
    };
}

impl Expr {
    binary_combinator!(eq => Eq);
    binary_combinator!(ne => Ne);
    binary_combinator!(lt => Lt);
    binary_combinator!(le => Le);
    binary_combinator!(gt => Gt);
    binary_combinator!(ge => Ge);
    binary_combinator!(and => And);
    binary_combinator!(or => Or);
    binary_combinator!(add => Add);
    binary_combinator!(sub => Sub);
    binary_combinator!(mul => Mul);
    binary_combinator!(div => Div);
    binary_combinator!(rem => Mod);
    binary_combinator!(
        /// Infix `CONTAINS`; unlike the other operators it renders without
        /// surrounding parentheses.
        contains => Contains
    );

    pub fn neg(self) -> Expr {
        Expr::Unary { op: UnOp::Neg, operand: Box::new(self) }
    }

    pub fn not(self) -> Expr {
        Expr::Unary { op: UnOp::Not, operand: Box::new(self) }
    }
}
