//! Window (analytic) function builder
//!
//! A small linear state machine: partition may be set at most once and must
//! precede ordering; ordering keys append. `finish` consumes the builder and
//! produces the immutable window node that gets attached to a select item,
//! so a spent builder cannot be reused.

use quarry_ir::{Expr, OrderKey};

use crate::QueryError;

#[derive(Debug)]
pub struct WindowBuilder {
    func: String,
    args: Vec<Expr>,
    state: State,
    partition_by: Vec<Expr>,
    order_by: Vec<OrderKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Partitioned,
    Ordered,
}

impl WindowBuilder {
    pub fn new(func: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            func: func.into(),
            args,
            state: State::Created,
            partition_by: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn partition_by(mut self, columns: Vec<Expr>) -> Result<Self, QueryError> {
        match self.state {
            State::Created => {
                self.partition_by = columns;
                self.state = State::Partitioned;
                Ok(self)
            }
            State::Partitioned => Err(QueryError::Configuration(
                "partition already specified".to_string(),
            )),
            State::Ordered => Err(QueryError::Configuration(
                "partition must precede ordering".to_string(),
            )),
        }
    }

    pub fn order_by(self, expr: Expr) -> Result<Self, QueryError> {
        self.first_key(expr, false)
    }

    pub fn order_by_desc(self, expr: Expr) -> Result<Self, QueryError> {
        self.first_key(expr, true)
    }

    fn first_key(mut self, expr: Expr, desc: bool) -> Result<Self, QueryError> {
        if self.state == State::Ordered {
            return Err(QueryError::Configuration(
                "ordering already specified; use then_by to add keys".to_string(),
            ));
        }
        self.order_by.push(OrderKey { expr, desc });
        self.state = State::Ordered;
        Ok(self)
    }

    pub fn then_by(self, expr: Expr) -> Result<Self, QueryError> {
        self.next_key(expr, false)
    }

    pub fn then_by_desc(self, expr: Expr) -> Result<Self, QueryError> {
        self.next_key(expr, true)
    }

    fn next_key(mut self, expr: Expr, desc: bool) -> Result<Self, QueryError> {
        if self.state != State::Ordered {
            return Err(QueryError::Configuration(
                "then_by requires a primary ordering".to_string(),
            ));
        }
        self.order_by.push(OrderKey { expr, desc });
        Ok(self)
    }

    /// Convert to the immutable window node.
    pub fn finish(self) -> Expr {
        Expr::Window {
            func: self.func,
            args: self.args,
            partition_by: self.partition_by,
            order_by: self.order_by,
        }
    }
}
