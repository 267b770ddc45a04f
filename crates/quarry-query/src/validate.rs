//! Member-access resolution against bound aliases and known schemas
//!
//! Qualified members must name an alias bound by a join; unqualified members
//! are checked against the source schema when the source came from the
//! registry. Sources without a schema skip field checks.

use std::collections::BTreeMap;

use quarry_ir::{Expr, Schema};

use crate::QueryError;

pub(crate) fn check_expr(
    expr: &Expr,
    source: Option<&Schema>,
    aliases: &BTreeMap<String, Option<Schema>>,
) -> Result<(), QueryError> {
    match expr {
        Expr::Member { table: Some(table), name } => match aliases.get(table) {
            None => Err(QueryError::Validation(format!("unknown source alias: {table}"))),
            Some(Some(schema)) if schema.find_field(name).is_none() => Err(
                QueryError::Validation(format!("unknown field {name} on source {table}")),
            ),
            _ => Ok(()),
        },
        Expr::Member { table: None, name } => {
            if let Some(schema) = source {
                if schema.find_field(name).is_none() {
                    return Err(QueryError::Validation(format!("unknown field: {name}")));
                }
            }
            Ok(())
        }
        Expr::Constant { .. } => Ok(()),
        Expr::Unary { operand, .. } => check_expr(operand, source, aliases),
        Expr::Binary { left, right, .. } => {
            check_expr(left, source, aliases)?;
            check_expr(right, source, aliases)
        }
        Expr::Conditional { test, when_true, when_false } => {
            check_expr(test, source, aliases)?;
            check_expr(when_true, source, aliases)?;
            check_expr(when_false, source, aliases)
        }
        Expr::Func { args, .. } => {
            for arg in args {
                check_expr(arg, source, aliases)?;
            }
            Ok(())
        }
        Expr::Window { args, partition_by, order_by, .. } => {
            for arg in args.iter().chain(partition_by) {
                check_expr(arg, source, aliases)?;
            }
            for key in order_by {
                check_expr(&key.expr, source, aliases)?;
            }
            Ok(())
        }
    }
}
