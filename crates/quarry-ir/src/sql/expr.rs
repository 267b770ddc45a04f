//! Expression lowering: one IR node to one SQL fragment
//!
//! Every binary operation is fully parenthesized; there is no precedence
//! elision anywhere. `clause` names the nearest enclosing clause and is only
//! used for error context.

use super::{literal, SqlError};
use crate::{BinOp, Expr, OrderKey, UnOp, Value};

/// Fixed dialect table of scalar and aggregate functions.
const FUNCTIONS: &[&str] = &[
    "ABS", "AVG", "COUNT", "GROUPING", "HASH", "LENGTH", "MAX", "MIN", "SUM",
];

/// Analytic functions permitted under `OVER (...)`.
const WINDOW_FUNCTIONS: &[&str] = &[
    "CUME_DIST", "DENSE_RANK", "LAG", "LEAD", "RANK", "ROW_NUMBER",
];

pub(crate) fn render(expr: &Expr, clause: &str) -> Result<String, SqlError> {
    match expr {
        Expr::Constant { value } => literal::format(value),
        Expr::Member { table, name } => Ok(member(table.as_deref(), name)),
        Expr::Unary { op, operand } => {
            let inner = render(operand, clause)?;
            Ok(match op {
                UnOp::Neg => format!("-{inner}"),
                UnOp::Not => format!("NOT ({inner})"),
            })
        }
        Expr::Binary { op, left, right } => render_binary(*op, left, right, clause),
        Expr::Conditional { test, when_true, when_false } => Ok(format!(
            "IF({}, {}, {})",
            render(test, clause)?,
            render(when_true, clause)?,
            render(when_false, clause)?
        )),
        Expr::Func { name, args } => {
            if !FUNCTIONS.contains(&name.as_str()) {
                return Err(SqlError::UnsupportedFunction(name.clone()));
            }
            Ok(format!("{name}({})", render_list(args, clause)?))
        }
        Expr::Window { func, args, partition_by, order_by } => {
            // Analytic calls are only valid as select items in this dialect.
            if clause != "SELECT" {
                return Err(SqlError::UnsupportedExpression {
                    kind: "window call".to_string(),
                    clause: clause.to_string(),
                });
            }
            render_window(func, args, partition_by, order_by)
        }
    }
}

/// Render one ORDER BY key, `expr` plus ` DESC` when descending.
pub(crate) fn order_key(key: &OrderKey, clause: &str) -> Result<String, SqlError> {
    let frag = render(&key.expr, clause)?;
    Ok(if key.desc { format!("{frag} DESC") } else { frag })
}

fn member(table: Option<&str>, name: &str) -> String {
    // The whole dotted path sits inside one pair of brackets.
    match table {
        Some(t) => format!("[{t}.{name}]"),
        None => format!("[{name}]"),
    }
}

fn render_binary(op: BinOp, left: &Expr, right: &Expr, clause: &str) -> Result<String, SqlError> {
    // Comparison against a literal null lowers to IS [NOT] NULL.
    if matches!(op, BinOp::Eq | BinOp::Ne) {
        let negated = op == BinOp::Ne;
        if is_null(right) {
            return null_test(left, negated, clause);
        }
        if is_null(left) {
            return null_test(right, negated, clause);
        }
    }

    let l = render(left, clause)?;
    let r = render(right, clause)?;

    if op == BinOp::Contains {
        // Infix, unparenthesized: `[word] CONTAINS 'th'`.
        return Ok(format!("{l} CONTAINS {r}"));
    }

    Ok(format!("({l} {} {r})", keyword(op)))
}

fn null_test(operand: &Expr, negated: bool, clause: &str) -> Result<String, SqlError> {
    let frag = render(operand, clause)?;
    Ok(if negated {
        format!("({frag} IS NOT NULL)")
    } else {
        format!("({frag} IS NULL)")
    })
}

fn keyword(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "=",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "AND",
        BinOp::Or => "OR",
        BinOp::Contains => "CONTAINS",
    }
}

fn is_null(expr: &Expr) -> bool {
    matches!(expr, Expr::Constant { value: Value::Null })
}

fn render_list(exprs: &[Expr], clause: &str) -> Result<String, SqlError> {
    let rendered: Result<Vec<_>, _> = exprs.iter().map(|e| render(e, clause)).collect();
    Ok(rendered?.join(", "))
}

fn render_window(
    func: &str,
    args: &[Expr],
    partition_by: &[Expr],
    order_by: &[OrderKey],
) -> Result<String, SqlError> {
    if !WINDOW_FUNCTIONS.contains(&func) {
        return Err(SqlError::UnsupportedFunction(func.to_string()));
    }

    let mut over = String::new();
    if !partition_by.is_empty() {
        over.push_str("PARTITION BY ");
        over.push_str(&render_list(partition_by, "SELECT")?);
    }
    if !order_by.is_empty() {
        if !over.is_empty() {
            over.push(' ');
        }
        over.push_str("ORDER BY ");
        let keys: Result<Vec<_>, _> = order_by.iter().map(|k| order_key(k, "SELECT")).collect();
        over.push_str(&keys?.join(", "));
    }

    Ok(format!("{func}({}) OVER ({over})", render_list(args, "SELECT")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{col, field, func, lit, null_lit, cond};

    #[test]
    fn test_member_access() {
        assert_eq!(render(&col("title"), "SELECT").unwrap(), "[title]");
        assert_eq!(render(&field("kp", "title"), "SELECT").unwrap(), "[kp.title]");
    }

    #[test]
    fn test_binary_always_parenthesized() {
        let expr = col("wp_namespace").eq(100);
        assert_eq!(render(&expr, "WHERE").unwrap(), "([wp_namespace] = 100)");

        let nested = col("year").ge(2000).and(col("year").le(2002));
        assert_eq!(
            render(&nested, "WHERE").unwrap(),
            "(([year] >= 2000) AND ([year] <= 2002))"
        );
    }

    #[test]
    fn test_null_comparison_lowering() {
        assert_eq!(
            render(&col("title").eq(null_lit()), "WHERE").unwrap(),
            "([title] IS NULL)"
        );
        assert_eq!(
            render(&col("title").ne(null_lit()), "WHERE").unwrap(),
            "([title] IS NOT NULL)"
        );
        assert_eq!(
            render(&null_lit().eq(col("title")), "WHERE").unwrap(),
            "([title] IS NULL)"
        );
    }

    #[test]
    fn test_contains_is_infix_unparenthesized() {
        let expr = col("word").contains("th");
        assert_eq!(render(&expr, "WHERE").unwrap(), "[word] CONTAINS 'th'");
    }

    #[test]
    fn test_conditional_renders_if() {
        let expr = cond(
            func("ABS", vec![func("HASH", vec![col("title")])]).rem(2).eq(1),
            "True",
            "False",
        );
        assert_eq!(
            render(&expr, "SELECT").unwrap(),
            "IF(((ABS(HASH([title])) % 2) = 1), 'True', 'False')"
        );
    }

    #[test]
    fn test_unknown_function_rejected() {
        let expr = func("FROBNICATE", vec![lit(1)]);
        let err = render(&expr, "SELECT").unwrap_err();
        assert!(matches!(err, SqlError::UnsupportedFunction(name) if name == "FROBNICATE"));
    }

    #[test]
    fn test_window_clauses() {
        let both = Expr::Window {
            func: "ROW_NUMBER".to_string(),
            args: vec![],
            partition_by: vec![col("corpus")],
            order_by: vec![OrderKey { expr: col("word_count"), desc: true }],
        };
        assert_eq!(
            render(&both, "SELECT").unwrap(),
            "ROW_NUMBER() OVER (PARTITION BY [corpus] ORDER BY [word_count] DESC)"
        );

        let empty = Expr::Window {
            func: "ROW_NUMBER".to_string(),
            args: vec![],
            partition_by: vec![],
            order_by: vec![],
        };
        assert_eq!(render(&empty, "SELECT").unwrap(), "ROW_NUMBER() OVER ()");
    }

    #[test]
    fn test_window_with_args() {
        let lag = Expr::Window {
            func: "LAG".to_string(),
            args: vec![col("word"), lit(1), lit("aaa")],
            partition_by: vec![col("corpus")],
            order_by: vec![],
        };
        assert_eq!(
            render(&lag, "SELECT").unwrap(),
            "LAG([word], 1, 'aaa') OVER (PARTITION BY [corpus])"
        );
    }

    #[test]
    fn test_window_outside_select_rejected() {
        let expr = Expr::Window {
            func: "ROW_NUMBER".to_string(),
            args: vec![],
            partition_by: vec![],
            order_by: vec![],
        };
        let err = render(&expr, "WHERE").unwrap_err();
        assert!(matches!(
            err,
            SqlError::UnsupportedExpression { ref kind, ref clause }
                if kind == "window call" && clause == "WHERE"
        ));
    }
}
