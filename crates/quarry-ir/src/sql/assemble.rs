//! Clause-ordered text assembly
//!
//! Fixed layout: SELECT, FROM, one INNER JOIN block per join, WHERE,
//! GROUP BY [ROLLUP], ORDER BY, LIMIT, IGNORE CASE. Nested subqueries render
//! recursively with one extra indentation level on every line.

use super::{expr, SqlError};
use crate::{GroupBy, Join, JoinKind, QuerySource, QuerySpec};

/// Render a query spec to its canonical SQL text (no trailing newline).
pub fn render(spec: &QuerySpec) -> Result<String, SqlError> {
    let mut out = String::new();
    render_query(spec, 0, &mut out)?;
    Ok(out)
}

fn line(out: &mut String, depth: usize, text: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(text);
}

fn render_query(spec: &QuerySpec, depth: usize, out: &mut String) -> Result<(), SqlError> {
    if spec.select.is_empty() {
        return Err(SqlError::MissingSelect);
    }

    line(out, depth, "SELECT");
    let last = spec.select.len() - 1;
    for (i, item) in spec.select.iter().enumerate() {
        let frag = expr::render(&item.expr, "SELECT")?;
        let mut text = frag.clone();
        if let Some(alias) = item.output_alias() {
            // A bare passthrough identifier needs no AS.
            if frag != format!("[{alias}]") {
                text.push_str(&format!(" AS [{alias}]"));
            }
        }
        if i != last {
            text.push(',');
        }
        line(out, depth + 1, &text);
    }

    // A bare projection has no FROM and nothing below it.
    let Some(source) = &spec.source else {
        return Ok(());
    };

    line(out, depth, "FROM");
    render_source(source, depth, out, None)?;

    for join in &spec.joins {
        render_join(join, depth, out)?;
    }

    if let Some(predicate) = &spec.predicate {
        line(out, depth, "WHERE");
        line(out, depth + 1, &expr::render(predicate, "WHERE")?);
    }

    if let Some(group) = &spec.group_by {
        render_group_by(group, depth, out)?;
    }

    if !spec.order_by.is_empty() {
        line(out, depth, "ORDER BY");
        let keys: Result<Vec<_>, _> = spec
            .order_by
            .iter()
            .map(|k| expr::order_key(k, "ORDER BY"))
            .collect();
        line(out, depth + 1, &keys?.join(", "));
    }

    if let Some(limit) = spec.limit {
        line(out, depth, &format!("LIMIT {limit}"));
    }

    if spec.flags.ignore_case {
        line(out, depth, "IGNORE CASE");
    }

    Ok(())
}

fn render_source(
    source: &QuerySource,
    depth: usize,
    out: &mut String,
    on: Option<&str>,
) -> Result<(), SqlError> {
    match source {
        QuerySource::Table { name, alias } => {
            let mut text = quote_table(name);
            if let Some(alias) = alias {
                text.push_str(&format!(" AS [{alias}]"));
            }
            if let Some(on) = on {
                text.push_str(&format!(" ON {on}"));
            }
            line(out, depth + 1, &text);
        }
        QuerySource::Query { spec, alias } => {
            line(out, depth, "(");
            render_query(spec, depth + 1, out)?;
            let mut text = format!(") AS [{alias}]");
            if let Some(on) = on {
                text.push_str(&format!(" ON {on}"));
            }
            line(out, depth, &text);
        }
    }
    Ok(())
}

fn render_join(join: &Join, depth: usize, out: &mut String) -> Result<(), SqlError> {
    match join.kind {
        JoinKind::Inner => line(out, depth, "INNER JOIN"),
    }
    let on = expr::render(&join.on, "JOIN")?;
    render_source(&join.source, depth, out, Some(&on))
}

fn render_group_by(group: &GroupBy, depth: usize, out: &mut String) -> Result<(), SqlError> {
    let last = group.columns.len().saturating_sub(1);

    if group.rollup {
        line(out, depth, "GROUP BY ROLLUP");
        line(out, depth, "(");
        for (i, column) in group.columns.iter().enumerate() {
            let mut text = expr::render(column, "GROUP BY")?;
            if i != last {
                text.push(',');
            }
            line(out, depth + 1, &text);
        }
        line(out, depth, ")");
    } else {
        line(out, depth, "GROUP BY");
        for (i, column) in group.columns.iter().enumerate() {
            let mut text = expr::render(column, "GROUP BY")?;
            if i != last {
                text.push(',');
            }
            line(out, depth + 1, &text);
        }
    }

    Ok(())
}

fn quote_table(name: &str) -> String {
    // Physical identifiers registered with brackets pass through verbatim.
    if name.starts_with('[') {
        name.to_string()
    } else {
        format!("[{name}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::col;

    fn spec() -> QuerySpec {
        QuerySpec {
            select: vec![col("title").into(), col("wp_namespace").into()],
            source: Some(QuerySource::Table {
                name: "tablewikipedia".to_string(),
                alias: None,
            }),
            predicate: Some(col("wp_namespace").eq(100)),
            ..Default::default()
        }
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let spec = spec();
        assert_eq!(render(&spec).unwrap(), render(&spec).unwrap());
    }

    #[test]
    fn test_missing_select_rejected() {
        let empty = QuerySpec::default();
        assert!(matches!(render(&empty).unwrap_err(), SqlError::MissingSelect));
    }

    #[test]
    fn test_bare_projection_omits_from_and_below() {
        let spec = QuerySpec {
            select: vec![crate::SelectItem::named("A", crate::lit("aaa"))],
            limit: Some(5),
            ..Default::default()
        };

        assert_eq!(render(&spec).unwrap(), "SELECT\n  'aaa' AS [A]");
    }

    #[test]
    fn test_registered_bracketed_names_pass_through() {
        assert_eq!(quote_table("[publicdata:samples.wikipedia]"), "[publicdata:samples.wikipedia]");
        assert_eq!(quote_table("tablewikipedia"), "[tablewikipedia]");
    }
}
