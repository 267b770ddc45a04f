//! Fluent query builder
//!
//! Every operation takes `&self` and returns a new builder wrapping a new
//! `QuerySpec`; nothing is mutated in place. Chain-order violations surface
//! as `QueryError::Configuration`, structural violations as
//! `QueryError::Validation`.

use std::collections::BTreeMap;

use quarry_ir::{
    DataType, Expr, FieldType, GroupBy, Join, JoinKind, OrderKey, QuerySource, QuerySpec, Schema,
    SelectItem,
};
use quarry_registry::TableMapping;

use crate::validate;
use crate::QueryError;

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    spec: QuerySpec,
    /// Schema of the base source, when registry-backed. Used to validate
    /// unqualified member access.
    source_schema: Option<Schema>,
    /// Aliases bound by joins, each with its source schema when known.
    aliases: BTreeMap<String, Option<Schema>>,
}

impl QueryBuilder {
    /// A builder with no source: a bare projection. `from_*` attaches one.
    pub fn new() -> Self {
        Self::default()
    }

    /// Query a physical table by identifier. Identifiers already wrapped in
    /// `[...]` render verbatim, anything else is bracket-quoted.
    pub fn from_table(&self, name: impl Into<String>) -> Result<Self, QueryError> {
        self.set_source(QuerySource::Table { name: name.into(), alias: None }, None)
    }

    /// Query a registered table; its schema validates member access from
    /// here on.
    pub fn from_mapping(&self, mapping: &TableMapping) -> Result<Self, QueryError> {
        self.set_source(
            QuerySource::Table { name: mapping.table.clone(), alias: None },
            Some(mapping.schema.clone()),
        )
    }

    /// Query a nested query, rendered as a parenthesized, indented subquery.
    pub fn from_query(&self, inner: &QueryBuilder, alias: impl Into<String>) -> Result<Self, QueryError> {
        self.set_source(
            QuerySource::Query { spec: Box::new(inner.spec.clone()), alias: alias.into() },
            inner.output_schema(),
        )
    }

    fn set_source(&self, source: QuerySource, schema: Option<Schema>) -> Result<Self, QueryError> {
        if self.spec.source.is_some() {
            return Err(QueryError::Configuration("from already specified".to_string()));
        }
        let mut next = self.clone();
        next.spec.source = Some(source);
        next.source_schema = schema;
        Ok(next)
    }

    /// Add a predicate. Repeated calls conjoin with AND, left-associated in
    /// call order and never flattened.
    pub fn filter(&self, predicate: Expr) -> Result<Self, QueryError> {
        self.check(&predicate)?;
        let mut next = self.clone();
        next.spec.predicate = Some(match next.spec.predicate.take() {
            Some(previous) => previous.and(predicate),
            None => predicate,
        });
        Ok(next)
    }

    /// Set the projection. Only one select is permitted per chain.
    pub fn select(&self, items: Vec<SelectItem>) -> Result<Self, QueryError> {
        if !self.spec.select.is_empty() {
            return Err(QueryError::Configuration("select already specified".to_string()));
        }
        for item in &items {
            self.check(&item.expr)?;
        }
        let mut next = self.clone();
        next.spec.select = items;
        Ok(next)
    }

    /// Inner-join a nested query. Binds `outer_alias` to this query's source
    /// and `inner_alias` to the joined one; both become usable in subsequent
    /// predicate and select expressions.
    pub fn join(
        &self,
        inner: &QueryBuilder,
        outer_alias: impl Into<String>,
        inner_alias: impl Into<String>,
        on: Expr,
    ) -> Result<Self, QueryError> {
        let inner_alias = inner_alias.into();
        let source = QuerySource::Query {
            spec: Box::new(inner.spec.clone()),
            alias: inner_alias.clone(),
        };
        self.push_join(source, inner.output_schema(), outer_alias.into(), inner_alias, on)
    }

    /// Inner-join a bare table reference.
    pub fn join_table(
        &self,
        table: impl Into<String>,
        outer_alias: impl Into<String>,
        inner_alias: impl Into<String>,
        on: Expr,
    ) -> Result<Self, QueryError> {
        let inner_alias = inner_alias.into();
        let source = QuerySource::Table { name: table.into(), alias: Some(inner_alias.clone()) };
        self.push_join(source, None, outer_alias.into(), inner_alias, on)
    }

    fn push_join(
        &self,
        source: QuerySource,
        schema: Option<Schema>,
        outer_alias: String,
        inner_alias: String,
        on: Expr,
    ) -> Result<Self, QueryError> {
        let mut next = self.clone();
        match next.spec.source.as_mut() {
            None => {
                return Err(QueryError::Configuration("join requires a from source".to_string()))
            }
            Some(QuerySource::Table { alias, .. }) => match alias {
                Some(bound) if *bound != outer_alias => {
                    return Err(QueryError::Configuration(format!(
                        "outer alias already bound as {bound}"
                    )))
                }
                _ => *alias = Some(outer_alias.clone()),
            },
            Some(QuerySource::Query { alias, .. }) => {
                if *alias != outer_alias {
                    return Err(QueryError::Configuration(format!(
                        "outer alias already bound as {alias}"
                    )));
                }
            }
        }

        next.aliases.insert(outer_alias, self.source_schema.clone());
        next.aliases.insert(inner_alias, schema);
        // The ON predicate may refer to both sides, so bind aliases first.
        next.check(&on)?;
        next.spec.joins.push(Join { source, kind: JoinKind::Inner, on });
        Ok(next)
    }

    /// Group by the given columns. A later group-by replaces the previous
    /// one entirely (last wins).
    pub fn group_by(&self, columns: Vec<Expr>) -> Result<Self, QueryError> {
        self.set_group(columns, false)
    }

    /// Group with rollup subtotals.
    pub fn group_by_rollup(&self, columns: Vec<Expr>) -> Result<Self, QueryError> {
        self.set_group(columns, true)
    }

    fn set_group(&self, columns: Vec<Expr>, rollup: bool) -> Result<Self, QueryError> {
        for column in &columns {
            self.check(column)?;
        }
        let mut next = self.clone();
        next.spec.group_by = Some(GroupBy { columns, rollup });
        Ok(next)
    }

    /// Set the primary ordering key, ascending.
    pub fn order_by(&self, expr: Expr) -> Result<Self, QueryError> {
        self.first_order(expr, false)
    }

    /// Set the primary ordering key, descending.
    pub fn order_by_desc(&self, expr: Expr) -> Result<Self, QueryError> {
        self.first_order(expr, true)
    }

    fn first_order(&self, expr: Expr, desc: bool) -> Result<Self, QueryError> {
        if !self.spec.order_by.is_empty() {
            return Err(QueryError::Configuration(
                "ordering already specified; use then_by to add keys".to_string(),
            ));
        }
        self.push_order(expr, desc)
    }

    /// Append an ordering key, ascending. Requires a primary ordering.
    pub fn then_by(&self, expr: Expr) -> Result<Self, QueryError> {
        self.next_order(expr, false)
    }

    /// Append an ordering key, descending. Requires a primary ordering.
    pub fn then_by_desc(&self, expr: Expr) -> Result<Self, QueryError> {
        self.next_order(expr, true)
    }

    fn next_order(&self, expr: Expr, desc: bool) -> Result<Self, QueryError> {
        if self.spec.order_by.is_empty() {
            return Err(QueryError::Configuration(
                "then_by requires a primary ordering".to_string(),
            ));
        }
        self.push_order(expr, desc)
    }

    fn push_order(&self, expr: Expr, desc: bool) -> Result<Self, QueryError> {
        self.check(&expr)?;
        let mut next = self.clone();
        next.spec.order_by.push(OrderKey { expr, desc });
        Ok(next)
    }

    /// Cap the number of rows returned.
    pub fn limit(&self, limit: i64) -> Result<Self, QueryError> {
        if limit < 0 {
            return Err(QueryError::Validation(format!(
                "limit must be non-negative, got {limit}"
            )));
        }
        let mut next = self.clone();
        next.spec.limit = Some(limit);
        Ok(next)
    }

    /// Case-insensitive string comparison for the whole query.
    pub fn ignore_case(&self) -> Self {
        let mut next = self.clone();
        next.spec.flags.ignore_case = true;
        next
    }

    /// Render the wrapped spec to SQL text.
    pub fn to_sql(&self) -> Result<String, QueryError> {
        Ok(self.spec.to_sql()?)
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn into_spec(self) -> QuerySpec {
        self.spec
    }

    pub fn fingerprint(&self) -> String {
        self.spec.fingerprint()
    }

    fn check(&self, expr: &Expr) -> Result<(), QueryError> {
        validate::check_expr(expr, self.source_schema.as_ref(), &self.aliases)
    }

    /// Schema this query exposes to a consumer: the select aliases when a
    /// projection exists, otherwise the source schema.
    fn output_schema(&self) -> Option<Schema> {
        if self.spec.select.is_empty() {
            return self.source_schema.clone();
        }
        let fields = self
            .spec
            .select
            .iter()
            .filter_map(|item| item.output_alias())
            .map(|name| FieldType {
                name: name.to_string(),
                data_type: DataType::Unknown,
                nullable: true,
            })
            .collect();
        Some(Schema::new(fields))
    }
}
