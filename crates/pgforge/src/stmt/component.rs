//! Column and join value builders.
//!
//! These are the small components a [`super::SelectStatement`] consumes via
//! mutator closures: the closure receives a fresh component, configures it,
//! and returns it; the statement renders it to a fragment on append.

use crate::condition::{CompareOp, Condition, GroupCondition};
use crate::error::{SqlError, SqlResult};
use crate::quote::{SqlValue, quote_ident};

/// Join flavor for a [`JoinComponent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// `INNER JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `FULL JOIN`
    Full,
}

impl JoinType {
    /// SQL keyword for this join type.
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL JOIN",
        }
    }
}

/// One join clause: type, target table, optional alias, ON conditions.
///
/// ON conditions are joined with `AND`.
#[derive(Debug, Clone)]
pub struct JoinComponent {
    join_type: JoinType,
    table: Option<String>,
    alias: Option<String>,
    on_conditions: Vec<Condition>,
    build_error: Option<String>,
}

impl JoinComponent {
    pub(crate) fn new(join_type: JoinType) -> Self {
        Self {
            join_type,
            table: None,
            alias: None,
            on_conditions: Vec::new(),
            build_error: None,
        }
    }

    /// Set the joined table expression.
    pub fn table(mut self, table: &str) -> Self {
        if table.trim().is_empty() {
            self.record_error("Join with blank table");
        } else {
            self.table = Some(table.to_string());
        }
        self
    }

    /// Set the table alias.
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Add a raw ON condition.
    pub fn on_raw(mut self, fragment: &str) -> Self {
        self.on_conditions.push(Condition::raw(fragment));
        self
    }

    /// Add an ON comparison.
    pub fn on_compare(
        mut self,
        column: &str,
        op: CompareOp,
        value: impl Into<SqlValue>,
    ) -> Self {
        match Condition::compare(column, op, value) {
            Ok(cond) => self.on_conditions.push(cond),
            Err(err) => self.record_error(err.to_string()),
        }
        self
    }

    /// Add an ON condition as a nested AND group.
    pub fn on_and_group(mut self, f: impl FnOnce(&mut GroupCondition)) -> Self {
        let mut group = GroupCondition::for_and();
        f(&mut group);
        self.on_conditions.push(Condition::group(group));
        self
    }

    /// Add an ON condition as a nested OR group.
    pub fn on_or_group(mut self, f: impl FnOnce(&mut GroupCondition)) -> Self {
        let mut group = GroupCondition::for_or();
        f(&mut group);
        self.on_conditions.push(Condition::group(group));
        self
    }

    fn record_error(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    pub(crate) fn render(&self) -> SqlResult<String> {
        if let Some(err) = &self.build_error {
            return Err(SqlError::generate(err.clone()));
        }
        if let Some(err) = self.on_conditions.iter().find_map(|c| c.first_error()) {
            return Err(SqlError::generate(err.to_string()));
        }
        let table = self
            .table
            .as_deref()
            .ok_or_else(|| SqlError::generate("Join without table"))?;

        let mut out = format!("{} {}", self.join_type.as_sql(), table);
        if let Some(alias) = &self.alias {
            out.push_str(" AS ");
            out.push_str(alias);
        }
        let on: Vec<String> = self
            .on_conditions
            .iter()
            .filter(|c| c.is_effective())
            .map(Condition::render)
            .collect();
        if !on.is_empty() {
            out.push_str(" ON ");
            out.push_str(&on.join(" AND "));
        }
        Ok(out)
    }
}

/// One select-list entry: a quoted `schema.field`, or a free expression,
/// with an optional alias.
#[derive(Debug, Clone, Default)]
pub struct ColumnComponent {
    schema: Option<String>,
    field: Option<String>,
    expression: Option<String>,
    alias: Option<String>,
}

impl ColumnComponent {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Select a plain field; rendered quoted.
    pub fn field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    /// Select a schema-qualified field; both parts rendered quoted.
    pub fn field_in_schema(mut self, schema: &str, field: &str) -> Self {
        self.schema = Some(schema.to_string());
        self.field = Some(field.to_string());
        self
    }

    /// Select a free expression; rendered verbatim, overriding any field.
    pub fn expression(mut self, expression: &str) -> Self {
        self.expression = Some(expression.to_string());
        self
    }

    /// Alias for the entry; rendered quoted after `AS`.
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub(crate) fn render(&self) -> SqlResult<String> {
        let mut out = match (&self.expression, &self.field) {
            (Some(expr), _) => expr.clone(),
            (None, Some(field)) => match &self.schema {
                Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(field)),
                None => quote_ident(field),
            },
            (None, None) => {
                return Err(SqlError::generate("Column without field or expression"));
            }
        };
        if let Some(alias) = &self.alias {
            out.push_str(" AS ");
            out.push_str(&quote_ident(alias));
        }
        Ok(out)
    }
}
