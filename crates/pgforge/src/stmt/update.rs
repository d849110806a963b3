//! UPDATE statement builder.

use super::{COMPONENT_SEPARATOR, SqlStatement, push_remark, sanitize_remark};
use crate::condition::GroupCondition;
use crate::engine::Engine;
use crate::error::{SqlError, SqlResult};
use crate::executor::SqlExecutor;
use crate::matrix::ResultMatrix;
use crate::quote::SqlValue;

/// Structured UPDATE statement builder.
///
/// Assignments are kept in call order, duplicates included; the engine's
/// last-wins behavior applies. Rendering with no assignments or no table is
/// a generation error surfaced before any I/O.
#[derive(Debug, Clone, Default)]
pub struct UpdateStatement {
    table: String,
    ignore: bool,
    assignments: Vec<String>,
    where_group: GroupCondition,
    sort_rules: Vec<String>,
    limit: u64,
    remark: String,
    build_error: Option<String>,
}

impl UpdateStatement {
    /// Create an empty UPDATE builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_error(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    /// Set the target table. A blank table is a generation error.
    pub fn table(mut self, table: &str) -> Self {
        if table.trim().is_empty() {
            self.record_error("Update on blank table");
            return self;
        }
        self.table = table.to_string();
        self
    }

    /// Set the target table qualified with a schema.
    pub fn table_in_schema(mut self, schema: &str, table: &str) -> Self {
        if schema.trim().is_empty() || table.trim().is_empty() {
            self.record_error("Update on blank schema or table");
            return self;
        }
        self.table = format!("{schema}.{table}");
        self
    }

    /// Render with the conflict-tolerant modifier.
    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Assign `column = value`, value quoted as a literal.
    pub fn set_with_value(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        if column.trim().is_empty() {
            self.record_error("Assignment to blank column");
            return self;
        }
        self.assignments
            .push(format!("{} = {}", column, value.into().render()));
        self
    }

    /// Assign `column = expression`, expression emitted verbatim.
    pub fn set_with_expression(mut self, column: &str, expression: &str) -> Self {
        if column.trim().is_empty() || expression.trim().is_empty() {
            self.record_error("Assignment with blank column or expression");
            return self;
        }
        self.assignments.push(format!("{column} = {expression}"));
        self
    }

    /// Assign several `column = expression` pairs, in iteration order.
    pub fn set_with_expressions<C, E>(mut self, pairs: impl IntoIterator<Item = (C, E)>) -> Self
    where
        C: Into<String>,
        E: Into<String>,
    {
        for (column, expression) in pairs {
            self = self.set_with_expression(&column.into(), &expression.into());
        }
        self
    }

    /// Mutate the root WHERE group through `f`.
    pub fn where_clause(mut self, f: impl FnOnce(&mut GroupCondition)) -> Self {
        f(&mut self.where_group);
        self
    }

    /// Append an ascending ORDER BY key.
    pub fn order_by_asc(mut self, key: &str) -> Self {
        self.sort_rules.push(key.to_string());
        self
    }

    /// Append a descending ORDER BY key.
    pub fn order_by_desc(mut self, key: &str) -> Self {
        self.sort_rules.push(format!("{key} DESC"));
        self
    }

    /// Cap the number of rows updated.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Set a free-text trailing comment, newline-sanitized.
    pub fn set_remark(mut self, remark: &str) -> Self {
        self.remark = sanitize_remark(remark);
        self
    }

    fn first_error(&self) -> Option<String> {
        if let Some(err) = &self.build_error {
            return Some(err.clone());
        }
        if self.table.is_empty() {
            return Some("Update without table".to_string());
        }
        if self.assignments.is_empty() {
            return Some("Update without assignments".to_string());
        }
        self.where_group.first_error().map(str::to_string)
    }

    /// Render and execute this statement through `engine` on `conn`.
    pub async fn execute<E: SqlExecutor>(
        &self,
        engine: &Engine,
        conn: &E,
    ) -> SqlResult<ResultMatrix> {
        engine.execute(self, conn).await
    }

    /// Execute and report only the affected-row count.
    ///
    /// Degrades every failure — generation or execution — to `-1` after
    /// logging it, instead of propagating. Callers that need the error
    /// itself use [`UpdateStatement::execute`].
    pub async fn execute_for_affected_rows<E: SqlExecutor>(
        &self,
        engine: &Engine,
        conn: &E,
    ) -> i64 {
        match engine.execute(self, conn).await {
            Ok(matrix) => matrix.total_affected() as i64,
            Err(err) => {
                tracing::warn!(error = %err, "update failed, reporting -1 affected rows");
                -1
            }
        }
    }
}

impl SqlStatement for UpdateStatement {
    fn to_sql(&self) -> SqlResult<String> {
        if let Some(err) = self.first_error() {
            return Err(SqlError::generate(err));
        }

        let mut sql = String::from("UPDATE ");
        if self.ignore {
            sql.push_str("IGNORE ");
        }
        sql.push_str(&self.table);

        sql.push_str(COMPONENT_SEPARATOR);
        sql.push_str("SET ");
        sql.push_str(&self.assignments.join(", "));

        if !self.where_group.is_empty() {
            sql.push_str(COMPONENT_SEPARATOR);
            sql.push_str("WHERE ");
            sql.push_str(&self.where_group.render());
        }

        if !self.sort_rules.is_empty() {
            sql.push_str(COMPONENT_SEPARATOR);
            sql.push_str("ORDER BY ");
            sql.push_str(&self.sort_rules.join(","));
        }

        if self.limit > 0 {
            sql.push_str(COMPONENT_SEPARATOR);
            sql.push_str(&format!("LIMIT {}", self.limit));
        }

        push_remark(&mut sql, &self.remark);
        Ok(sql)
    }
}
