//! UNION / UNION ALL composition over rendered selections.

use super::select::SelectStatement;
use super::{COMPONENT_SEPARATOR, SqlStatement, push_remark, sanitize_remark};
use crate::engine::Engine;
use crate::error::{SqlError, SqlResult};
use crate::executor::SqlExecutor;
use crate::matrix::ResultMatrix;

/// Chains rendered SELECT texts with `UNION` / `UNION ALL`.
///
/// Each selection is parenthesized; mixing distinct and all-duplicates
/// links within one chain is allowed and preserved in call order. Member
/// selections are captured as rendered text at append time, so later
/// mutations to a source [`SelectStatement`] do not affect the chain.
#[derive(Debug, Clone, Default)]
pub struct UnionStatement {
    /// Pre-joined fragments: `( sel )`, then ` UNION ( sel )` etc.
    selections: Vec<String>,
    remark: String,
    build_error: Option<String>,
}

impl UnionStatement {
    /// Start a chain from one selection.
    pub fn new(select: &SelectStatement) -> Self {
        Self::default().union(select)
    }

    /// Start a chain from raw SELECT text.
    pub fn from_raw(sql: &str) -> Self {
        Self::default().union_raw(sql)
    }

    fn record_error(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    fn push_selection(&mut self, sql: &str, all: bool) {
        if sql.trim().is_empty() {
            self.record_error("Union with blank selection");
            return;
        }
        let wrapped = format!("({COMPONENT_SEPARATOR}{sql}{COMPONENT_SEPARATOR})");
        if self.selections.is_empty() {
            self.selections.push(wrapped);
        } else if all {
            self.selections.push(format!(" UNION ALL {wrapped}"));
        } else {
            self.selections.push(format!(" UNION {wrapped}"));
        }
    }

    fn push_statement(mut self, select: &SelectStatement, all: bool) -> Self {
        match select.to_sql() {
            Ok(sql) => self.push_selection(&sql, all),
            Err(err) => self.record_error(err.to_string()),
        }
        self
    }

    /// Append a selection with duplicate elimination.
    pub fn union(self, select: &SelectStatement) -> Self {
        self.push_statement(select, false)
    }

    /// Append a selection keeping duplicates.
    pub fn union_all(self, select: &SelectStatement) -> Self {
        self.push_statement(select, true)
    }

    /// Append raw SELECT text with duplicate elimination.
    pub fn union_raw(mut self, sql: &str) -> Self {
        self.push_selection(sql, false);
        self
    }

    /// Append raw SELECT text keeping duplicates.
    pub fn union_all_raw(mut self, sql: &str) -> Self {
        self.push_selection(sql, true);
        self
    }

    /// Append every statement in `selects` with duplicate elimination.
    pub fn union_batch(mut self, selects: &[SelectStatement]) -> Self {
        for select in selects {
            self = self.union(select);
        }
        self
    }

    /// Append every statement in `selects` keeping duplicates.
    pub fn union_all_batch(mut self, selects: &[SelectStatement]) -> Self {
        for select in selects {
            self = self.union_all(select);
        }
        self
    }

    /// Set a free-text trailing comment, newline-sanitized.
    pub fn set_remark(mut self, remark: &str) -> Self {
        self.remark = sanitize_remark(remark);
        self
    }

    /// Render and execute this chain through `engine` on `conn`.
    pub async fn execute<E: SqlExecutor>(
        &self,
        engine: &Engine,
        conn: &E,
    ) -> SqlResult<ResultMatrix> {
        engine.execute(self, conn).await
    }
}

impl SqlStatement for UnionStatement {
    fn to_sql(&self) -> SqlResult<String> {
        if let Some(err) = &self.build_error {
            return Err(SqlError::generate(err.clone()));
        }
        if self.selections.is_empty() {
            return Err(SqlError::generate("Union without selections"));
        }
        let mut sql = self.selections.concat();
        push_remark(&mut sql, &self.remark);
        Ok(sql)
    }
}
