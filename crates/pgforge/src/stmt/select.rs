//! SELECT statement builder and the two-query pagination protocol.

use super::component::{ColumnComponent, JoinComponent, JoinType};
use super::{COMPONENT_SEPARATOR, SqlStatement, push_remark, sanitize_remark};
use crate::condition::GroupCondition;
use crate::engine::Engine;
use crate::error::{SqlError, SqlResult};
use crate::executor::SqlExecutor;
use crate::matrix::ResultMatrix;

/// Structured SELECT statement builder.
///
/// Clause emission order is fixed — optimizer hint, columns, FROM, WHERE,
/// GROUP BY, HAVING, ORDER BY, LIMIT/OFFSET, lock mode, trailing comment —
/// regardless of the order mutations were applied. Rendering never mutates
/// the builder; repeated [`SqlStatement::to_sql`] calls between mutations
/// yield byte-identical SQL.
///
/// All state is owned, so `Clone` produces a fully independent deep copy:
/// mutating a clone's condition tree never changes the original's rendered
/// SQL. The pagination protocol relies on this.
///
/// # Example
/// ```
/// use pgforge::{CompareOp, SelectStatement, SqlStatement};
///
/// let sql = SelectStatement::new()
///     .from("users")
///     .where_clause(|w| {
///         w.compare("age", CompareOp::Gte, 18)
///             .compare("status", CompareOp::Eq, "active");
///     })
///     .order_by_asc("id")
///     .limit(10)
///     .to_sql()
///     .unwrap();
/// assert_eq!(
///     sql,
///     "SELECT * FROM users WHERE (age >= 18 AND status = 'active') ORDER BY id LIMIT 10 OFFSET 0"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectStatement {
    /// FROM target at index 0, join fragments after it.
    tables: Vec<String>,
    columns: Vec<String>,
    where_group: GroupCondition,
    having_group: GroupCondition,
    group_keys: Vec<String>,
    sort_rules: Vec<String>,
    limit: u64,
    offset: u64,
    lock_mode: String,
    max_execution_time: Option<u64>,
    remark: String,
    build_error: Option<String>,
}

impl SelectStatement {
    /// Create an empty SELECT builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_error(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    // ==================== FROM and joins ====================

    /// Set the FROM table expression. A blank table is a generation error.
    pub fn from(self, table: &str) -> Self {
        self.from_target(table, None)
    }

    /// Set the FROM table expression with an alias.
    pub fn from_aliased(self, table: &str, alias: &str) -> Self {
        self.from_target(table, Some(alias))
    }

    /// Use a subquery as the FROM target. An alias is mandatory; the
    /// subquery renders in parentheses (recursive composition, no depth
    /// limit enforced here).
    pub fn from_subquery(mut self, subquery: &SelectStatement, alias: &str) -> Self {
        if alias.trim().is_empty() {
            self.record_error("Subquery without alias");
            return self;
        }
        match subquery.to_sql() {
            Ok(sql) => self.from_target(&format!("({sql})"), Some(alias)),
            Err(err) => {
                self.record_error(err.to_string());
                self
            }
        }
    }

    fn from_target(mut self, table: &str, alias: Option<&str>) -> Self {
        if table.trim().is_empty() {
            self.record_error("Select from blank table");
            return self;
        }
        let mut target = table.to_string();
        if let Some(alias) = alias {
            target.push_str(" AS ");
            target.push_str(alias);
        }
        if self.tables.is_empty() {
            self.tables.push(target);
        } else {
            self.tables[0] = target;
        }
        self
    }

    fn join(mut self, join_type: JoinType, f: impl FnOnce(JoinComponent) -> JoinComponent) -> Self {
        let join = f(JoinComponent::new(join_type));
        match join.render() {
            Ok(fragment) => self.tables.push(fragment),
            Err(err) => self.record_error(err.to_string()),
        }
        self
    }

    /// Append a LEFT JOIN configured by `f`.
    pub fn left_join(self, f: impl FnOnce(JoinComponent) -> JoinComponent) -> Self {
        self.join(JoinType::Left, f)
    }

    /// Append a RIGHT JOIN configured by `f`.
    pub fn right_join(self, f: impl FnOnce(JoinComponent) -> JoinComponent) -> Self {
        self.join(JoinType::Right, f)
    }

    /// Append an INNER JOIN configured by `f`.
    pub fn inner_join(self, f: impl FnOnce(JoinComponent) -> JoinComponent) -> Self {
        self.join(JoinType::Inner, f)
    }

    /// Append a FULL JOIN configured by `f`.
    pub fn full_join(self, f: impl FnOnce(JoinComponent) -> JoinComponent) -> Self {
        self.join(JoinType::Full, f)
    }

    // ==================== Select list ====================

    /// Clear the select list (falls back to `*`).
    pub fn reset_columns(mut self) -> Self {
        self.columns.clear();
        self
    }

    /// Append a column configured by `f`.
    pub fn column(mut self, f: impl FnOnce(ColumnComponent) -> ColumnComponent) -> Self {
        let column = f(ColumnComponent::new());
        match column.render() {
            Ok(fragment) => self.columns.push(fragment),
            Err(err) => self.record_error(err.to_string()),
        }
        self
    }

    /// Append an aliased column expression. Blank input is a generation
    /// error.
    pub fn column_with_alias(mut self, expression: &str, alias: &str) -> Self {
        if expression.trim().is_empty() || alias.trim().is_empty() {
            self.record_error("Column expression or alias is blank");
            return self;
        }
        self.columns
            .push(format!("{} AS {}", expression, crate::quote::quote_ident(alias)));
        self
    }

    /// Append a raw column expression.
    pub fn column_expr(mut self, expression: &str) -> Self {
        self.columns.push(expression.to_string());
        self
    }

    // ==================== WHERE / GROUP BY / HAVING ====================

    /// Mutate the root WHERE group through `f`.
    pub fn where_clause(mut self, f: impl FnOnce(&mut GroupCondition)) -> Self {
        f(&mut self.where_group);
        self
    }

    /// Append a GROUP BY key.
    pub fn group_by(mut self, key: &str) -> Self {
        self.group_keys.push(key.to_string());
        self
    }

    /// Append several GROUP BY keys.
    pub fn group_by_all(mut self, keys: &[&str]) -> Self {
        self.group_keys.extend(keys.iter().map(|k| k.to_string()));
        self
    }

    /// Mutate the HAVING group through `f`.
    pub fn having(mut self, f: impl FnOnce(&mut GroupCondition)) -> Self {
        f(&mut self.having_group);
        self
    }

    // ==================== Ordering, window, extras ====================

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

    /// Set LIMIT and reset OFFSET to zero.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self.offset = 0;
        self
    }

    /// Set LIMIT and OFFSET together.
    pub fn limit_offset(mut self, limit: u64, offset: u64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Set the lock mode appended after the window, e.g. `FOR UPDATE`.
    pub fn set_lock_mode(mut self, lock_mode: &str) -> Self {
        self.lock_mode = lock_mode.to_string();
        self
    }

    /// Set the advisory max-execution-time hint in milliseconds.
    ///
    /// Rendered as an optimizer hint comment preceding the column list;
    /// engines that do not recognize it treat it as a plain comment. Not
    /// enforced client-side.
    pub fn set_max_execution_time(mut self, milliseconds: u64) -> Self {
        self.max_execution_time = Some(milliseconds);
        self
    }

    /// Set a free-text trailing comment, newline-sanitized.
    pub fn set_remark(mut self, remark: &str) -> Self {
        self.remark = sanitize_remark(remark);
        self
    }

    fn first_error(&self) -> Option<&str> {
        self.build_error
            .as_deref()
            .or_else(|| self.where_group.first_error())
            .or_else(|| self.having_group.first_error())
    }

    // ==================== Execution ====================

    /// Render and execute this statement through `engine` on `conn`.
    pub async fn execute<E: SqlExecutor>(
        &self,
        engine: &Engine,
        conn: &E,
    ) -> SqlResult<ResultMatrix> {
        engine.execute(self, conn).await
    }

    /// Two-query pagination over this statement (`page_no` starts at 1).
    ///
    /// The receiver must represent "all matching rows in final order"; this
    /// method runs a COUNT(*) clone and a page-windowed clone concurrently
    /// and composes `{total, rows}`. The two queries are issued as
    /// independent asynchronous operations: they are point-in-time
    /// consistent with each other only if `conn` serializes them — wrap the
    /// call in a transaction when that matters.
    pub async fn execute_paginated<E: SqlExecutor>(
        &self,
        engine: &Engine,
        conn: &E,
        page_no: u64,
        page_size: u64,
    ) -> SqlResult<PaginationResult> {
        if page_size == 0 {
            return Err(SqlError::generate("Pagination page size must be positive"));
        }
        if page_no < 1 {
            return Err(SqlError::generate("Pagination page number starts at 1"));
        }
        let offset = (page_no - 1) * page_size;

        // Cost-bounding LIMIT only: the aggregate result is a single row,
        // so a window OFFSET would skip it on every page after the first.
        let count_statement = self
            .clone()
            .reset_columns()
            .column_with_alias("COUNT(*)", "total")
            .limit(page_size);
        let page_statement = self.clone().limit_offset(page_size, offset);

        let (count_matrix, matrix) = tokio::try_join!(
            engine.execute(&count_statement, conn),
            engine.execute(&page_statement, conn),
        )?;

        let total = count_matrix.first_row_i64("total")?.unwrap_or(0);
        Ok(PaginationResult { total, matrix })
    }
}

impl SqlStatement for SelectStatement {
    fn to_sql(&self) -> SqlResult<String> {
        if let Some(err) = self.first_error() {
            return Err(SqlError::generate(err.to_string()));
        }

        let mut sql = String::from("SELECT ");

        if let Some(ms) = self.max_execution_time {
            sql.push_str(&format!("/*+ MAX_EXECUTION_TIME({ms}) */"));
            sql.push_str(COMPONENT_SEPARATOR);
        }

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(","));
        }

        if !self.tables.is_empty() {
            sql.push_str(COMPONENT_SEPARATOR);
            sql.push_str("FROM ");
            sql.push_str(&self.tables.join(COMPONENT_SEPARATOR));
        }

        if !self.where_group.is_empty() {
            sql.push_str(COMPONENT_SEPARATOR);
            sql.push_str("WHERE ");
            sql.push_str(&self.where_group.render());
        }

        if !self.group_keys.is_empty() {
            sql.push_str(COMPONENT_SEPARATOR);
            sql.push_str("GROUP BY ");
            sql.push_str(&self.group_keys.join(","));
        }

        if !self.having_group.is_empty() {
            sql.push_str(COMPONENT_SEPARATOR);
            sql.push_str("HAVING ");
            sql.push_str(&self.having_group.render());
        }

        if !self.sort_rules.is_empty() {
            sql.push_str(COMPONENT_SEPARATOR);
            sql.push_str("ORDER BY ");
            sql.push_str(&self.sort_rules.join(","));
        }

        if self.limit > 0 {
            sql.push_str(COMPONENT_SEPARATOR);
            sql.push_str(&format!("LIMIT {} OFFSET {}", self.limit, self.offset));
        }

        if !self.lock_mode.is_empty() {
            sql.push_str(COMPONENT_SEPARATOR);
            sql.push_str(&self.lock_mode);
        }

        push_remark(&mut sql, &self.remark);
        Ok(sql)
    }
}

/// Composed result of the two-query pagination protocol.
#[derive(Debug)]
pub struct PaginationResult {
    /// Total matching rows, from the COUNT(*) query.
    pub total: i64,
    /// The requested page window.
    pub matrix: ResultMatrix,
}
