//! Statement builders: SELECT, UPDATE, and UNION.
//!
//! Each builder accumulates clauses through chained mutations and renders
//! SQL text through [`SqlStatement::to_sql`]. Rendering is a pure function
//! of the builder's state: between mutations, repeated calls yield
//! byte-identical SQL. Clause emission order is fixed regardless of the
//! order fields were set.

mod component;
mod select;
mod union;
mod update;

#[cfg(test)]
mod tests;

pub use component::{ColumnComponent, JoinComponent, JoinType};
pub use select::{PaginationResult, SelectStatement};
pub use union::UnionStatement;
pub use update::UpdateStatement;

use crate::error::SqlResult;

/// Separator between rendered clause components.
pub(crate) const COMPONENT_SEPARATOR: &str = " ";

/// A renderable SQL statement.
pub trait SqlStatement {
    /// Render the statement as SQL text.
    ///
    /// Fails with [`crate::SqlError::Generate`] when the builder captured a
    /// malformed mutation; the same state re-fails identically.
    fn to_sql(&self) -> SqlResult<String>;
}

/// Sanitize a trailing remark so it stays a single `--` comment line.
pub(crate) fn sanitize_remark(remark: &str) -> String {
    let mut out = String::with_capacity(remark.len());
    let mut in_break = false;
    for ch in remark.chars() {
        if ch == '\r' || ch == '\n' {
            if !in_break {
                out.push('¦');
                in_break = true;
            }
        } else {
            out.push(ch);
            in_break = false;
        }
    }
    out
}

/// Append the trailing remark comment, if any.
pub(crate) fn push_remark(sql: &mut String, remark: &str) {
    if !remark.is_empty() {
        sql.push_str("\n-- ");
        sql.push_str(remark);
        sql.push('\n');
    }
}
