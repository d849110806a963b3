//! # pgforge
//!
//! Composable SQL statement construction and execution for PostgreSQL.
//!
//! Statements are built with fluent, owning builders over a nested
//! condition tree, rendered to full SQL text in a fixed clause order, and
//! executed through a small engine that audits every dispatch. Results
//! come back as a uniform [`ResultMatrix`] with typed row access.
//!
//! ```no_run
//! use pgforge::{CompareOp, Engine, SelectStatement, SqlStatement};
//!
//! # async fn demo(client: tokio_postgres::Client) -> pgforge::SqlResult<()> {
//! let engine = Engine::new();
//! let page = SelectStatement::new()
//!     .from("users")
//!     .where_clause(|w| {
//!         w.compare("status", CompareOp::Eq, "active");
//!     })
//!     .order_by_asc("id")
//!     .execute_paginated(&engine, &client, 1, 20)
//!     .await?;
//! println!("{} of {} users", page.matrix.total_fetched(), page.total);
//! # Ok(()) }
//! ```

pub mod audit;
pub mod condition;
pub mod engine;
pub mod error;
pub mod executor;
pub mod matrix;
#[cfg(feature = "pool")]
pub mod pool;
pub mod quote;
pub mod stmt;

pub use audit::{AuditSink, NoopAudit, StatementContext, StatementOutcome, TracingAudit};
pub use condition::{CompareOp, Condition, GroupCondition, Junction};
pub use engine::Engine;
pub use error::{SqlError, SqlResult};
pub use executor::{RawRows, SqlExecutor};
pub use matrix::{FromTableRow, ResultMatrix, TableRow};
#[cfg(feature = "pool")]
pub use pool::{PoolConfig, acquire, create_pool, create_pool_with_config};
pub use quote::{SqlValue, quote_ident, quote_literal};
pub use stmt::{
    ColumnComponent, JoinComponent, JoinType, PaginationResult, SelectStatement, SqlStatement,
    UnionStatement, UpdateStatement,
};
