//! Connection abstraction: anything that can run rendered SQL text.

use std::future::Future;

use serde_json::Value;
use tokio_postgres::SimpleQueryMessage;

use crate::error::SqlResult;
use crate::matrix::TableRow;

/// Raw outcome of one SQL round trip, before matrix assembly.
#[derive(Debug, Clone, Default)]
pub struct RawRows {
    /// Fetched rows as column-name maps; text values as the wire returns
    /// them, SQL NULL as JSON null.
    pub rows: Vec<TableRow>,
    /// Command-completion affected count; zero for plain reads.
    pub affected: u64,
    /// Auto-generated key of the last insert, when reported.
    pub last_inserted_id: Option<i64>,
}

/// A connection-like value that can execute rendered SQL.
///
/// Implemented for direct clients, transactions, and pooled handles;
/// tests substitute scripted implementations.
pub trait SqlExecutor: Send + Sync {
    fn run_sql(&self, sql: &str) -> impl Future<Output = SqlResult<RawRows>> + Send;
}

fn collect_simple(messages: Vec<SimpleQueryMessage>) -> SqlResult<RawRows> {
    let mut raw = RawRows::default();
    for message in messages {
        match message {
            SimpleQueryMessage::Row(row) => {
                let mut table_row = TableRow::new();
                for (i, column) in row.columns().iter().enumerate() {
                    let value = match row.try_get(i)? {
                        Some(text) => Value::String(text.to_string()),
                        None => Value::Null,
                    };
                    table_row.insert(column.name().to_string(), value);
                }
                raw.rows.push(table_row);
            }
            SimpleQueryMessage::CommandComplete(n) => raw.affected = n,
            _ => {}
        }
    }
    Ok(raw)
}

impl SqlExecutor for tokio_postgres::Client {
    async fn run_sql(&self, sql: &str) -> SqlResult<RawRows> {
        collect_simple(self.simple_query(sql).await?)
    }
}

impl SqlExecutor for tokio_postgres::Transaction<'_> {
    async fn run_sql(&self, sql: &str) -> SqlResult<RawRows> {
        collect_simple(self.simple_query(sql).await?)
    }
}

#[cfg(feature = "pool")]
impl SqlExecutor for deadpool_postgres::Object {
    async fn run_sql(&self, sql: &str) -> SqlResult<RawRows> {
        collect_simple(self.simple_query(sql).await?)
    }
}

#[cfg(feature = "pool")]
impl SqlExecutor for deadpool_postgres::Transaction<'_> {
    async fn run_sql(&self, sql: &str) -> SqlResult<RawRows> {
        collect_simple(self.simple_query(sql).await?)
    }
}
