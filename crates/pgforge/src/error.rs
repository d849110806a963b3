//! Error types for pgforge

use thiserror::Error;

/// Result type alias for pgforge operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Error types for statement generation and execution
#[derive(Debug, Error)]
pub enum SqlError {
    /// Statement generation error: the statement is malformed before any I/O
    /// (blank table, subquery without alias, invalid operator, ...).
    /// Rendering the same statement again fails identically.
    #[error("Generation error: {0}")]
    Generate(String),

    /// Row access on an empty or out-of-range result matrix.
    ///
    /// Distinct from a generation or execution failure: callers use it to
    /// tell "query succeeded but returned no such row" apart from
    /// "query failed".
    #[error("Row index {index} out of range for result matrix with {len} rows")]
    RowIndex { index: usize, len: usize },

    /// Database round trip failed (syntax rejected, constraint violation,
    /// connectivity loss, ...). The original cause is preserved.
    #[error("Execution error: {0}")]
    Execution(#[from] tokio_postgres::Error),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl SqlError {
    /// Create a statement generation error
    pub fn generate(message: impl Into<String>) -> Self {
        Self::Generate(message.into())
    }

    /// Create a row index error
    pub fn row_index(index: usize, len: usize) -> Self {
        Self::RowIndex { index, len }
    }

    /// Check if this is a generation error
    pub fn is_generate(&self) -> bool {
        matches!(self, Self::Generate(_))
    }

    /// Check if this is a row index error
    pub fn is_row_index(&self) -> bool {
        matches!(self, Self::RowIndex { .. })
    }

    /// Check if this is an execution error
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for SqlError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
