//! SQL quoting and literal escaping.
//!
//! This module is the single quoting point of truth: every builder routes
//! identifiers through [`quote_ident`] and literal values through
//! [`SqlValue`], so escaping logic never diverges between statement types.
//!
//! Conventions follow PostgreSQL: identifiers are double-quoted with `""`
//! escaping, string literals single-quoted with `''` escaping.

/// Quote an identifier (column, table, or schema name).
///
/// Embedded double quotes are doubled; NUL characters are stripped since
/// PostgreSQL identifiers cannot contain them.
///
/// # Example
/// ```
/// use pgforge::quote::quote_ident;
///
/// assert_eq!(quote_ident("users"), "\"users\"");
/// assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        match ch {
            '"' => out.push_str("\"\""),
            '\0' => {}
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Quote a string literal.
///
/// Embedded single quotes are doubled; NUL characters are stripped since
/// PostgreSQL text values cannot contain them.
pub fn quote_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\0' => {}
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

/// A dynamically-typed scalar value rendered as a SQL literal.
///
/// Builders accept `impl Into<SqlValue>` so call sites can pass plain Rust
/// scalars; rendering always goes through [`quote_literal`] for text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Boolean literal
    Bool(bool),
    /// Signed integer literal
    Int(i64),
    /// Floating point literal
    Float(f64),
    /// Text literal, escaped on render
    Text(String),
}

impl SqlValue {
    /// Render the value as a SQL literal fragment.
    pub fn render(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            SqlValue::Int(i) => i.to_string(),
            // NaN / infinity have no literal form; degrade to NULL.
            SqlValue::Float(f) if !f.is_finite() => "NULL".to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => quote_literal(s),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i8> for SqlValue {
    fn from(v: i8) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<u8> for SqlValue {
    fn from(v: u8) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<u16> for SqlValue {
    fn from(v: u16) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(v as f64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => SqlValue::Null,
        }
    }
}
