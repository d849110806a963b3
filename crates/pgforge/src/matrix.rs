//! Uniform query result container with typed, lenient accessors.

use serde_json::{Map, Value};

use crate::error::{SqlError, SqlResult};

/// One fetched row: column name to JSON value.
pub type TableRow = Map<String, Value>;

/// Uniform result of any executed statement.
///
/// Reads expose the fetched rows; writes expose the affected-row count.
/// Both are always present, zeroed when not applicable.
#[derive(Debug, Clone, Default)]
pub struct ResultMatrix {
    rows: Vec<TableRow>,
    total_affected: u64,
    last_inserted_id: Option<i64>,
}

impl ResultMatrix {
    pub fn new(rows: Vec<TableRow>, total_affected: u64, last_inserted_id: Option<i64>) -> Self {
        Self {
            rows,
            total_affected,
            last_inserted_id,
        }
    }

    /// Number of fetched rows.
    pub fn total_fetched(&self) -> usize {
        self.rows.len()
    }

    /// Rows affected by a write; zero for reads.
    pub fn total_affected(&self) -> u64 {
        self.total_affected
    }

    /// Auto-generated key of the last insert, when the engine reports one.
    pub fn last_inserted_id(&self) -> Option<i64> {
        self.last_inserted_id
    }

    /// All rows in fetch order.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Row at `index`, or a row-index error naming the position and bound.
    pub fn row_by_index(&self, index: usize) -> SqlResult<&TableRow> {
        self.rows
            .get(index)
            .ok_or_else(|| SqlError::row_index(index, self.rows.len()))
    }

    /// First row; a row-index error when the matrix is empty.
    pub fn first_row(&self) -> SqlResult<&TableRow> {
        self.row_by_index(0)
    }

    // ==================== Lenient scalar coercions ====================
    //
    // A missing column or JSON null yields Ok(None); a present value is
    // coerced from its text or native form where a lossless reading
    // exists, otherwise None.

    fn first_row_value(&self, column: &str) -> SqlResult<Option<&Value>> {
        let row = self.first_row()?;
        Ok(non_null(row.get(column)))
    }

    /// First row's `column` as text.
    pub fn first_row_string(&self, column: &str) -> SqlResult<Option<String>> {
        Ok(self.first_row_value(column)?.and_then(value_to_string))
    }

    /// First row's `column` as a 64-bit integer.
    pub fn first_row_i64(&self, column: &str) -> SqlResult<Option<i64>> {
        Ok(self.first_row_value(column)?.and_then(value_to_i64))
    }

    /// First row's `column` as a 32-bit integer.
    pub fn first_row_i32(&self, column: &str) -> SqlResult<Option<i32>> {
        Ok(self
            .first_row_value(column)?
            .and_then(value_to_i64)
            .and_then(|n| i32::try_from(n).ok()))
    }

    /// First row's `column` as a float.
    pub fn first_row_f64(&self, column: &str) -> SqlResult<Option<f64>> {
        Ok(self.first_row_value(column)?.and_then(value_to_f64))
    }

    /// `column` across every row, as text.
    pub fn column_string(&self, column: &str) -> Vec<Option<String>> {
        self.rows
            .iter()
            .map(|row| non_null(row.get(column)).and_then(value_to_string))
            .collect()
    }

    /// `column` across every row, as 32-bit integers.
    pub fn column_i32(&self, column: &str) -> Vec<Option<i32>> {
        self.rows
            .iter()
            .map(|row| {
                non_null(row.get(column))
                    .and_then(value_to_i64)
                    .and_then(|n| i32::try_from(n).ok())
            })
            .collect()
    }

    /// `column` across every row, as 64-bit integers.
    pub fn column_i64(&self, column: &str) -> Vec<Option<i64>> {
        self.rows
            .iter()
            .map(|row| non_null(row.get(column)).and_then(value_to_i64))
            .collect()
    }

    /// `column` across every row, as floats.
    pub fn column_f64(&self, column: &str) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|row| non_null(row.get(column)).and_then(value_to_f64))
            .collect()
    }

    // ==================== Typed row builders ====================

    /// Build a typed value from the row at `index`.
    pub fn build_row_by_index<T: FromTableRow>(&self, index: usize) -> SqlResult<T> {
        T::from_table_row(self.row_by_index(index)?)
    }

    /// Build a typed value from the first row.
    pub fn build_first_row<T: FromTableRow>(&self) -> SqlResult<T> {
        self.build_row_by_index(0)
    }

    /// Build typed values from every row, in fetch order.
    pub fn build_row_list<T: FromTableRow>(&self) -> SqlResult<Vec<T>> {
        self.rows.iter().map(T::from_table_row).collect()
    }

    /// Build a typed value from the row at `index` with a mapping function.
    pub fn build_row_by_index_with<T>(
        &self,
        index: usize,
        f: impl FnOnce(&TableRow) -> SqlResult<T>,
    ) -> SqlResult<T> {
        f(self.row_by_index(index)?)
    }

    /// Build a typed value from the first row with a mapping function.
    pub fn build_first_row_with<T>(
        &self,
        f: impl FnOnce(&TableRow) -> SqlResult<T>,
    ) -> SqlResult<T> {
        self.build_row_by_index_with(0, f)
    }

    /// Build typed values from every row with a mapping function, in fetch
    /// order.
    pub fn build_row_list_with<T>(
        &self,
        mut f: impl FnMut(&TableRow) -> SqlResult<T>,
    ) -> SqlResult<Vec<T>> {
        self.rows.iter().map(&mut f).collect()
    }

    /// All rows as a JSON array.
    pub fn to_json_array(&self) -> Value {
        Value::Array(self.rows.iter().cloned().map(Value::Object).collect())
    }
}

/// Materializes a typed row from a raw [`TableRow`].
pub trait FromTableRow: Sized {
    fn from_table_row(row: &TableRow) -> SqlResult<Self>;
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    match value {
        Some(Value::Null) | None => None,
        other => other,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ResultMatrix {
        let rows = vec![
            row(json!({"id": "1", "name": "alice", "score": "9.5"})),
            row(json!({"id": "2", "name": "bob", "score": null})),
        ];
        ResultMatrix::new(rows, 0, None)
    }

    fn row(value: Value) -> TableRow {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn row_index_error_names_position_and_bound() {
        let matrix = sample();
        let err = matrix.row_by_index(5).unwrap_err();
        assert!(err.is_row_index());
        assert_eq!(
            err.to_string(),
            "Row index 5 out of range for result matrix with 2 rows"
        );
    }

    #[test]
    fn first_row_on_empty_matrix_is_row_index_error() {
        let matrix = ResultMatrix::default();
        assert!(matrix.first_row().unwrap_err().is_row_index());
        assert!(matrix.first_row_i64("id").unwrap_err().is_row_index());
    }

    #[test]
    fn lenient_coercions() {
        let matrix = sample();
        assert_eq!(matrix.first_row_i64("id").unwrap(), Some(1));
        assert_eq!(matrix.first_row_f64("score").unwrap(), Some(9.5));
        assert_eq!(matrix.first_row_string("name").unwrap(), Some("alice".into()));
        assert_eq!(matrix.first_row_i64("name").unwrap(), None);
        assert_eq!(matrix.first_row_i64("missing").unwrap(), None);
    }

    #[test]
    fn column_accessors_keep_fetch_order_and_nulls() {
        let matrix = sample();
        assert_eq!(matrix.column_i64("id"), vec![Some(1), Some(2)]);
        assert_eq!(matrix.column_f64("score"), vec![Some(9.5), None]);
    }

    #[test]
    fn typed_row_building() {
        struct User {
            id: i64,
            name: String,
        }
        impl FromTableRow for User {
            fn from_table_row(row: &TableRow) -> SqlResult<Self> {
                Ok(User {
                    id: value_to_i64(row.get("id").unwrap_or(&Value::Null)).unwrap_or(0),
                    name: value_to_string(row.get("name").unwrap_or(&Value::Null))
                        .unwrap_or_default(),
                })
            }
        }

        let matrix = sample();
        let users: Vec<User> = matrix.build_row_list().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, 1);
        assert_eq!(users[1].name, "bob");
        let first: User = matrix.build_first_row().unwrap();
        assert_eq!(first.id, 1);
    }

    #[test]
    fn mapping_function_row_building() {
        let matrix = sample();
        let names = matrix
            .build_row_list_with(|row| {
                value_to_string(row.get("name").unwrap_or(&Value::Null))
                    .ok_or_else(|| SqlError::generate("name missing"))
            })
            .unwrap();
        assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);

        let first = matrix
            .build_first_row_with(|row| Ok(value_to_i64(row.get("id").unwrap_or(&Value::Null))))
            .unwrap();
        assert_eq!(first, Some(1));

        // Out-of-range index surfaces the row-index error, not the mapper's.
        let err = matrix
            .build_row_by_index_with(9, |_| Ok(()))
            .unwrap_err();
        assert!(err.is_row_index());
    }

    #[test]
    fn column_i32_mirrors_i64_with_narrowing() {
        let matrix = sample();
        assert_eq!(matrix.column_i32("id"), vec![Some(1), Some(2)]);
        assert_eq!(matrix.column_i32("score"), vec![None, None]);
    }

    #[test]
    fn json_array_projection() {
        let matrix = sample();
        let array = matrix.to_json_array();
        assert_eq!(array.as_array().unwrap().len(), 2);
        assert_eq!(array[1]["name"], json!("bob"));
    }
}
