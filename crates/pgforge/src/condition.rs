//! Condition tree for WHERE/HAVING/ON clauses.
//!
//! Predicates are one recursive tagged union: raw fragments, comparisons,
//! value-set membership ([`Condition::amongst`]) and AND/OR groups. Every
//! node renders to a SQL fragment; an empty group renders to the empty
//! string and the owning clause is omitted entirely.
//!
//! Groups are filled through mutator closures passed to the statement
//! builders:
//!
//! ```
//! use pgforge::{CompareOp, SelectStatement, SqlStatement};
//!
//! let sql = SelectStatement::new()
//!     .from("users")
//!     .where_clause(|w| {
//!         w.compare("age", CompareOp::Gte, 18)
//!             .compare("status", CompareOp::Eq, "active");
//!     })
//!     .to_sql()
//!     .unwrap();
//! assert!(sql.contains("WHERE (age >= 18 AND status = 'active')"));
//! ```

use crate::error::{SqlError, SqlResult};
use crate::quote::SqlValue;
use std::str::FromStr;

/// Boolean combinator joining the children of a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Junction {
    /// All children must hold.
    #[default]
    And,
    /// At least one child must hold.
    Or,
}

impl Junction {
    /// SQL keyword for this junction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Junction::And => "AND",
            Junction::Or => "OR",
        }
    }
}

/// Comparison operator for [`Condition::compare`] and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IS NULL`
    IsNull,
    /// `IS NOT NULL`
    IsNotNull,
    /// `IN (...)`
    In,
    /// `NOT IN (...)`
    NotIn,
    /// `BETWEEN a AND b`
    Between,
    /// `NOT BETWEEN a AND b`
    NotBetween,
}

/// How many operand values an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpArity {
    None,
    Single,
    Pair,
    List,
}

impl CompareOp {
    /// SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Like => "LIKE",
            CompareOp::NotLike => "NOT LIKE",
            CompareOp::IsNull => "IS NULL",
            CompareOp::IsNotNull => "IS NOT NULL",
            CompareOp::In => "IN",
            CompareOp::NotIn => "NOT IN",
            CompareOp::Between => "BETWEEN",
            CompareOp::NotBetween => "NOT BETWEEN",
        }
    }

    fn arity(&self) -> OpArity {
        match self {
            CompareOp::IsNull | CompareOp::IsNotNull => OpArity::None,
            CompareOp::Between | CompareOp::NotBetween => OpArity::Pair,
            CompareOp::In | CompareOp::NotIn => OpArity::List,
            _ => OpArity::Single,
        }
    }
}

impl FromStr for CompareOp {
    type Err = SqlError;

    /// Parse an operator string. Malformed strings fail fast with a
    /// generation error, before anything is rendered.
    fn from_str(s: &str) -> SqlResult<Self> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "=" => Ok(CompareOp::Eq),
            "!=" | "<>" => Ok(CompareOp::Ne),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Lte),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Gte),
            "LIKE" => Ok(CompareOp::Like),
            "NOT LIKE" => Ok(CompareOp::NotLike),
            "IS NULL" => Ok(CompareOp::IsNull),
            "IS NOT NULL" => Ok(CompareOp::IsNotNull),
            "IN" => Ok(CompareOp::In),
            "NOT IN" => Ok(CompareOp::NotIn),
            "BETWEEN" => Ok(CompareOp::Between),
            "NOT BETWEEN" => Ok(CompareOp::NotBetween),
            _ => Err(SqlError::generate(format!("Unknown operator: {s:?}"))),
        }
    }
}

/// Operand values carried by a comparison.
#[derive(Debug, Clone)]
enum ConditionValue {
    None,
    Single(SqlValue),
    Pair(SqlValue, SqlValue),
    List(Vec<SqlValue>),
}

/// Internal representation of a [`Condition`].
#[derive(Debug, Clone)]
enum ConditionInner {
    /// Verbatim SQL fragment, unescaped; the caller owns its correctness.
    Raw(String),
    /// `columnExpr op value(s)`.
    Compare {
        column: String,
        op: CompareOp,
        value: ConditionValue,
    },
    /// `columnExpr IN (v1, v2, ...)` over literal values.
    Amongst { column: String, values: Vec<SqlValue> },
    /// Nested AND/OR group.
    Group(GroupCondition),
}

/// One node of the condition tree.
#[derive(Debug, Clone)]
pub struct Condition(ConditionInner);

impl Condition {
    /// Create a raw SQL condition.
    ///
    /// # Safety
    /// The fragment is emitted verbatim; be careful with SQL injection.
    pub fn raw(fragment: impl Into<String>) -> Self {
        Condition(ConditionInner::Raw(fragment.into()))
    }

    /// Create a binary comparison: `column op value`.
    ///
    /// Fails fast when the column expression is blank or the operator does
    /// not take exactly one value (use [`Condition::between`],
    /// [`Condition::amongst`], or [`Condition::is_null`] for those).
    pub fn compare(
        column: impl Into<String>,
        op: CompareOp,
        value: impl Into<SqlValue>,
    ) -> SqlResult<Self> {
        let column = non_blank_column(column)?;
        if op.arity() != OpArity::Single {
            return Err(SqlError::generate(format!(
                "Operator {} does not take a single value",
                op.as_sql()
            )));
        }
        Ok(Condition(ConditionInner::Compare {
            column,
            op,
            value: ConditionValue::Single(value.into()),
        }))
    }

    /// Create an `IS NULL` check.
    pub fn is_null(column: impl Into<String>) -> SqlResult<Self> {
        let column = non_blank_column(column)?;
        Ok(Condition(ConditionInner::Compare {
            column,
            op: CompareOp::IsNull,
            value: ConditionValue::None,
        }))
    }

    /// Create an `IS NOT NULL` check.
    pub fn is_not_null(column: impl Into<String>) -> SqlResult<Self> {
        let column = non_blank_column(column)?;
        Ok(Condition(ConditionInner::Compare {
            column,
            op: CompareOp::IsNotNull,
            value: ConditionValue::None,
        }))
    }

    /// Create a `BETWEEN from AND to` range check.
    pub fn between(
        column: impl Into<String>,
        from: impl Into<SqlValue>,
        to: impl Into<SqlValue>,
    ) -> SqlResult<Self> {
        let column = non_blank_column(column)?;
        Ok(Condition(ConditionInner::Compare {
            column,
            op: CompareOp::Between,
            value: ConditionValue::Pair(from.into(), to.into()),
        }))
    }

    /// Create a `NOT BETWEEN from AND to` range check.
    pub fn not_between(
        column: impl Into<String>,
        from: impl Into<SqlValue>,
        to: impl Into<SqlValue>,
    ) -> SqlResult<Self> {
        let column = non_blank_column(column)?;
        Ok(Condition(ConditionInner::Compare {
            column,
            op: CompareOp::NotBetween,
            value: ConditionValue::Pair(from.into(), to.into()),
        }))
    }

    /// Create an `IN (...)` membership check over literal values.
    pub fn amongst<V: Into<SqlValue>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> SqlResult<Self> {
        let column = non_blank_column(column)?;
        Ok(Condition(ConditionInner::Amongst {
            column,
            values: values.into_iter().map(Into::into).collect(),
        }))
    }

    /// Create a `NOT IN (...)` membership check over literal values.
    pub fn not_amongst<V: Into<SqlValue>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> SqlResult<Self> {
        let column = non_blank_column(column)?;
        Ok(Condition(ConditionInner::Compare {
            column,
            op: CompareOp::NotIn,
            value: ConditionValue::List(values.into_iter().map(Into::into).collect()),
        }))
    }

    /// Wrap a group as a condition node.
    pub fn group(group: GroupCondition) -> Self {
        Condition(ConditionInner::Group(group))
    }

    /// Whether this node contributes anything to its parent clause.
    pub fn is_effective(&self) -> bool {
        match &self.0 {
            ConditionInner::Raw(s) => !s.trim().is_empty(),
            ConditionInner::Group(g) => !g.is_empty(),
            _ => true,
        }
    }

    /// Render this node as a SQL fragment. Empty groups render to `""`.
    pub fn render(&self) -> String {
        match &self.0 {
            ConditionInner::Raw(s) => s.clone(),
            ConditionInner::Compare { column, op, value } => match value {
                ConditionValue::None => format!("{} {}", column, op.as_sql()),
                ConditionValue::Single(v) => {
                    format!("{} {} {}", column, op.as_sql(), v.render())
                }
                ConditionValue::Pair(a, b) => {
                    format!("{} {} {} AND {}", column, op.as_sql(), a.render(), b.render())
                }
                ConditionValue::List(vals) => render_membership(
                    column,
                    op.as_sql(),
                    matches!(op, CompareOp::In),
                    vals,
                ),
            },
            ConditionInner::Amongst { column, values } => {
                render_membership(column, "IN", true, values)
            }
            ConditionInner::Group(g) => g.render(),
        }
    }

    /// First captured build error in this subtree, if any.
    pub(crate) fn first_error(&self) -> Option<&str> {
        match &self.0 {
            ConditionInner::Group(g) => g.first_error(),
            _ => None,
        }
    }
}

fn non_blank_column(column: impl Into<String>) -> SqlResult<String> {
    let column = column.into();
    if column.trim().is_empty() {
        return Err(SqlError::generate("Blank column expression in condition"));
    }
    Ok(column)
}

// An empty membership list has no valid SQL spelling; collapse to a constant
// predicate with the same truth table.
fn render_membership(column: &str, op: &str, positive: bool, values: &[SqlValue]) -> String {
    if values.is_empty() {
        return if positive { "1=0" } else { "1=1" }.to_string();
    }
    let rendered: Vec<String> = values.iter().map(SqlValue::render).collect();
    format!("{} {} ({})", column, op, rendered.join(","))
}

/// Ordered list of child conditions joined by one [`Junction`].
///
/// Mutator methods append children and return `&mut Self` for chaining
/// inside the closures passed to `where_clause`/`having`/`on_*`. Invalid
/// input (blank column, wrong operator arity) is captured into a build-error
/// slot at the call site and surfaced as [`SqlError::Generate`] when the
/// owning statement renders — never silently dropped, never at I/O time.
#[derive(Debug, Clone, Default)]
pub struct GroupCondition {
    junction: Junction,
    children: Vec<Condition>,
    build_error: Option<String>,
}

impl GroupCondition {
    /// Create an empty group with the given junction.
    pub fn new(junction: Junction) -> Self {
        Self {
            junction,
            children: Vec::new(),
            build_error: None,
        }
    }

    /// Create an empty AND group.
    pub fn for_and() -> Self {
        Self::new(Junction::And)
    }

    /// Create an empty OR group.
    pub fn for_or() -> Self {
        Self::new(Junction::Or)
    }

    fn push(&mut self, built: SqlResult<Condition>) -> &mut Self {
        match built {
            Ok(cond) => self.children.push(cond),
            Err(err) => {
                if self.build_error.is_none() {
                    self.build_error = Some(err.to_string());
                }
            }
        }
        self
    }

    /// Append a pre-built condition node.
    pub fn condition(&mut self, condition: Condition) -> &mut Self {
        self.children.push(condition);
        self
    }

    /// Append a raw SQL fragment.
    pub fn raw(&mut self, fragment: impl Into<String>) -> &mut Self {
        self.children.push(Condition::raw(fragment));
        self
    }

    /// Append a binary comparison: `column op value`.
    pub fn compare(
        &mut self,
        column: impl Into<String>,
        op: CompareOp,
        value: impl Into<SqlValue>,
    ) -> &mut Self {
        self.push(Condition::compare(column, op, value))
    }

    /// Append an `IN (...)` membership check.
    pub fn amongst<V: Into<SqlValue>>(
        &mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.push(Condition::amongst(column, values))
    }

    /// Append a `NOT IN (...)` membership check.
    pub fn not_amongst<V: Into<SqlValue>>(
        &mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.push(Condition::not_amongst(column, values))
    }

    /// Append a `BETWEEN from AND to` range check.
    pub fn between(
        &mut self,
        column: impl Into<String>,
        from: impl Into<SqlValue>,
        to: impl Into<SqlValue>,
    ) -> &mut Self {
        self.push(Condition::between(column, from, to))
    }

    /// Append a `NOT BETWEEN from AND to` range check.
    pub fn not_between(
        &mut self,
        column: impl Into<String>,
        from: impl Into<SqlValue>,
        to: impl Into<SqlValue>,
    ) -> &mut Self {
        self.push(Condition::not_between(column, from, to))
    }

    /// Append an `IS NULL` check.
    pub fn is_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.push(Condition::is_null(column))
    }

    /// Append an `IS NOT NULL` check.
    pub fn is_not_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.push(Condition::is_not_null(column))
    }

    /// Append a nested AND group filled by `f`.
    pub fn and_group(&mut self, f: impl FnOnce(&mut GroupCondition)) -> &mut Self {
        let mut group = GroupCondition::for_and();
        f(&mut group);
        self.children.push(Condition::group(group));
        self
    }

    /// Append a nested OR group filled by `f`.
    pub fn or_group(&mut self, f: impl FnOnce(&mut GroupCondition)) -> &mut Self {
        let mut group = GroupCondition::for_or();
        f(&mut group);
        self.children.push(Condition::group(group));
        self
    }

    /// Whether the group has no effective children.
    ///
    /// An empty group is "no constraint": it renders to `""` and the owning
    /// clause is omitted from the statement.
    pub fn is_empty(&self) -> bool {
        !self.children.iter().any(Condition::is_effective)
    }

    /// First build error captured in this group or any nested group.
    pub(crate) fn first_error(&self) -> Option<&str> {
        if let Some(err) = &self.build_error {
            return Some(err);
        }
        self.children.iter().find_map(Condition::first_error)
    }

    /// Render the group as a SQL fragment.
    ///
    /// Zero effective children render to `""`; a single child renders
    /// unwrapped (the parentheses would be redundant); more than one child
    /// renders parenthesized with the junction between children.
    pub fn render(&self) -> String {
        let parts: Vec<String> = self
            .children
            .iter()
            .filter(|c| c.is_effective())
            .map(Condition::render)
            .collect();
        match parts.len() {
            0 => String::new(),
            1 => parts.into_iter().next().unwrap_or_default(),
            _ => format!("({})", parts.join(&format!(" {} ", self.junction.as_sql()))),
        }
    }
}
