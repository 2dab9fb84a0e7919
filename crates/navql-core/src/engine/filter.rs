//! Filter evaluation over rows of named values.
//!
//! Rows are entity rows for relation filters and flattened rows (keyed by
//! slot name) for caller filters. Field names match case-insensitively; a
//! missing field behaves like `Null`.

use navql_proto::{FilterExpr, SimpleFilter, Value};

/// Evaluates filter expressions against rows.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Check whether `row` satisfies `filter`.
    pub fn evaluate(filter: &FilterExpr, row: &[(String, Value)]) -> bool {
        match filter {
            FilterExpr::Eq { field, value } => Self::compare(row, field, value, Value::loose_eq),
            FilterExpr::Ne { field, value } => {
                Self::compare(row, field, value, |a, b| !a.loose_eq(b))
            }
            FilterExpr::Lt { field, value } => {
                Self::compare(row, field, value, |a, b| Self::ordered(a, b, |o| o.is_lt()))
            }
            FilterExpr::Le { field, value } => {
                Self::compare(row, field, value, |a, b| Self::ordered(a, b, |o| o.is_le()))
            }
            FilterExpr::Gt { field, value } => {
                Self::compare(row, field, value, |a, b| Self::ordered(a, b, |o| o.is_gt()))
            }
            FilterExpr::Ge { field, value } => {
                Self::compare(row, field, value, |a, b| Self::ordered(a, b, |o| o.is_ge()))
            }
            FilterExpr::In { field, values } => Self::is_in(row, field, values),
            FilterExpr::IsNull { field } => Self::field(row, field).is_null(),
            FilterExpr::IsNotNull { field } => !Self::field(row, field).is_null(),
            FilterExpr::Like { field, pattern } => Self::like(row, field, pattern),
            FilterExpr::And(filters) => filters.iter().all(|f| Self::evaluate_simple(f, row)),
            FilterExpr::Or(filters) => filters.iter().any(|f| Self::evaluate_simple(f, row)),
        }
    }

    fn evaluate_simple(filter: &SimpleFilter, row: &[(String, Value)]) -> bool {
        match filter {
            SimpleFilter::Eq { field, value } => Self::compare(row, field, value, Value::loose_eq),
            SimpleFilter::Ne { field, value } => {
                Self::compare(row, field, value, |a, b| !a.loose_eq(b))
            }
            SimpleFilter::Lt { field, value } => {
                Self::compare(row, field, value, |a, b| Self::ordered(a, b, |o| o.is_lt()))
            }
            SimpleFilter::Le { field, value } => {
                Self::compare(row, field, value, |a, b| Self::ordered(a, b, |o| o.is_le()))
            }
            SimpleFilter::Gt { field, value } => {
                Self::compare(row, field, value, |a, b| Self::ordered(a, b, |o| o.is_gt()))
            }
            SimpleFilter::Ge { field, value } => {
                Self::compare(row, field, value, |a, b| Self::ordered(a, b, |o| o.is_ge()))
            }
            SimpleFilter::In { field, values } => Self::is_in(row, field, values),
            SimpleFilter::IsNull { field } => Self::field(row, field).is_null(),
            SimpleFilter::IsNotNull { field } => !Self::field(row, field).is_null(),
            SimpleFilter::Like { field, pattern } => Self::like(row, field, pattern),
        }
    }

    /// Look up a field, `Null` when absent.
    pub fn field<'a>(row: &'a [(String, Value)], field: &str) -> &'a Value {
        static NULL: Value = Value::Null;
        row.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, v)| v)
            .unwrap_or(&NULL)
    }

    fn compare<F>(row: &[(String, Value)], field: &str, value: &Value, comparator: F) -> bool
    where
        F: FnOnce(&Value, &Value) -> bool,
    {
        comparator(Self::field(row, field), value)
    }

    fn ordered(a: &Value, b: &Value, test: fn(std::cmp::Ordering) -> bool) -> bool {
        a.partial_compare(b).map(test).unwrap_or(false)
    }

    fn is_in(row: &[(String, Value)], field: &str, values: &[Value]) -> bool {
        let value = Self::field(row, field);
        !value.is_null() && values.iter().any(|v| value.loose_eq(v))
    }

    fn like(row: &[(String, Value)], field: &str, pattern: &str) -> bool {
        match Self::field(row, field) {
            Value::String(s) => Self::like_match(s, pattern),
            _ => false,
        }
    }

    /// Match a string against a SQL LIKE pattern.
    ///
    /// `%` matches any run of characters, `_` exactly one; a backslash escapes
    /// the next pattern character.
    pub fn like_match(value: &str, pattern: &str) -> bool {
        let value: Vec<char> = value.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();
        Self::like_from(&value, &pattern)
    }

    fn like_from(value: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => value.is_empty(),
            Some(('%', rest)) => {
                (0..=value.len()).any(|skip| Self::like_from(&value[skip..], rest))
            }
            Some(('_', rest)) => !value.is_empty() && Self::like_from(&value[1..], rest),
            Some(('\\', rest)) => match (rest.split_first(), value.split_first()) {
                (Some((p, rest)), Some((c, tail))) if p == c => Self::like_from(tail, rest),
                _ => false,
            },
            Some((p, rest)) => match value.split_first() {
                Some((c, tail)) if c == p => Self::like_from(tail, rest),
                _ => false,
            },
        }
    }
}
