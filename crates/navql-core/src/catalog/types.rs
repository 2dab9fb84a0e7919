//! Scalar type definitions for the catalog.

use navql_proto::Value;

/// Scalar data types an entity property can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Timestamp (microseconds since Unix epoch).
    Timestamp,
    /// UUID (128-bit identifier).
    Uuid,
}

impl ScalarType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Int32 | ScalarType::Int64 | ScalarType::Float64
        )
    }

    /// The zero/default value of this type.
    ///
    /// Projections fill every scalar that was not requested with this value.
    pub fn default_value(&self) -> Value {
        match self {
            ScalarType::Bool => Value::Bool(false),
            ScalarType::Int32 => Value::Int32(0),
            ScalarType::Int64 => Value::Int64(0),
            ScalarType::Float64 => Value::Float64(0.0),
            ScalarType::String => Value::String(String::new()),
            ScalarType::Timestamp => Value::Timestamp(0),
            ScalarType::Uuid => Value::Uuid([0; 16]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_types() {
        assert!(ScalarType::Int32.is_numeric());
        assert!(ScalarType::Float64.is_numeric());
        assert!(!ScalarType::String.is_numeric());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(ScalarType::Int32.default_value(), Value::Int32(0));
        assert_eq!(ScalarType::String.default_value(), Value::String(String::new()));
        assert_eq!(ScalarType::Bool.default_value(), Value::Bool(false));
        assert!(!ScalarType::Uuid.default_value().is_null());
    }
}
