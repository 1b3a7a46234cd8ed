//! Helpers for comparing `sea_query::Value`s used as relation keys.
//!
//! `Value` has no total order and no `Hash`, and the same key may arrive as
//! `Int` from one table and `BigInt` from another. [`KeyValue`] normalises a
//! non-null value into an ordered, hashable key so eager loading can sort,
//! deduplicate and build dictionaries.

use sea_query::Value;

/// Whether a value is SQL NULL (any typed null variant)
pub fn is_null(value: &Value) -> bool {
    *value == value.as_null()
}

/// Normalised relation key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
    Bool(bool),
    Int(i128),
    Text(String),
    Bytes(Vec<u8>),
    /// Anything else, compared by its debug rendering
    Other(String),
}

impl KeyValue {
    /// Normalise a value, `None` for nulls
    pub fn from_value(value: &Value) -> Option<Self> {
        if is_null(value) {
            return None;
        }
        let key = match value {
            Value::Bool(Some(b)) => KeyValue::Bool(*b),
            Value::TinyInt(Some(i)) => KeyValue::Int(i128::from(*i)),
            Value::SmallInt(Some(i)) => KeyValue::Int(i128::from(*i)),
            Value::Int(Some(i)) => KeyValue::Int(i128::from(*i)),
            Value::BigInt(Some(i)) => KeyValue::Int(i128::from(*i)),
            Value::TinyUnsigned(Some(u)) => KeyValue::Int(i128::from(*u)),
            Value::SmallUnsigned(Some(u)) => KeyValue::Int(i128::from(*u)),
            Value::Unsigned(Some(u)) => KeyValue::Int(i128::from(*u)),
            Value::BigUnsigned(Some(u)) => KeyValue::Int(i128::from(*u)),
            Value::String(Some(s)) => KeyValue::Text(s.to_string()),
            Value::Char(Some(c)) => KeyValue::Text(c.to_string()),
            Value::Bytes(Some(b)) => KeyValue::Bytes(b.to_vec()),
            other => KeyValue::Other(format!("{other:?}")),
        };
        Some(key)
    }
}

/// Drop nulls, then sort ascending and deduplicate by normalised key.
///
/// The first value seen for a key is the one kept.
pub fn sorted_unique_keys<I>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = Value>,
{
    let mut keyed: Vec<(KeyValue, Value)> = values
        .into_iter()
        .filter_map(|value| KeyValue::from_value(&value).map(|key| (key, value)))
        .collect();
    // stable, so equal keys keep arrival order
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.dedup_by(|later, earlier| later.0 == earlier.0);
    keyed.into_iter().map(|(_, value)| value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null() {
        assert!(is_null(&Value::Int(None)));
        assert!(is_null(&Value::String(None)));
        assert!(is_null(&Value::Bool(None)));
        assert!(!is_null(&Value::Int(Some(0))));
        assert!(!is_null(&Value::from("")));
    }

    #[test]
    fn test_integer_widths_normalise() {
        assert_eq!(
            KeyValue::from_value(&Value::Int(Some(7))),
            KeyValue::from_value(&Value::BigInt(Some(7)))
        );
        assert_eq!(
            KeyValue::from_value(&Value::BigUnsigned(Some(7))),
            Some(KeyValue::Int(7))
        );
    }

    #[test]
    fn test_text_and_integer_keys_stay_distinct() {
        assert_ne!(
            KeyValue::from_value(&Value::from("1")),
            KeyValue::from_value(&Value::Int(Some(1)))
        );
    }

    #[test]
    fn test_null_has_no_key() {
        assert_eq!(KeyValue::from_value(&Value::BigInt(None)), None);
    }

    #[test]
    fn test_sorted_unique_keys_integers() {
        let keys = sorted_unique_keys(vec![
            Value::Int(Some(3)),
            Value::Int(Some(1)),
            Value::Int(Some(3)),
            Value::Int(Some(2)),
        ]);
        assert_eq!(
            keys,
            vec![Value::Int(Some(1)), Value::Int(Some(2)), Value::Int(Some(3))]
        );
    }

    #[test]
    fn test_sorted_unique_keys_numeric_not_lexical() {
        let keys = sorted_unique_keys(vec![Value::Int(Some(10)), Value::Int(Some(9))]);
        assert_eq!(keys, vec![Value::Int(Some(9)), Value::Int(Some(10))]);
    }

    #[test]
    fn test_sorted_unique_keys_strings_and_nulls() {
        let keys = sorted_unique_keys(vec![
            Value::from("b"),
            Value::String(None),
            Value::from("a"),
            Value::from("b"),
        ]);
        assert_eq!(keys, vec![Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn test_sorted_unique_keys_empty() {
        assert!(sorted_unique_keys(Vec::new()).is_empty());
    }
}
