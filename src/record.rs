// Record trait for anything the task store keeps in a blob

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Core trait that any storable record must implement
pub trait Record: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync + 'static {
    /// Unique identifier for this record
    fn id(&self) -> &str;

    /// Storage key holding the serialized array of these records (e.g., "tasks")
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Fields that view filters can match against
    /// Return empty HashMap if nothing is filterable
    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        HashMap::new()
    }
}

/// Value types that can be indexed for filtering
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    String(String),
    Bool(bool),
}

impl IndexValue {
    /// Ordering between two values of the same kind; `None` across kinds
    pub(crate) fn compare(&self, other: &IndexValue) -> Option<Ordering> {
        match (self, other) {
            (IndexValue::String(a), IndexValue::String(b)) => Some(a.cmp(b)),
            (IndexValue::Bool(a), IndexValue::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&str> for IndexValue {
    fn from(s: &str) -> Self {
        IndexValue::String(s.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(s: String) -> Self {
        IndexValue::String(s)
    }
}

impl From<bool> for IndexValue {
    fn from(b: bool) -> Self {
        IndexValue::Bool(b)
    }
}

impl std::fmt::Display for IndexValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexValue::String(s) => write!(f, "{}", s),
            IndexValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct TestRecord {
        id: String,
        name: String,
    }

    impl Record for TestRecord {
        fn id(&self) -> &str {
            &self.id
        }

        fn collection_name() -> &'static str {
            "test"
        }
    }

    #[test]
    fn test_record_trait_implementation() {
        let record = TestRecord {
            id: "test-1".to_string(),
            name: "Test".to_string(),
        };

        assert_eq!(record.id(), "test-1");
        assert_eq!(record.name, "Test");
        assert_eq!(TestRecord::collection_name(), "test");
        assert!(record.indexed_fields().is_empty());
    }

    #[test]
    fn test_index_value_display() {
        assert_eq!(IndexValue::String("test".to_string()).to_string(), "test");
        assert_eq!(IndexValue::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_index_value_compare_across_kinds() {
        assert_eq!(IndexValue::from("a").compare(&IndexValue::from("b")), Some(Ordering::Less));
        assert_eq!(IndexValue::from(true).compare(&IndexValue::from(false)), Some(Ordering::Greater));
        assert_eq!(IndexValue::from("true").compare(&IndexValue::from(true)), None);
    }
}
