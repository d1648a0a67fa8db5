// View filtering for records held in memory

use crate::record::{IndexValue, Record};
use std::cmp::Ordering;

/// Filter for narrowing the current view
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field name to filter on
    pub field: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Value to compare against
    pub value: IndexValue,
}

/// Comparison operators for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,       // ==
    Gte,      // >=
    Lte,      // <=
    Contains, // substring, case-insensitive
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<IndexValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Equality filter, the common case
    pub fn equals(field: impl Into<String>, value: impl Into<IndexValue>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// True when the record has the field and the comparison holds.
    /// A record without the field never matches.
    pub fn matches<T: Record>(&self, record: &T) -> bool {
        match record.indexed_fields().get(&self.field) {
            Some(actual) => self.op.apply(actual, &self.value),
            None => false,
        }
    }

    /// True when every filter matches (empty slice matches everything)
    pub fn all_match<T: Record>(filters: &[Filter], record: &T) -> bool {
        filters.iter().all(|f| f.matches(record))
    }
}

impl FilterOp {
    /// Compare `actual` (the record's value) against `expected` (the filter's)
    pub(crate) fn apply(self, actual: &IndexValue, expected: &IndexValue) -> bool {
        match (self, actual.compare(expected)) {
            (FilterOp::Contains, _) => match (actual, expected) {
                (IndexValue::String(a), IndexValue::String(e)) => a.to_lowercase().contains(&e.to_lowercase()),
                _ => false,
            },
            (_, None) => false, // different kinds
            (FilterOp::Eq, Some(ordering)) => ordering == Ordering::Equal,
            (FilterOp::Gte, Some(ordering)) => ordering != Ordering::Less,
            (FilterOp::Lte, Some(ordering)) => ordering != Ordering::Greater,
        }
    }
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterOp::Eq => write!(f, "="),
            FilterOp::Gte => write!(f, ">="),
            FilterOp::Lte => write!(f, "<="),
            FilterOp::Contains => write!(f, "~"),
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}
