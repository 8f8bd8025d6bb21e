use std::cmp::Ordering;

use crate::field::Field;
use crate::key::{compare_lines, Key};
use crate::order::Order;

/// A line of input together with its derived sort key.
///
/// The ordering combines the sort direction, case sensitivity and the key type of the [Field]
/// the record was built with. Records built with different fields must not be compared.
#[derive(Debug)]
pub(crate) struct LineRecord {
    line: String,
    key: Option<Key>,
    ignore_case: bool,
    order: Order,
}

impl LineRecord {
    pub(crate) fn new(line: String, field: &Field, order: Order) -> LineRecord {
        let key = field.key(line.as_str());
        LineRecord {
            line,
            key,
            ignore_case: field.ignore_case(),
            order,
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        self.line.as_str()
    }

    pub(crate) fn line(self) -> String {
        self.line
    }
}

impl Eq for LineRecord {}

impl PartialEq<Self> for LineRecord {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd<Self> for LineRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LineRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        let ordering = match (&self.key, &other.key) {
            (Some(key), Some(other_key)) => {
                key.cmp(other_key)
            }
            _ => {
                compare_lines(self.line.as_str(), other.line.as_str(), self.ignore_case)
            }
        };
        self.order.apply(ordering)
    }
}
