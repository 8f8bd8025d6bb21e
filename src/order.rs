use std::cmp::Ordering;

/// Sort order
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Order {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl Order {
    /// Apply this order to an ascending comparison result.
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Order::Asc => {
                ordering
            }
            Order::Desc => {
                ordering.reverse()
            }
        }
    }
}

impl Default for Order {
    fn default() -> Self {
        Order::Asc
    }
}
