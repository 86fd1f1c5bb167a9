//! Types for table queries

/// Count options for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountOption {
    /// Exact count
    Exact,

    /// Planned count (estimated by the planner)
    Planned,

    /// Estimated count
    Estimated,
}

impl CountOption {
    /// Convert the option to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CountOption::Exact => "exact",
            CountOption::Planned => "planned",
            CountOption::Estimated => "estimated",
        }
    }
}

/// Options for returning data from writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOption {
    /// Return the written rows
    Representation,

    /// Return nothing
    Minimal,
}

impl ReturnOption {
    /// The `Prefer` header value
    pub fn as_prefer(&self) -> &'static str {
        match self {
            ReturnOption::Representation => "return=representation",
            ReturnOption::Minimal => "return=minimal",
        }
    }
}

/// A page of rows together with the total the backend reported
#[derive(Debug, Clone, PartialEq)]
pub struct Counted<T> {
    pub rows: Vec<T>,
    pub total: Option<usize>,
}
