//! Filters gate which records a handler processes

use super::record::Record;
use std::sync::Arc;

/// Predicate over records. `true` lets the record through.
pub trait Filter: Send + Sync {
    fn filter(&self, record: &Record) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Record) -> bool + Send + Sync,
{
    fn filter(&self, record: &Record) -> bool {
        self(record)
    }
}

/// Accepts records from one logger and its dotted descendants.
///
/// `NameFilter::new("db")` passes `db` and `db.pool` but not `dbx`.
/// An empty name passes everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    name: String,
}

impl NameFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Filter for NameFilter {
    fn filter(&self, record: &Record) -> bool {
        if self.name.is_empty() || record.name == self.name {
            return true;
        }
        record
            .name
            .strip_prefix(self.name.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Ordered, AND-composed list of filters
#[derive(Clone, Default)]
pub struct Filterer {
    filters: Vec<Arc<dyn Filter>>,
}

impl Filterer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    /// Evaluates filters in registration order, stopping at the first rejection
    pub fn filter(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.filter(record))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl std::fmt::Debug for Filterer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filterer")
            .field("filters", &self.filters.len())
            .finish()
    }
}
