/// Filter layer: JSON filter specification → surviving row indices.
///
/// ```text
///   JSON spec ──► spec::FilterSpec          decode + shape validation
///                      │
///                      ▼
///               columns::filter_columns     one column at a time, threading
///                      │                    the result of the previous column
///                      ▼
///               resolver::resolve_column    combinators + predicates
///                      │
///                      ▼
///     predicate::PredicateRegistry ─► executor::PredicateExecutor
/// ```

pub mod columns;
pub mod error;
pub mod executor;
pub mod predicate;
pub mod resolver;
pub mod spec;

use std::io::Read;

use serde_json::Value as JsonValue;

use crate::data::model::{Dataset, Record};
use error::FilterResult;
use executor::{DatasetExecutor, ResultSet};
use predicate::PredicateRegistry;
use spec::FilterSpec;

/// Evaluates filter specifications against one dataset snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RecordFilter<'a> {
    dataset: &'a Dataset,
    registry: &'a PredicateRegistry,
}

impl<'a> RecordFilter<'a> {
    pub fn new(dataset: &'a Dataset, registry: &'a PredicateRegistry) -> Self {
        RecordFilter { dataset, registry }
    }

    pub fn filter_columns(&self, spec: &FilterSpec) -> FilterResult<ResultSet> {
        columns::filter_columns(self.registry, &DatasetExecutor::new(self.dataset), spec)
    }

    pub fn filter_value(&self, value: JsonValue) -> FilterResult<ResultSet> {
        self.filter_columns(&FilterSpec::from_value(value)?)
    }

    pub fn filter_str(&self, text: &str) -> FilterResult<ResultSet> {
        self.filter_columns(&FilterSpec::from_json_str(text)?)
    }

    pub fn filter_reader<R: Read>(&self, reader: R) -> FilterResult<ResultSet> {
        self.filter_columns(&FilterSpec::from_reader(reader)?)
    }

    /// Materialise the records of `result`, in order.
    pub fn records(&self, result: &ResultSet) -> Vec<&'a Record> {
        result
            .rows()
            .iter()
            .filter_map(|&row| self.dataset.records.get(row))
            .collect()
    }
}
