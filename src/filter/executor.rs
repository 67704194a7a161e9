use std::collections::BTreeSet;

use super::predicate::Predicate;
use crate::data::model::{Dataset, Record};

/// Ordered row indices into a [`Dataset`] that survived filtering so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    rows: Vec<usize>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<usize> {
        self.rows
    }
}

impl FromIterator<usize> for ResultSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        ResultSet {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Applies predicates to result sets.
pub trait PredicateExecutor {
    /// The set a column starts from.  `None` means nothing has been
    /// excluded yet, i.e. the whole dataset.
    fn seed(&self, carried: Option<&ResultSet>) -> ResultSet;

    /// Members of `base` that satisfy `predicate`.
    fn apply_and(&self, predicate: &dyn Predicate, base: &ResultSet) -> ResultSet;

    /// Members of `input` that are already in `acc` or satisfy `predicate`.
    fn apply_or(&self, predicate: &dyn Predicate, input: &ResultSet, acc: &ResultSet) -> ResultSet;
}

/// Executor over an in-memory [`Dataset`].
#[derive(Debug, Clone, Copy)]
pub struct DatasetExecutor<'a> {
    dataset: &'a Dataset,
}

impl<'a> DatasetExecutor<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        DatasetExecutor { dataset }
    }

    fn record(&self, row: usize) -> Option<&'a Record> {
        self.dataset.records.get(row)
    }

    fn test(&self, predicate: &dyn Predicate, row: usize) -> bool {
        self.record(row).is_some_and(|rec| predicate.matches(rec))
    }
}

impl PredicateExecutor for DatasetExecutor<'_> {
    fn seed(&self, carried: Option<&ResultSet>) -> ResultSet {
        match carried {
            Some(rows) => rows.clone(),
            None => (0..self.dataset.len()).collect(),
        }
    }

    fn apply_and(&self, predicate: &dyn Predicate, base: &ResultSet) -> ResultSet {
        base.rows
            .iter()
            .copied()
            .filter(|&row| self.test(predicate, row))
            .collect()
    }

    fn apply_or(&self, predicate: &dyn Predicate, input: &ResultSet, acc: &ResultSet) -> ResultSet {
        let kept: BTreeSet<usize> = acc.rows.iter().copied().collect();
        input
            .rows
            .iter()
            .copied()
            .filter(|&row| kept.contains(&row) || self.test(predicate, row))
            .collect()
    }
}
