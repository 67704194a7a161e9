use log::debug;

use super::error::FilterResult;
use super::executor::{PredicateExecutor, ResultSet};
use super::predicate::PredicateRegistry;
use super::resolver::resolve_column;
use super::spec::FilterSpec;

/// Apply every column of `spec` in order, each one filtering the output of
/// the previous column.  The first column starts from the executor's seed.
///
/// Columns chain by replacement: a later column's `or` can only widen within
/// what earlier columns kept.  An empty spec yields an empty set.
pub fn filter_columns<E>(
    registry: &PredicateRegistry,
    executor: &E,
    spec: &FilterSpec,
) -> FilterResult<ResultSet>
where
    E: PredicateExecutor + ?Sized,
{
    let mut carried: Option<ResultSet> = None;
    for (column, filter) in &spec.columns {
        let filtered = resolve_column(registry, executor, column, filter, carried.as_ref())?;
        debug!("column '{column}': {} rows remain", filtered.len());
        carried = Some(filtered);
    }
    Ok(carried.unwrap_or_default())
}
