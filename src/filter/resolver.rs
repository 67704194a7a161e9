use log::trace;
use serde_json::Value as JsonValue;

use super::error::FilterResult;
use super::executor::{PredicateExecutor, ResultSet};
use super::predicate::{Predicate, PredicateRegistry};
use super::spec::{ColumnFilter, Combinator, FilterEntry};

/// Evaluate one column filter against the set carried in from the previous
/// column (`None` for the first column).
///
/// Operators run in document order under the combinator most recently
/// declared by a `type` entry (`or` until one appears):
///
/// * `or` tests the operator against the carried-in set and unions the
///   matches into the column's result.
/// * `and` narrows the column's result so far, or the carried-in set when
///   no operator has run yet in this column.
///
/// Combinators are validated and every predicate is built before any row is
/// tested, so a failing request never filters partially. An empty column
/// filter, or one holding only a `type` entry, yields an empty set.
pub fn resolve_column<E>(
    registry: &PredicateRegistry,
    executor: &E,
    column: &str,
    filter: &ColumnFilter,
    carried: Option<&ResultSet>,
) -> FilterResult<ResultSet>
where
    E: PredicateExecutor + ?Sized,
{
    let steps = combine(filter)?;
    let predicates = steps
        .into_iter()
        .map(|(combinator, operator, value)| {
            registry
                .build(column, operator, value)
                .map(|predicate| (combinator, predicate))
        })
        .collect::<FilterResult<Vec<(Combinator, Box<dyn Predicate>)>>>()?;

    if predicates.is_empty() {
        return Ok(ResultSet::empty());
    }

    let input = executor.seed(carried);
    let mut output: Option<ResultSet> = None;
    for (combinator, predicate) in &predicates {
        let next = match combinator {
            Combinator::And => {
                let base = output.as_ref().unwrap_or(&input);
                executor.apply_and(predicate.as_ref(), base)
            }
            Combinator::Or => {
                let acc = output.unwrap_or_default();
                executor.apply_or(predicate.as_ref(), &input, &acc)
            }
        };
        trace!("column '{column}' {combinator} {predicate:?} -> {} rows", next.len());
        output = Some(next);
    }

    Ok(output.unwrap_or_default())
}

/// Pair every operator with the combinator active at its position.
fn combine(filter: &ColumnFilter) -> FilterResult<Vec<(Combinator, &str, &JsonValue)>> {
    let mut active = Combinator::default();
    let mut steps = Vec::with_capacity(filter.entries.len());
    for entry in &filter.entries {
        match entry {
            FilterEntry::Combinator(combinator) => active = *combinator,
            FilterEntry::Operator { name, value } if Combinator::is_key(name) => {
                active = Combinator::from_value(value)?;
            }
            FilterEntry::Operator { name, value } => steps.push((active, name.as_str(), value)),
        }
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Dataset, Record};
    use crate::filter::error::FilterError;
    use crate::filter::executor::DatasetExecutor;
    use serde_json::json;

    fn ages(values: &[i64]) -> Dataset {
        Dataset::from_records(
            values
                .iter()
                .map(|&age| [("age", age)].into_iter().collect::<Record>())
                .collect(),
        )
    }

    fn resolve(
        ds: &Dataset,
        filter: &ColumnFilter,
        carried: Option<&ResultSet>,
    ) -> FilterResult<Vec<usize>> {
        let registry = PredicateRegistry::standard();
        let exec = DatasetExecutor::new(ds);
        resolve_column(&registry, &exec, "age", filter, carried).map(ResultSet::into_rows)
    }

    #[test]
    fn and_intersects_operators() {
        let ds = ages(&[20, 30, 40]);
        let filter = ColumnFilter::new()
            .op("gte", json!(25))
            .combinator(Combinator::And)
            .op("lte", json!(35));
        assert_eq!(resolve(&ds, &filter, None).unwrap(), vec![1]);
    }

    #[test]
    fn or_unions_against_carried_input() {
        let ds = ages(&[20, 30, 40]);
        let filter = ColumnFilter::new()
            .op("eq", json!(20))
            .combinator(Combinator::Or)
            .op("eq", json!(40));
        assert_eq!(resolve(&ds, &filter, None).unwrap(), vec![0, 2]);
    }

    #[test]
    fn default_combinator_is_or() {
        let ds = ages(&[20, 30, 40]);
        let filter = ColumnFilter::new().op("eq", json!(20)).op("eq", json!(40));
        assert_eq!(resolve(&ds, &filter, None).unwrap(), vec![0, 2]);
    }

    #[test]
    fn successive_and_narrows_previous_result() {
        // gte 25 -> [30, 40, 50]; lte 45 -> [30, 40]; not 30 -> [40]
        let ds = ages(&[20, 30, 40, 50]);
        let filter = ColumnFilter::new()
            .op("gte", json!(25))
            .combinator(Combinator::And)
            .op("lte", json!(45))
            .op("not", json!(30));
        assert_eq!(resolve(&ds, &filter, None).unwrap(), vec![2]);
    }

    #[test]
    fn leading_and_narrows_carried_set() {
        let ds = ages(&[20, 30, 40, 50]);
        let carried: ResultSet = [0, 1, 2].into_iter().collect();
        let filter = ColumnFilter::new()
            .combinator(Combinator::And)
            .op("gte", json!(30))
            .op("lte", json!(45));
        assert_eq!(resolve(&ds, &filter, Some(&carried)).unwrap(), vec![1, 2]);
    }

    #[test]
    fn or_never_escapes_carried_set() {
        let ds = ages(&[20, 30, 40, 50]);
        let carried: ResultSet = [1, 2].into_iter().collect();
        let filter = ColumnFilter::new().op("eq", json!(20)).op("eq", json!(40));
        assert_eq!(resolve(&ds, &filter, Some(&carried)).unwrap(), vec![2]);
    }

    #[test]
    fn or_after_and_widens_within_carried_set() {
        // gte 35 -> [40, 50]; and lte 45 -> [40]; or eq 20 -> [20, 40]
        let ds = ages(&[20, 30, 40, 50]);
        let filter = ColumnFilter::new()
            .op("gte", json!(35))
            .combinator(Combinator::And)
            .op("lte", json!(45))
            .combinator(Combinator::Or)
            .op("eq", json!(20));
        assert_eq!(resolve(&ds, &filter, None).unwrap(), vec![0, 2]);
    }

    #[test]
    fn or_then_and_narrows_the_accumulated_union() {
        // eq 10 -> [10]; eq 40 -> [10, 40]; and gte 30 -> [40]
        let ds = ages(&[0, 10, 20, 30, 40, 50]);
        let filter = ColumnFilter::new()
            .op("eq", json!(10))
            .op("eq", json!(40))
            .op("TYPE", json!("and"))
            .op("gte", json!(30));
        assert_eq!(resolve(&ds, &filter, None).unwrap(), vec![4]);
    }

    #[test]
    fn empty_or_combinator_only_filters_yield_nothing() {
        let ds = ages(&[20, 30]);
        assert!(resolve(&ds, &ColumnFilter::new(), None).unwrap().is_empty());

        let only_type = ColumnFilter::new().combinator(Combinator::And);
        assert!(resolve(&ds, &only_type, None).unwrap().is_empty());
    }

    #[test]
    fn bad_type_entry_fails_before_building_predicates() {
        let ds = ages(&[20]);
        // The unknown operator comes first, yet the combinator error wins.
        let filter = ColumnFilter::new()
            .op("between2", json!([1, 2]))
            .op("Type", json!("xor"));
        assert!(matches!(resolve(&ds, &filter, None), Err(FilterError::Invalid(_))));
    }

    #[test]
    fn unknown_operator_is_reported() {
        let ds = ages(&[20]);
        let filter = ColumnFilter::new()
            .op("eq", json!(20))
            .op("between2", json!([1, 2]));
        assert_eq!(
            resolve(&ds, &filter, None),
            Err(FilterError::Unknown("between2".into()))
        );
    }

    #[test]
    fn untouched_records_keep_their_values() {
        let ds = ages(&[20, 30]);
        let filter = ColumnFilter::new().op("eq", json!(30));
        let rows = resolve(&ds, &filter, None).unwrap();
        assert_eq!(ds.records[rows[0]].get("age"), &CellValue::Integer(30));
    }
}
