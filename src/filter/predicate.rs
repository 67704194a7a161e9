use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value as JsonValue;

use super::error::{FilterError, FilterResult};
use crate::data::model::{CellValue, Record};

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// A single-operator test against one column of a record.
pub trait Predicate: fmt::Debug {
    fn matches(&self, record: &Record) -> bool;
}

/// Builds a predicate for `(column, value)`, validating the value.
pub type PredicateBuilder = fn(column: &str, value: &JsonValue) -> FilterResult<Box<dyn Predicate>>;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Operator name → predicate builder.
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    builders: BTreeMap<String, PredicateBuilder>,
}

impl PredicateRegistry {
    /// Registry holding the standard operator catalogue.
    pub fn standard() -> Self {
        let mut registry = Self::default();
        registry.register("eq", build_eq);
        registry.register("not", build_not);
        registry.register("gt", build_gt);
        registry.register("gte", build_gte);
        registry.register("lt", build_lt);
        registry.register("lte", build_lte);
        registry.register("bt", build_between);
        registry.register("in", build_in);
        registry.register("nin", build_not_in);
        registry.register("contains", build_contains);
        registry
    }

    /// Add or replace the builder for `operator`.
    pub fn register(&mut self, operator: impl Into<String>, builder: PredicateBuilder) {
        self.builders.insert(operator.into(), builder);
    }

    pub fn contains(&self, operator: &str) -> bool {
        self.builders.contains_key(operator)
    }

    /// Registered operator names, sorted.
    pub fn operators(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    /// Build a predicate for `operator` on `column`.
    pub fn build(
        &self,
        column: &str,
        operator: &str,
        value: &JsonValue,
    ) -> FilterResult<Box<dyn Predicate>> {
        let builder = self
            .builders
            .get(operator)
            .ok_or_else(|| FilterError::Unknown(operator.to_string()))?;
        builder(column, value)
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.builders.keys()).finish()
    }
}

// ---------------------------------------------------------------------------
// Standard predicates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
}

/// `eq` / `not`.
#[derive(Debug)]
struct Equality {
    column: String,
    value: CellValue,
    negate: bool,
}

impl Predicate for Equality {
    fn matches(&self, record: &Record) -> bool {
        (record.get(&self.column) == &self.value) != self.negate
    }
}

/// `gt` / `gte` / `lt` / `lte`.  Non-numeric cells never match.
#[derive(Debug)]
struct Compare {
    column: String,
    op: Comparison,
    bound: f64,
}

impl Predicate for Compare {
    fn matches(&self, record: &Record) -> bool {
        let Some(v) = record.get(&self.column).as_f64() else {
            return false;
        };
        match self.op {
            Comparison::Gt => v > self.bound,
            Comparison::Gte => v >= self.bound,
            Comparison::Lt => v < self.bound,
            Comparison::Lte => v <= self.bound,
        }
    }
}

/// `bt`, inclusive on both ends.
#[derive(Debug)]
struct Between {
    column: String,
    lower: f64,
    upper: f64,
}

impl Predicate for Between {
    fn matches(&self, record: &Record) -> bool {
        record
            .get(&self.column)
            .as_f64()
            .is_some_and(|v| v >= self.lower && v <= self.upper)
    }
}

/// `in` / `nin`.
#[derive(Debug)]
struct Membership {
    column: String,
    values: Vec<CellValue>,
    negate: bool,
}

impl Predicate for Membership {
    fn matches(&self, record: &Record) -> bool {
        let cell = record.get(&self.column);
        self.values.iter().any(|v| v == cell) != self.negate
    }
}

/// `contains`: substring match on string cells.
#[derive(Debug)]
struct Contains {
    column: String,
    needle: String,
}

impl Predicate for Contains {
    fn matches(&self, record: &Record) -> bool {
        record
            .get(&self.column)
            .as_str()
            .is_some_and(|s| s.contains(&self.needle))
    }
}

// -- Builders --

fn scalar(operator: &str, value: &JsonValue) -> FilterResult<CellValue> {
    match value {
        JsonValue::Array(_) | JsonValue::Object(_) => Err(FilterError::invalid(format!(
            "'{operator}' expects a scalar value, found {value}"
        ))),
        other => Ok(CellValue::from(other)),
    }
}

fn number(operator: &str, value: &JsonValue) -> FilterResult<f64> {
    value.as_f64().ok_or_else(|| {
        FilterError::invalid(format!("'{operator}' expects a number, found {value}"))
    })
}

fn scalar_list(operator: &str, value: &JsonValue) -> FilterResult<Vec<CellValue>> {
    let items = value.as_array().ok_or_else(|| {
        FilterError::invalid(format!("'{operator}' expects an array, found {value}"))
    })?;
    if items.is_empty() {
        return Err(FilterError::invalid(format!(
            "'{operator}' expects at least one value"
        )));
    }
    items.iter().map(|item| scalar(operator, item)).collect()
}

fn build_equality(
    column: &str,
    value: &JsonValue,
    negate: bool,
) -> FilterResult<Box<dyn Predicate>> {
    let operator = if negate { "not" } else { "eq" };
    Ok(Box::new(Equality {
        column: column.to_string(),
        value: scalar(operator, value)?,
        negate,
    }))
}

fn build_eq(column: &str, value: &JsonValue) -> FilterResult<Box<dyn Predicate>> {
    build_equality(column, value, false)
}

fn build_not(column: &str, value: &JsonValue) -> FilterResult<Box<dyn Predicate>> {
    build_equality(column, value, true)
}

fn build_compare(
    column: &str,
    operator: &str,
    op: Comparison,
    value: &JsonValue,
) -> FilterResult<Box<dyn Predicate>> {
    Ok(Box::new(Compare {
        column: column.to_string(),
        op,
        bound: number(operator, value)?,
    }))
}

fn build_gt(column: &str, value: &JsonValue) -> FilterResult<Box<dyn Predicate>> {
    build_compare(column, "gt", Comparison::Gt, value)
}

fn build_gte(column: &str, value: &JsonValue) -> FilterResult<Box<dyn Predicate>> {
    build_compare(column, "gte", Comparison::Gte, value)
}

fn build_lt(column: &str, value: &JsonValue) -> FilterResult<Box<dyn Predicate>> {
    build_compare(column, "lt", Comparison::Lt, value)
}

fn build_lte(column: &str, value: &JsonValue) -> FilterResult<Box<dyn Predicate>> {
    build_compare(column, "lte", Comparison::Lte, value)
}

fn build_between(column: &str, value: &JsonValue) -> FilterResult<Box<dyn Predicate>> {
    let bounds = match value.as_array().map(Vec::as_slice) {
        Some([lower, upper]) => (number("bt", lower)?, number("bt", upper)?),
        _ => {
            return Err(FilterError::invalid(format!(
                "'bt' expects [lower, upper], found {value}"
            )))
        }
    };
    let (lower, upper) = bounds;
    if lower > upper {
        return Err(FilterError::invalid(format!(
            "'bt' lower bound {lower} exceeds upper bound {upper}"
        )));
    }
    Ok(Box::new(Between {
        column: column.to_string(),
        lower,
        upper,
    }))
}

fn build_in(column: &str, value: &JsonValue) -> FilterResult<Box<dyn Predicate>> {
    Ok(Box::new(Membership {
        column: column.to_string(),
        values: scalar_list("in", value)?,
        negate: false,
    }))
}

fn build_not_in(column: &str, value: &JsonValue) -> FilterResult<Box<dyn Predicate>> {
    Ok(Box::new(Membership {
        column: column.to_string(),
        values: scalar_list("nin", value)?,
        negate: true,
    }))
}

fn build_contains(column: &str, value: &JsonValue) -> FilterResult<Box<dyn Predicate>> {
    let needle = value.as_str().ok_or_else(|| {
        FilterError::invalid(format!("'contains' expects a string, found {value}"))
    })?;
    Ok(Box::new(Contains {
        column: column.to_string(),
        needle: needle.to_string(),
    }))
}
