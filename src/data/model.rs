use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value as JsonValue;

// ---------------------------------------------------------------------------
// CellValue – a single cell in a record column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Used in `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render back into a JSON value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            CellValue::String(s) => JsonValue::String(s.clone()),
            CellValue::Integer(i) => JsonValue::from(*i),
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CellValue::Bool(b) => JsonValue::Bool(*b),
            CellValue::Null => JsonValue::Null,
        }
    }
}

impl From<&JsonValue> for CellValue {
    fn from(val: &JsonValue) -> Self {
        match val {
            JsonValue::String(s) => CellValue::String(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    CellValue::Float(f)
                } else {
                    CellValue::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => CellValue::Bool(*b),
            JsonValue::Null => CellValue::Null,
            other => CellValue::String(other.to_string()),
        }
    }
}

// -- Manual Eq/Ord: integers and floats share one numeric rank --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                String(_) => 3,
            }
        }
        let ra = rank(self);
        let rb = rank(other);
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b)),
            (Integer(a), Float(b)) => cmp_int_float(*a, *b),
            (Float(a), Integer(b)) => cmp_int_float(*b, *a).reverse(),
            _ => Ordering::Equal,
        }
    }
}

/// Exact `i64` / `f64` comparison, without rounding the integer.
/// NaN sorts like `f64::total_cmp`: positive above every integer, negative below.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, exactly representable
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        other => other,
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the dataset
// ---------------------------------------------------------------------------

static NULL: CellValue = CellValue::Null;

/// A single record: column_name → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new(fields: BTreeMap<String, CellValue>) -> Self {
        Record { fields }
    }

    /// Value for `column`; a missing column reads as `Null`.
    pub fn get(&self, column: &str) -> &CellValue {
        self.fields.get(column).unwrap_or(&NULL)
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::String(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::String(v)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded record set
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All records (rows).
    pub records: Vec<Record>,
    /// Ordered list of column names seen in any record.
    pub column_names: Vec<String>,
}

impl Dataset {
    /// Build column indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let column_names: Vec<String> = records
            .iter()
            .flat_map(|rec| rec.fields.keys().cloned())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        Dataset {
            records,
            column_names,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_and_float_compare_numerically() {
        assert_eq!(CellValue::Integer(30), CellValue::Float(30.0));
        assert!(CellValue::Integer(2) < CellValue::Float(2.5));
        assert!(CellValue::Float(2.5) < CellValue::Integer(3));
        assert!(CellValue::Null < CellValue::Bool(false));
        assert!(CellValue::Integer(1_000) < CellValue::String("a".into()));
    }

    #[test]
    fn mixed_numeric_order_is_exact_beyond_f64_precision() {
        let big = 1i64 << 53;
        let float = CellValue::Float(big as f64);
        assert_eq!(CellValue::Integer(big), float);
        assert!(CellValue::Integer(big + 1) > float);
        assert!(float < CellValue::Integer(big + 1));
        assert!(CellValue::Integer(i64::MAX) < CellValue::Float(9.3e18));
        assert!(CellValue::Integer(-3) > CellValue::Float(-3.5));
        assert!(CellValue::Integer(3) < CellValue::Float(3.5));

        let set: BTreeSet<CellValue> = [
            CellValue::Integer(big),
            CellValue::Integer(big + 1),
            float.clone(),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn signed_zero_and_nan_keep_a_total_order() {
        assert_eq!(CellValue::Float(-0.0), CellValue::Float(0.0));
        assert_eq!(CellValue::Integer(0), CellValue::Float(-0.0));
        assert!(CellValue::Integer(i64::MAX) < CellValue::Float(f64::NAN));
        assert!(CellValue::Float(f64::NAN) > CellValue::Float(f64::INFINITY));
    }

    #[test]
    fn missing_column_reads_as_null() {
        let rec: Record = [("age", 20i64)].into_iter().collect();
        assert_eq!(rec.get("age"), &CellValue::Integer(20));
        assert_eq!(rec.get("city"), &CellValue::Null);
    }

    #[test]
    fn dataset_indexes_column_names() {
        let ds = Dataset::from_records(vec![
            [("age", CellValue::from(20i64)), ("city", "Rome".into())]
                .into_iter()
                .collect(),
            [("age", 20i64)].into_iter().collect(),
        ]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column_names, vec!["age".to_string(), "city".to_string()]);
    }

    #[test]
    fn json_conversion_keeps_scalar_types() {
        assert_eq!(CellValue::from(&json!(4)), CellValue::Integer(4));
        assert!(matches!(CellValue::from(&json!(4.5)), CellValue::Float(_)));
        assert_eq!(CellValue::from(&json!([1, 2])), CellValue::String("[1,2]".into()));

        let rec: Record = [("name", "Ada")].into_iter().collect();
        assert_eq!(rec.to_json(), json!({"name": "Ada"}));
    }
}
