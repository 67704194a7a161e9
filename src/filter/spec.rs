use std::fmt;
use std::io::Read;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value as JsonValue;

use super::error::{FilterError, FilterResult};

/// Reserved column-filter key carrying the combinator token.
pub const COMBINATOR_KEY: &str = "type";

// ---------------------------------------------------------------------------
// Combinator
// ---------------------------------------------------------------------------

/// How an operator combines with the rest of its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    And,
    #[default]
    Or,
}

impl Combinator {
    /// Parse a combinator token.  Only the exact strings `"and"` and `"or"`
    /// are accepted.
    pub fn parse(token: &str) -> FilterResult<Self> {
        match token {
            "and" => Ok(Combinator::And),
            "or" => Ok(Combinator::Or),
            other => Err(expected_combinator(&format!("'{other}'"))),
        }
    }

    /// Parse the value of a `type` entry, which must be a combinator token.
    pub fn from_value(value: &JsonValue) -> FilterResult<Self> {
        match value.as_str() {
            Some(token) => Self::parse(token),
            None => Err(expected_combinator(&value.to_string())),
        }
    }

    /// Whether `key` is the reserved combinator key (ASCII case-insensitive).
    pub fn is_key(key: &str) -> bool {
        key.eq_ignore_ascii_case(COMBINATOR_KEY)
    }
}

fn expected_combinator(found: &str) -> FilterError {
    FilterError::invalid(format!(
        "'and' or 'or' expected after '{COMBINATOR_KEY}', found {found}"
    ))
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => f.write_str("and"),
            Combinator::Or => f.write_str("or"),
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnFilter
// ---------------------------------------------------------------------------

/// One entry of a column filter, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEntry {
    Combinator(Combinator),
    Operator { name: String, value: JsonValue },
}

/// Operator entries for a single column, plus any combinator markers.
///
/// Entries keep their document order and duplicates, so
/// `{"eq": 20, "type": "or", "eq": 40}` holds three entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnFilter {
    pub entries: Vec<FilterEntry>,
}

impl ColumnFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operator entry.
    pub fn op(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.entries.push(FilterEntry::Operator {
            name: name.into(),
            value,
        });
        self
    }

    /// Append a combinator marker.
    pub fn combinator(mut self, combinator: Combinator) -> Self {
        self.entries.push(FilterEntry::Combinator(combinator));
        self
    }
}

impl<'de> Deserialize<'de> for ColumnFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ColumnFilterVisitor;

        impl<'de> Visitor<'de> for ColumnFilterVisitor {
            type Value = ColumnFilter;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping operator names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ColumnFilter, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(key) = map.next_key::<String>()? {
                    let value: JsonValue = map.next_value()?;
                    if Combinator::is_key(&key) {
                        let combinator = Combinator::from_value(&value)
                            .map_err(|err| <A::Error as de::Error>::custom(err.detail()))?;
                        entries.push(FilterEntry::Combinator(combinator));
                    } else {
                        entries.push(FilterEntry::Operator { name: key, value });
                    }
                }
                Ok(ColumnFilter { entries })
            }
        }

        deserializer.deserialize_map(ColumnFilterVisitor)
    }
}

// ---------------------------------------------------------------------------
// FilterSpec
// ---------------------------------------------------------------------------

/// Whole filter request: column name → column filter, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub columns: Vec<(String, ColumnFilter)>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>, filter: ColumnFilter) -> Self {
        self.columns.push((name.into(), filter));
        self
    }

    /// Decode from an already-parsed JSON value.
    pub fn from_value(value: JsonValue) -> FilterResult<Self> {
        Ok(FilterSpec::deserialize(value)?)
    }

    /// Decode from JSON text.  Duplicate operator keys are preserved.
    pub fn from_json_str(text: &str) -> FilterResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode from a reader.  I/O failures surface as
    /// [`FilterError::Internal`].
    pub fn from_reader<R: Read>(reader: R) -> FilterResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

impl<'de> Deserialize<'de> for FilterSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FilterSpecVisitor;

        impl<'de> Visitor<'de> for FilterSpecVisitor {
            type Value = FilterSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping column names to column filters")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FilterSpec, A::Error> {
                let mut columns = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((column, filter)) = map.next_entry::<String, ColumnFilter>()? {
                    columns.push((column, filter));
                }
                Ok(FilterSpec { columns })
            }
        }

        deserializer.deserialize_map(FilterSpecVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn combinator_tokens_are_case_sensitive() {
        assert_eq!(Combinator::parse("and"), Ok(Combinator::And));
        assert_eq!(Combinator::parse("or"), Ok(Combinator::Or));
        assert!(matches!(Combinator::parse("AND"), Err(FilterError::Invalid(_))));
        assert!(matches!(Combinator::parse("xor"), Err(FilterError::Invalid(_))));
        assert_eq!(Combinator::default(), Combinator::Or);
    }

    #[test]
    fn combinator_key_is_case_insensitive() {
        assert!(Combinator::is_key("type"));
        assert!(Combinator::is_key("Type"));
        assert!(Combinator::is_key("TYPE"));
        assert!(!Combinator::is_key("types"));
    }

    #[test]
    fn text_decoding_keeps_order_and_duplicate_keys() {
        let spec = FilterSpec::from_json_str(r#"{"age": {"eq": 20, "Type": "or", "eq": 40}}"#)
            .unwrap();
        let expected = FilterSpec::new().column(
            "age",
            ColumnFilter::new()
                .op("eq", json!(20))
                .combinator(Combinator::Or)
                .op("eq", json!(40)),
        );
        assert_eq!(spec, expected);
    }

    #[test]
    fn value_decoding_keeps_column_order() {
        let spec = FilterSpec::from_value(json!({
            "zeta": {"eq": 1},
            "alpha": {"eq": 2},
        }))
        .unwrap();
        let names: Vec<&str> = spec.columns.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn bad_combinator_is_invalid() {
        let err = FilterSpec::from_value(json!({"age": {"type": "xor", "eq": 1}})).unwrap_err();
        assert!(matches!(err, FilterError::Invalid(_)));

        let err = FilterSpec::from_value(json!({"age": {"type": 1}})).unwrap_err();
        assert!(matches!(err, FilterError::Invalid(_)));
    }

    #[test]
    fn decoded_and_built_combinator_errors_share_one_message() {
        let built = Combinator::from_value(&json!("AND")).unwrap_err();
        let decoded = FilterSpec::from_json_str(r#"{"age": {"type": "AND"}}"#).unwrap_err();
        let from_value = FilterSpec::from_value(json!({"age": {"type": "AND"}})).unwrap_err();

        assert_eq!(built.detail(), "'and' or 'or' expected after 'type', found 'AND'");
        assert!(decoded.detail().starts_with(built.detail()), "{decoded}");
        assert_eq!(from_value, built);

        let not_a_string = Combinator::from_value(&json!(1)).unwrap_err();
        assert_eq!(not_a_string.detail(), "'and' or 'or' expected after 'type', found 1");
    }

    #[test]
    fn non_object_shapes_are_invalid() {
        for bad in [json!([1, 2]), json!({"age": 3}), json!({"age": [1]}), json!("age")] {
            let err = FilterSpec::from_value(bad).unwrap_err();
            assert!(matches!(err, FilterError::Invalid(_)), "{err:?}");
        }
        let err = FilterSpec::from_json_str("{\"age\": ").unwrap_err();
        assert!(matches!(err, FilterError::Invalid(_)));
    }

    #[test]
    fn reader_io_failure_is_internal() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
            }
        }
        let err = FilterSpec::from_reader(Broken).unwrap_err();
        assert!(matches!(err, FilterError::Internal(_)));
    }
}
