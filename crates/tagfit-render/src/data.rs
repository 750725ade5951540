use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// A token replacement value.
///
/// `Null` and `Number(NaN)` count as absent; an empty `Text` is present.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

pub type TokenData = IndexMap<String, DataValue>;

impl DataValue {
    pub fn is_present(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Number(n) => !n.is_nan(),
            Self::Text(_) | Self::Bool(_) => true,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if n.is_nan() => f.write_str("NaN"),
            Self::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Self::Number(n) => {
                let mut buf = ryu_js::Buffer::new();
                f.write_str(buf.format_finite(*n))
            }
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<Value> for DataValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Value::String(s) => Self::Text(s),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Builds token data from any key/value pairs, e.g. a host's query params.
pub fn token_data<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> TokenData
where
    K: Into<String>,
    V: Into<DataValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
