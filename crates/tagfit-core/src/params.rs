//! Query parameter access with default and type coercion rules.

use crate::host::{RuntimeHost, raise};
use crate::{Error, Result};
use std::fmt;

pub enum ParamDefault {
    Value(String),
    Producer(Box<dyn Fn() -> String>),
}

impl ParamDefault {
    fn resolve(&self) -> String {
        match self {
            Self::Value(v) => v.clone(),
            Self::Producer(f) => f(),
        }
    }
}

impl fmt::Debug for ParamDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    Integer,
}

/// How a parameter is requested. A request must be `required` or carry a default.
#[derive(Debug, Default)]
pub struct ParamRequest {
    pub required: bool,
    pub default: Option<ParamDefault>,
    pub kind: Option<ParamKind>,
}

impl ParamRequest {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    pub fn with_default(value: impl Into<String>) -> Self {
        Self {
            default: Some(ParamDefault::Value(value.into())),
            ..Default::default()
        }
    }

    /// Default computed only when the parameter is missing.
    pub fn with_default_fn(producer: impl Fn() -> String + 'static) -> Self {
        Self {
            default: Some(ParamDefault::Producer(Box::new(producer))),
            ..Default::default()
        }
    }

    pub fn float(mut self) -> Self {
        self.kind = Some(ParamKind::Float);
        self
    }

    pub fn integer(mut self) -> Self {
        self.kind = Some(ParamKind::Integer);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    /// `NaN` when the raw value has no numeric prefix.
    Float(f64),
    /// `None` when the raw value has no integer prefix.
    Integer(Option<i64>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => v.map(|i| i as f64),
            Self::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => *v,
            _ => None,
        }
    }
}

/// Reads `key` from the host and applies `request`. Configuration mistakes and missing required
/// params are fatal: they go to the host's fatal channel and are returned as errors.
pub fn resolve_param(
    host: &dyn RuntimeHost,
    key: &str,
    request: &ParamRequest,
) -> Result<ParamValue> {
    if !(request.required || request.default.is_some()) {
        return Err(raise(
            host,
            Error::ParamNeedsDefault {
                key: key.to_string(),
            },
        ));
    }

    let raw = match host.param(key).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => match &request.default {
            Some(default) => default.resolve(),
            None => {
                return Err(raise(
                    host,
                    Error::MissingRequiredParam {
                        key: key.to_string(),
                    },
                ));
            }
        },
    };

    Ok(match request.kind {
        Some(ParamKind::Float) => {
            ParamValue::Float(crate::geom::parse_css_number(&raw).unwrap_or(f64::NAN))
        }
        Some(ParamKind::Integer) => ParamValue::Integer(parse_int_prefix(&raw)),
        None => ParamValue::Text(raw),
    })
}

/// Leading base-10 integer, the way `parseInt(value, 10)` reads it.
fn parse_int_prefix(raw: &str) -> Option<i64> {
    let t = raw.trim_start();
    let (sign, digits) = match t.as_bytes().first() {
        Some(b'-') => (-1, &t[1..]),
        Some(b'+') => (1, &t[1..]),
        _ => (1, t),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|v| v * sign)
}
