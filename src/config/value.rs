use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ConfigError;
use crate::core::ElementType;

/// A typed configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Element(ElementType),
}

/// Value kind, fixed per parameter by its declared default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Bool,
    Int,
    Float,
    Text,
    Element,
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Bool(_) => ParameterKind::Bool,
            Self::Int(_) => ParameterKind::Int,
            Self::Float(_) => ParameterKind::Float,
            Self::Text(_) => ParameterKind::Text,
            Self::Element(_) => ParameterKind::Element,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Parse a raw JSON value as `kind`. Integral floats are accepted for
    /// `Int` parameters, integers for `Float` ones.
    pub fn from_json(kind: ParameterKind, raw: &serde_json::Value) -> Option<Self> {
        match kind {
            ParameterKind::Bool => raw.as_bool().map(Self::Bool),
            ParameterKind::Int => raw.as_i64().map(Self::Int).or_else(|| {
                raw.as_f64()
                    .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
                    .map(|v| Self::Int(v as i64))
            }),
            ParameterKind::Float => raw.as_f64().filter(|v| v.is_finite()).map(Self::Float),
            ParameterKind::Text => raw.as_str().map(|s| Self::Text(s.to_string())),
            ParameterKind::Element => raw
                .as_str()
                .and_then(|s| s.parse::<ElementType>().ok())
                .map(Self::Element),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(v) => serde_json::Value::from(*v),
            Self::Int(v) => serde_json::Value::from(*v),
            Self::Float(v) => serde_json::Value::from(*v),
            Self::Text(v) => serde_json::Value::from(v.as_str()),
            Self::Element(v) => serde_json::Value::from(v.name()),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{:?}", v),
            Self::Element(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u32> for ParameterValue {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<ElementType> for ParameterValue {
    fn from(v: ElementType) -> Self {
        Self::Element(v)
    }
}

/// Typed read-out of a stored value
pub trait FromParameter: Sized {
    const KIND: ParameterKind;

    fn from_parameter(value: &ParameterValue) -> Option<Self>;
}

impl FromParameter for bool {
    const KIND: ParameterKind = ParameterKind::Bool;

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromParameter for u32 {
    const KIND: ParameterKind = ParameterKind::Int;

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Int(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromParameter for i32 {
    const KIND: ParameterKind = ParameterKind::Int;

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Int(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromParameter for i64 {
    const KIND: ParameterKind = ParameterKind::Int;

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromParameter for f64 {
    const KIND: ParameterKind = ParameterKind::Float;

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromParameter for String {
    const KIND: ParameterKind = ParameterKind::Text;

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromParameter for ElementType {
    const KIND: ParameterKind = ParameterKind::Element;

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Element(v) => Some(*v),
            _ => None,
        }
    }
}

/// The user-visible parameter values of one stage at one point in time,
/// handed to computation backends and recorded into metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParameterValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.values.get(key)
    }

    pub fn get_as<T: FromParameter>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::UnknownParameter(key.to_string()))?;
        T::from_parameter(value).ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            expected: T::KIND,
            found: value.to_json(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ParameterValue)> for ParameterSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, ParameterValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
