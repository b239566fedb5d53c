use serde::{Deserialize, Serialize};
use std::fmt;

use super::value::{ParameterKind, ParameterValue};

/// Set of values a parameter may take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterDomain {
    /// Inclusive numeric range
    Range { min: f64, max: f64 },
    Choices(Vec<ParameterValue>),
    Any,
}

impl ParameterDomain {
    pub fn range(min: impl Into<ParameterValue>, max: impl Into<ParameterValue>) -> Self {
        let min = min.into().as_f64().unwrap_or(f64::NEG_INFINITY);
        let max = max.into().as_f64().unwrap_or(f64::INFINITY);
        Self::Range { min, max }
    }

    pub fn choices<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParameterValue>,
    {
        Self::Choices(values.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, value: &ParameterValue) -> bool {
        match self {
            Self::Range { min, max } => value
                .as_f64()
                .is_some_and(|v| v >= *min && v <= *max),
            Self::Choices(choices) => choices.contains(value),
            Self::Any => true,
        }
    }

    /// Whether this domain can hold values of `kind` at all
    pub fn admits_kind(&self, kind: ParameterKind) -> bool {
        match self {
            Self::Range { .. } => matches!(kind, ParameterKind::Int | ParameterKind::Float),
            Self::Choices(choices) => choices.iter().all(|c| c.kind() == kind),
            Self::Any => true,
        }
    }
}

impl fmt::Display for ParameterDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { min, max } => write!(f, "[{}, {}]", min, max),
            Self::Choices(choices) => {
                let names: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
                write!(f, "{{{}}}", names.join(", "))
            }
            Self::Any => f.write_str("any"),
        }
    }
}

/// Declaration of one stage parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub key: String,
    pub kind: ParameterKind,
    pub domain: ParameterDomain,
    pub default: ParameterValue,
    pub description: String,
}

impl ParameterSpec {
    pub fn new(
        key: impl Into<String>,
        domain: ParameterDomain,
        default: impl Into<ParameterValue>,
        description: impl Into<String>,
    ) -> Self {
        let default = default.into();
        Self {
            key: key.into(),
            kind: default.kind(),
            domain,
            default,
            description: description.into(),
        }
    }
}
