use serde::{Deserialize, Serialize};

use crate::config::{ParameterDomain, ParameterKind, ParameterSpec, ParameterValue};

/// Schema for a configurable parameter, as shown to operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub default: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub choices: Vec<serde_json::Value>,
    pub description: String,
}

impl From<&ParameterSpec> for ParameterSchema {
    fn from(spec: &ParameterSpec) -> Self {
        let (min, max, choices) = match &spec.domain {
            ParameterDomain::Range { min, max } => (Some(*min), Some(*max), Vec::new()),
            ParameterDomain::Choices(choices) => (
                None,
                None,
                choices.iter().map(ParameterValue::to_json).collect(),
            ),
            ParameterDomain::Any => (None, None, Vec::new()),
        };

        Self {
            key: spec.key.clone(),
            kind: spec.kind,
            default: spec.default.to_json(),
            min,
            max,
            choices,
            description: spec.description.clone(),
        }
    }
}

/// Complete description of a stage type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub id: String,
    pub name: String,
    pub category: String,
    pub parameters: Vec<ParameterSchema>,
}

impl StageDescriptor {
    pub fn new(name: impl Into<String>, category: impl Into<String>, specs: Vec<ParameterSpec>) -> Self {
        let name = name.into();
        Self {
            id: name.to_lowercase(),
            name,
            category: category.into(),
            parameters: specs.iter().map(ParameterSchema::from).collect(),
        }
    }

    pub fn parameter(&self, key: &str) -> Option<&ParameterSchema> {
        self.parameters.iter().find(|p| p.key == key)
    }
}

// Factory type for creating stage descriptors at runtime
pub type StageDescriptorFn = fn() -> StageDescriptor;

// Wrapper for inventory collection
pub struct StageDescriptorFactory(pub StageDescriptorFn);

// Inventory submission type
inventory::collect!(StageDescriptorFactory);
