use std::collections::HashMap;

use super::domain::{ParameterDomain, ParameterSpec};
use super::value::{FromParameter, ParameterValue};
use super::ConfigError;

/// Result of an accepted change
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterChange {
    pub key: String,
    pub previous: ParameterValue,
    pub current: ParameterValue,
}

impl ParameterChange {
    pub fn is_noop(&self) -> bool {
        self.previous == self.current
    }
}

struct Entry {
    spec: ParameterSpec,
    value: ParameterValue,
}

/// Named, domain-checked stage parameters.
///
/// Only ever holds values that passed validation against their declared
/// domain.
#[derive(Default)]
pub struct ConfigurationStore {
    entries: HashMap<String, Entry>,
    /// Declaration order
    order: Vec<String>,
}

impl ConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one parameter, initialised to its default
    pub fn declare(&mut self, spec: ParameterSpec) -> Result<(), ConfigError> {
        if self.entries.contains_key(&spec.key) {
            return Err(ConfigError::DuplicateParameter(spec.key));
        }
        if !spec.domain.admits_kind(spec.kind) || !spec.domain.contains(&spec.default) {
            return Err(ConfigError::OutOfDomain {
                key: spec.key.clone(),
                value: spec.default.clone(),
                domain: spec.domain.clone(),
            });
        }

        self.order.push(spec.key.clone());
        self.entries.insert(
            spec.key.clone(),
            Entry {
                value: spec.default.clone(),
                spec,
            },
        );
        Ok(())
    }

    pub fn declare_all(&mut self, specs: impl IntoIterator<Item = ParameterSpec>) -> Result<(), ConfigError> {
        for spec in specs {
            self.declare(spec)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&ParameterValue, ConfigError> {
        self.entries
            .get(key)
            .map(|e| &e.value)
            .ok_or_else(|| ConfigError::UnknownParameter(key.to_string()))
    }

    pub fn get_as<T: FromParameter>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.get(key)?;
        T::from_parameter(value).ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            expected: T::KIND,
            found: value.to_json(),
        })
    }

    pub fn spec(&self, key: &str) -> Result<&ParameterSpec, ConfigError> {
        self.entries
            .get(key)
            .map(|e| &e.spec)
            .ok_or_else(|| ConfigError::UnknownParameter(key.to_string()))
    }

    /// Validate `raw` against the declared kind and domain and store it.
    /// On error the previous value is kept.
    pub fn apply_change(&mut self, key: &str, raw: &serde_json::Value) -> Result<ParameterChange, ConfigError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| ConfigError::UnknownParameter(key.to_string()))?;

        let value = ParameterValue::from_json(entry.spec.kind, raw).ok_or_else(|| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                expected: entry.spec.kind,
                found: raw.clone(),
            }
        })?;

        if !entry.spec.domain.contains(&value) {
            return Err(ConfigError::OutOfDomain {
                key: key.to_string(),
                value,
                domain: entry.spec.domain.clone(),
            });
        }

        let previous = std::mem::replace(&mut entry.value, value.clone());
        Ok(ParameterChange {
            key: key.to_string(),
            previous,
            current: value,
        })
    }

    /// Restore every parameter to its default
    pub fn reset(&mut self) {
        for entry in self.entries.values_mut() {
            entry.value = entry.spec.default.clone();
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|k| k.as_str())
    }

    pub fn specs(&self) -> Vec<ParameterSpec> {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(k))
            .map(|e| e.spec.clone())
            .collect()
    }

    pub fn domain(&self, key: &str) -> Result<&ParameterDomain, ConfigError> {
        self.spec(key).map(|s| &s.domain)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ConfigurationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for key in &self.order {
            if let Some(entry) = self.entries.get(key) {
                map.entry(key, &entry.value);
            }
        }
        map.finish()
    }
}
