pub mod domain;
pub mod store;
pub mod value;

pub use domain::{ParameterDomain, ParameterSpec};
pub use store::{ConfigurationStore, ParameterChange};
pub use value::{FromParameter, ParameterKind, ParameterSnapshot, ParameterValue};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("parameter '{0}' declared twice")]
    DuplicateParameter(String),

    #[error("parameter '{key}' expects a {expected:?} value, got {found}")]
    InvalidValue {
        key: String,
        expected: ParameterKind,
        found: serde_json::Value,
    },

    #[error("configuration must be a JSON object, got {0}")]
    NotAnObject(serde_json::Value),

    #[error("value {value} for parameter '{key}' outside {domain}")]
    OutOfDomain {
        key: String,
        value: ParameterValue,
        domain: ParameterDomain,
    },
}

/// Typed parameter block of a stage. Implemented with
/// `#[derive(StageParams)]`.
pub trait StageParams: Sized + Send + 'static {
    /// Declared configuration surface, in declaration order
    fn schema() -> Vec<ParameterSpec>;

    /// Read every field from `store`
    fn load(store: &ConfigurationStore) -> Result<Self, ConfigError>;

    /// Re-read the field bound to `key`; `Ok(false)` if no field is
    fn reload(&mut self, key: &str, store: &ConfigurationStore) -> Result<bool, ConfigError>;

    /// Current values keyed by parameter name
    fn snapshot(&self) -> ParameterSnapshot;

    /// A store holding every declared parameter at its default
    fn declare_defaults() -> Result<ConfigurationStore, ConfigError> {
        let mut store = ConfigurationStore::new();
        store.declare_all(Self::schema())?;
        Ok(store)
    }
}
