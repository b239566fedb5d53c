use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{ParameterSnapshot, ParameterValue};

/// Processing state of the data a record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageState {
    Raw,
    RawDelayed,
    Rf,
    EnvelopeDetected,
    LogCompressed,
    ScanConverted,
    Processed,
}

/// Acquisition geometry, set by the source and inherited unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub scanlines: u32,
    pub samples: u32,
    pub channels: u32,
    pub depth_mm: f64,
    pub speed_of_sound_mps: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            scanlines: 0,
            samples: 0,
            channels: 0,
            depth_mm: 0.0,
            speed_of_sound_mps: 1540.0,
        }
    }
}

/// Provenance snapshot attached to a record.
///
/// Shared as `Arc<Metadata>` and never edited once attached; stages derive a
/// fresh copy instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub state: ImageState,
    pub geometry: Geometry,
    /// Parameters recorded by the stages that touched the record, keyed
    /// `"<Stage>.<parameter>"`
    specific: BTreeMap<String, ParameterValue>,
}

impl Metadata {
    pub fn new(state: ImageState, geometry: Geometry) -> Self {
        Self {
            state,
            geometry,
            specific: BTreeMap::new(),
        }
    }

    pub fn with_state(mut self, state: ImageState) -> Self {
        self.state = state;
        self
    }

    pub fn set_specific_parameter(&mut self, key: impl Into<String>, value: ParameterValue) {
        self.specific.insert(key.into(), value);
    }

    pub fn specific_parameter(&self, key: &str) -> Option<&ParameterValue> {
        self.specific.get(key)
    }

    pub fn specific_parameters(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.specific.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of `self` advanced to `state` with `parameters` recorded under
    /// `stage`-qualified keys
    pub fn derive(&self, stage: &str, state: ImageState, parameters: &ParameterSnapshot) -> Metadata {
        let mut derived = self.clone().with_state(state);
        for (key, value) in parameters.iter() {
            derived.set_specific_parameter(format!("{}.{}", stage, key), value.clone());
        }
        derived
    }
}

/// Last-seen-input cache for derived metadata.
///
/// Keyed by `Arc` identity of the input snapshot. The input `Arc` is retained
/// so its address cannot be reused by a different snapshot while cached.
#[derive(Debug, Default)]
pub struct MetadataCache {
    last_seen: Option<Arc<Metadata>>,
    derived: Option<Arc<Metadata>>,
    stale: bool,
    derivations: u64,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached snapshot for `input`, calling `derive` only when the
    /// input identity changed or the cache was invalidated.
    pub fn resolve<F>(&mut self, input: &Arc<Metadata>, derive: F) -> Arc<Metadata>
    where
        F: FnOnce(&Metadata) -> Metadata,
    {
        let hit = !self.stale
            && self
                .last_seen
                .as_ref()
                .is_some_and(|seen| Arc::ptr_eq(seen, input));

        if let (true, Some(derived)) = (hit, &self.derived) {
            return derived.clone();
        }

        let derived = Arc::new(derive(input));
        self.last_seen = Some(input.clone());
        self.derived = Some(derived.clone());
        self.stale = false;
        self.derivations += 1;
        derived
    }

    /// Forces the next `resolve` to derive again
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale || self.derived.is_none()
    }

    /// Number of times a snapshot was actually derived
    pub fn derivations(&self) -> u64 {
        self.derivations
    }
}
