use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::buffer::Payload;
use super::element::ElementType;
use super::error::RecordError;
use super::metadata::Metadata;

/// What a record represents in the processing chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Per-channel data prior to beamforming
    RawData,
    Image,
}

/// 3-D extent of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Shape {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Element count, `None` if it does not fit in `usize`
    pub fn checked_volume(&self) -> Option<usize> {
        self.x.checked_mul(self.y)?.checked_mul(self.z)
    }

    /// Element count, saturating at `usize::MAX`. No payload can be that
    /// large, so an overflowing shape never matches one.
    pub fn volume(&self) -> usize {
        self.checked_volume().unwrap_or(usize::MAX)
    }
}

/// Seconds, as delivered by the acquisition source
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Timestamps {
    pub receive: f64,
    pub sync: f64,
}

/// Unit of data flowing along a pipeline edge. Immutable once built; shared
/// as `Arc<Record>`.
#[derive(Debug, Clone)]
pub struct Record {
    kind: RecordKind,
    payload: Payload,
    shape: Shape,
    metadata: Arc<Metadata>,
    timestamps: Timestamps,
    sequence_id: u64,
}

impl Record {
    pub fn new(
        kind: RecordKind,
        payload: Payload,
        shape: Shape,
        metadata: Arc<Metadata>,
        timestamps: Timestamps,
        sequence_id: u64,
    ) -> Result<Self, RecordError> {
        let volume = shape.checked_volume().ok_or(RecordError::ShapeOverflow { shape })?;
        if payload.len() != volume {
            return Err(RecordError::ShapeMismatch {
                shape,
                elements: payload.len(),
            });
        }

        Ok(Self {
            kind,
            payload,
            shape,
            metadata,
            timestamps,
            sequence_id,
        })
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn element_type(&self) -> ElementType {
        self.payload.element_type()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn metadata(&self) -> &Arc<Metadata> {
        &self.metadata
    }

    pub fn timestamps(&self) -> Timestamps {
        self.timestamps
    }

    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }
}
