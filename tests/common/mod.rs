#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sonoflow::compute::{BackendError, ComputeBackend, ComputeOutput, ComputeRequest};
use sonoflow::config::ParameterSnapshot;
use sonoflow::core::{
    Element, Geometry, ImageState, Metadata, Payload, Record, RecordKind, Shape, Timestamps,
};

/// Call counters shared between a test and the backend it hands to a stage
#[derive(Debug, Default)]
pub struct Calls {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub synchronized: AtomicUsize,
    pub computed: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Shape-preserving `v * gain + offset`, recording every call
pub struct AffineBackend {
    pub gain: f32,
    pub offset: f32,
    pub calls: Arc<Calls>,
    /// Parameters seen by each computation, in order
    pub seen: Arc<Mutex<Vec<ParameterSnapshot>>>,
    pub delay: Duration,
}

impl AffineBackend {
    pub fn new(gain: f32, offset: f32) -> Self {
        Self {
            gain,
            offset,
            calls: Arc::new(Calls::default()),
            seen: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl ComputeBackend for AffineBackend {
    fn name(&self) -> &str {
        "affine"
    }

    fn open(&mut self) -> Result<(), BackendError> {
        self.calls.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn synchronize(&mut self) -> Result<(), BackendError> {
        self.calls.synchronized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn compute(&mut self, request: ComputeRequest<'_>) -> Result<ComputeOutput, BackendError> {
        self.calls.computed.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.parameters.clone());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(ComputeOutput {
            samples: request
                .samples
                .iter()
                .map(|v| v * self.gain + self.offset)
                .collect(),
            shape: request.shape,
        })
    }

    fn close(&mut self) {
        self.calls.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fails every computation with a device error
pub struct FailingBackend;

impl ComputeBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn compute(&mut self, _request: ComputeRequest<'_>) -> Result<ComputeOutput, BackendError> {
        Err(BackendError::Device("illegal memory access".to_string()))
    }
}

/// Cannot be opened
pub struct UnopenableBackend;

impl ComputeBackend for UnopenableBackend {
    fn name(&self) -> &str {
        "unopenable"
    }

    fn open(&mut self) -> Result<(), BackendError> {
        Err(BackendError::Unavailable("no device".to_string()))
    }

    fn compute(&mut self, _request: ComputeRequest<'_>) -> Result<ComputeOutput, BackendError> {
        unreachable!("never opened")
    }
}

pub fn metadata(state: ImageState) -> Arc<Metadata> {
    Arc::new(Metadata::new(
        state,
        Geometry {
            scanlines: 4,
            samples: 4,
            channels: 4,
            depth_mm: 40.0,
            ..Geometry::default()
        },
    ))
}

pub fn record<T: Element>(
    kind: RecordKind,
    data: Vec<T>,
    shape: Shape,
    metadata: &Arc<Metadata>,
    sequence_id: u64,
) -> Arc<Record> {
    Arc::new(
        Record::new(
            kind,
            Payload::from_vec(data),
            shape,
            metadata.clone(),
            Timestamps {
                receive: sequence_id as f64,
                sync: sequence_id as f64,
            },
            sequence_id,
        )
        .unwrap(),
    )
}

/// Delayed channel data in a (4,4,4) block, values `i - 32`
pub fn raw_i16(metadata: &Arc<Metadata>, sequence_id: u64) -> Arc<Record> {
    let data: Vec<i16> = (0..64).map(|i| i as i16 - 32).collect();
    record(RecordKind::RawData, data, Shape::new(4, 4, 4), metadata, sequence_id)
}

pub fn image<T: Element>(data: Vec<T>, metadata: &Arc<Metadata>) -> Arc<Record> {
    let len = data.len();
    record(RecordKind::Image, data, Shape::new(len, 1, 1), metadata, 0)
}
