//! CPU reference backends used by the demo binary and tests.

use crate::core::{Shape, WorkType};

use super::{BackendError, ComputeBackend, ComputeOutput, ComputeRequest};

/// Sums already-delayed channel data per sample and scanline.
///
/// Input shape is `(channels, samples, scanlines)`, output is
/// `(scanlines, samples, 1)` laid out row by row.
#[derive(Debug, Default)]
pub struct DelayAndSumBackend {
    open: bool,
}

impl DelayAndSumBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl ComputeBackend for DelayAndSumBackend {
    fn name(&self) -> &str {
        "delay-and-sum"
    }

    fn open(&mut self) -> Result<(), BackendError> {
        self.open = true;
        Ok(())
    }

    fn compute(&mut self, request: ComputeRequest<'_>) -> Result<ComputeOutput, BackendError> {
        if !self.open {
            return Err(BackendError::Unavailable("backend not opened".to_string()));
        }

        let Shape {
            x: channels,
            y: samples,
            z: scanlines,
        } = request.shape;
        if request.samples.len() != request.shape.volume() {
            return Err(BackendError::InvalidInput(format!(
                "{} samples for shape {:?}",
                request.samples.len(),
                request.shape
            )));
        }

        let mut out = vec![0.0 as WorkType; scanlines * samples];
        for line in 0..scanlines {
            for sample in 0..samples {
                let base = channels * (sample + samples * line);
                out[line + scanlines * sample] = request.samples[base..base + channels].iter().sum();
            }
        }

        Ok(ComputeOutput {
            samples: out,
            shape: Shape::new(scanlines, samples, 1),
        })
    }

    fn close(&mut self) {
        self.open = false;
    }
}

/// Multiplies every sample by the `factor` parameter (1.0 when absent)
#[derive(Debug, Default)]
pub struct ScaleBackend;

impl ScaleBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for ScaleBackend {
    fn name(&self) -> &str {
        "scale"
    }

    fn compute(&mut self, request: ComputeRequest<'_>) -> Result<ComputeOutput, BackendError> {
        let factor = request
            .parameters
            .get("factor")
            .and_then(|v| v.as_f64())
            .unwrap_or(1.0) as WorkType;

        Ok(ComputeOutput {
            samples: request.samples.iter().map(|v| v * factor).collect(),
            shape: request.shape,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParameterSnapshot, ParameterValue};

    #[test]
    fn test_delay_and_sum_collapses_channels() {
        let mut backend = DelayAndSumBackend::new();
        backend.open().unwrap();

        // 2 channels, 3 samples, 2 scanlines
        let input: Vec<WorkType> = (0..12).map(|v| v as WorkType).collect();
        let parameters = ParameterSnapshot::new();
        let output = backend
            .compute(ComputeRequest {
                samples: &input,
                shape: Shape::new(2, 3, 2),
                stream: 0,
                parameters: &parameters,
            })
            .unwrap();

        assert_eq!(output.shape, Shape::new(2, 3, 1));
        // line 0: (0+1), (2+3), (4+5); line 1: (6+7), (8+9), (10+11)
        assert_eq!(output.samples, vec![1.0, 13.0, 5.0, 17.0, 9.0, 21.0]);
    }

    #[test]
    fn test_delay_and_sum_requires_open() {
        let mut backend = DelayAndSumBackend::new();
        let parameters = ParameterSnapshot::new();
        let result = backend.compute(ComputeRequest {
            samples: &[1.0],
            shape: Shape::new(1, 1, 1),
            stream: 0,
            parameters: &parameters,
        });
        assert!(matches!(result, Err(BackendError::Unavailable(_))));
    }

    #[test]
    fn test_scale_reads_factor() {
        let mut backend = ScaleBackend::new();
        let parameters = ParameterSnapshot::from_iter([("factor", ParameterValue::Float(0.5))]);
        let output = backend
            .compute(ComputeRequest {
                samples: &[2.0, 4.0],
                shape: Shape::new(2, 1, 1),
                stream: 0,
                parameters: &parameters,
            })
            .unwrap();
        assert_eq!(output.samples, vec![1.0, 2.0]);
    }
}
