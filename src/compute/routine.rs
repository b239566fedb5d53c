use crate::config::ParameterSnapshot;
use crate::core::{Container, Element, Location, Payload, Shape, StageError, WorkType};

use super::{BackendError, ComputeBackend, ComputeRequest};

/// Everything a specialised routine needs for one record
pub struct RoutineCall<'a> {
    pub backend: &'a mut dyn ComputeBackend,
    pub payload: &'a Payload,
    pub shape: Shape,
    pub parameters: &'a ParameterSnapshot,
    /// Move device-resident input to the host before computing
    pub host_only: bool,
}

#[derive(Debug)]
pub struct RoutineOutput {
    pub payload: Payload,
    pub shape: Shape,
}

/// Dispatch table entry type
pub type Routine = fn(RoutineCall<'_>) -> Result<RoutineOutput, StageError>;

/// Element-specialised body shared by the built-in stages: widen `I` to the
/// working precision, run the backend, narrow the result to `O` with
/// saturation.
pub fn transform<I: Element, O: Element>(call: RoutineCall<'_>) -> Result<RoutineOutput, StageError> {
    let RoutineCall {
        backend,
        payload,
        shape,
        parameters,
        host_only,
    } = call;

    let input = payload.get::<I>().ok_or_else(|| {
        StageError::TypeMismatch(format!(
            "routine for {} received {} payload",
            I::TYPE,
            payload.element_type()
        ))
    })?;
    let input = if host_only { input.to_host() } else { input.clone() };

    let samples: Vec<WorkType> = input.as_slice().iter().map(|v| v.to_work()).collect();
    let output = backend.compute(ComputeRequest {
        samples: &samples,
        shape,
        stream: input.stream(),
        parameters,
    })?;

    if output.samples.len() != output.shape.volume() {
        return Err(BackendError::ShapeMismatch {
            shape: output.shape,
            samples: output.samples.len(),
        }
        .into());
    }

    let data: Vec<O> = output.samples.iter().map(|&v| O::clamp_from(v)).collect();
    let location = if host_only { Location::Host } else { input.location() };

    Ok(RoutineOutput {
        payload: O::into_payload(Container::new(location, input.stream(), data)),
        shape: output.shape,
    })
}
