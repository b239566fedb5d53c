use serde::{Deserialize, Serialize};
use sonoflow_macros::StageParams;

use super::Stage;
use crate::compute::{transform, Routine};
use crate::core::{ElementType, ImageState, Record, RecordKind, StageError, StageKind};
use crate::dispatch::DispatchTable;
use crate::dispatch_table;

/// Minimum-variance receive beamforming of delayed channel data
#[derive(StageParams, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[stage_meta(name = "BeamformingMV", category = "Beamformer")]
pub struct BeamformingMvParams {
    #[param(key = "subArraySize", default = "0", min = "0", max = "64", description = "Sub-array size")]
    pub sub_array_size: u32,

    #[param(key = "temporalSmoothing", default = "3", min = "0", max = "10", description = "Temporal smoothing")]
    pub temporal_smoothing: u32,

    #[param(
        key = "outputType",
        default = "ElementType::Float",
        choices = "ElementType::Float, ElementType::Uint16",
        description = "Output type"
    )]
    pub output_type: ElementType,
}

pub struct BeamformingMv;

impl StageKind for BeamformingMv {
    type Params = BeamformingMvParams;

    const NAME: &'static str = "BeamformingMV";
    const QUALIFIER: &'static str = "BeamformingMVNode";
    const OUTPUT_KIND: RecordKind = RecordKind::Image;
    const POST_STATE: ImageState = ImageState::Rf;

    fn check_input(record: &Record) -> Result<(), StageError> {
        if record.kind() != RecordKind::RawData {
            return Err(StageError::TypeMismatch(format!(
                "expected raw data, got {:?} record",
                record.kind()
            )));
        }
        if record.metadata().state != ImageState::RawDelayed {
            return Err(StageError::TypeMismatch(format!(
                "cannot beamform raw data in state {:?}, apply a raw delay stage first",
                record.metadata().state
            )));
        }
        Ok(())
    }

    fn output_type(params: &BeamformingMvParams) -> ElementType {
        params.output_type
    }

    // `uint16` is a selectable output type with no routine behind it
    fn dispatch_table() -> DispatchTable<Routine> {
        dispatch_table!(Routine, transform;
            i16 => [i16, f32],
            f32 => [i16, f32],
        )
    }
}

pub type BeamformingMvStage = Stage<BeamformingMv>;
