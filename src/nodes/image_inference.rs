use serde::{Deserialize, Serialize};
use sonoflow_macros::StageParams;

use super::Stage;
use crate::compute::{transform, Routine};
use crate::core::{ElementType, ImageState, Record, RecordKind, StageError, StageKind};
use crate::dispatch::DispatchTable;
use crate::dispatch_table;

/// Model inference on images. The model lives in the injected backend.
#[derive(StageParams, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[stage_meta(name = "ImageInference", category = "Processing")]
pub struct ImageInferenceParams {
    #[param(key = "factor", default = "1.0", min = "0.0", max = "2.0", description = "Factor")]
    pub factor: f64,

    #[param(
        key = "outputType",
        default = "ElementType::Float",
        choices = "ElementType::Float, ElementType::Uint8, ElementType::Int16",
        description = "Output type"
    )]
    pub output_type: ElementType,
}

pub struct ImageInference;

impl StageKind for ImageInference {
    type Params = ImageInferenceParams;

    const NAME: &'static str = "ImageInference";
    const OUTPUT_KIND: RecordKind = RecordKind::Image;
    const POST_STATE: ImageState = ImageState::Processed;
    const HOST_ONLY: bool = true;

    fn check_input(record: &Record) -> Result<(), StageError> {
        match record.kind() {
            RecordKind::Image => Ok(()),
            other => Err(StageError::TypeMismatch(format!(
                "expected image, got {:?} record",
                other
            ))),
        }
    }

    fn output_type(params: &ImageInferenceParams) -> ElementType {
        params.output_type
    }

    fn dispatch_table() -> DispatchTable<Routine> {
        dispatch_table!(Routine, transform;
            u8 => [u8, i16, f32],
            i16 => [u8, i16, f32],
            f32 => [u8, i16, f32],
        )
    }
}

pub type ImageInferenceStage = Stage<ImageInference>;
