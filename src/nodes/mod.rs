pub mod beamforming_mv;
pub mod image_inference;
pub mod stage;

pub use beamforming_mv::{BeamformingMv, BeamformingMvParams, BeamformingMvStage};
pub use image_inference::{ImageInference, ImageInferenceParams, ImageInferenceStage};
pub use stage::Stage;
