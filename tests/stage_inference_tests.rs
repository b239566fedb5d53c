mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use sonoflow::compute::{BackendError, ComputeBackend, ComputeOutput, ComputeRequest, ScaleBackend};
use sonoflow::config::ParameterValue;
use sonoflow::core::{
    Container, ElementType, ErrorKind, ImageState, Location, Payload, ProcessingStage, Record, RecordKind,
    Shape, Timestamps,
};
use sonoflow::nodes::ImageInferenceStage;
use sonoflow::observability::ChannelReporter;

use common::{image, raw_i16};

/// `ScaleBackend` that takes its time, so configuration changes race it
struct SlowScale;

impl ComputeBackend for SlowScale {
    fn name(&self) -> &str {
        "slow-scale"
    }

    fn compute(&mut self, request: ComputeRequest<'_>) -> Result<ComputeOutput, BackendError> {
        let factor = request.parameters.get_as::<f64>("factor").unwrap_or(1.0) as f32;
        thread::sleep(Duration::from_millis(1));
        Ok(ComputeOutput {
            samples: request.samples.iter().map(|v| v * factor).collect(),
            shape: request.shape,
        })
    }
}

#[test]
fn test_scale_into_every_output_type() {
    let stage = ImageInferenceStage::new("ai", ScaleBackend::new()).unwrap();
    stage.reconfigure("factor", &json!(0.5)).unwrap();
    let metadata = common::metadata(ImageState::ScanConverted);

    let output = stage.receive(image(vec![10u8, 200], &metadata)).unwrap();
    assert_eq!(output.payload().get::<f32>().unwrap().as_slice(), &[5.0, 100.0]);
    assert_eq!(output.metadata().state, ImageState::Processed);

    stage.reconfigure("outputType", &json!("int16")).unwrap();
    let output = stage.receive(image(vec![-7.0f32, 9.0], &metadata)).unwrap();
    // Truncated toward zero
    assert_eq!(output.payload().get::<i16>().unwrap().as_slice(), &[-3, 4]);
}

#[test]
fn test_narrowing_saturates() {
    let stage = ImageInferenceStage::new("ai", ScaleBackend::new()).unwrap();
    stage.configure(&json!({ "factor": 2.0, "outputType": "uint8" })).unwrap();
    let metadata = common::metadata(ImageState::LogCompressed);

    let output = stage.receive(image(vec![200i16, -50, 20], &metadata)).unwrap();
    assert_eq!(output.element_type(), ElementType::Uint8);
    assert_eq!(output.payload().get::<u8>().unwrap().as_slice(), &[255, 0, 40]);
}

#[test]
fn test_device_input_is_moved_to_host() {
    let stage = ImageInferenceStage::new("ai", ScaleBackend::new()).unwrap();
    let metadata = common::metadata(ImageState::ScanConverted);

    let payload = Payload::from(Container::new(Location::Device, 2, vec![1.0f32, 2.0, 3.0]));
    let input = Record::new(
        RecordKind::Image,
        payload,
        Shape::new(3, 1, 1),
        metadata,
        Timestamps::default(),
        0,
    )
    .unwrap();

    let output = stage.receive(Arc::new(input)).unwrap();
    assert_eq!(output.payload().location(), Location::Host);
    assert_eq!(output.payload().stream(), 2);
}

#[test]
fn test_accepts_images_in_any_state() {
    let stage = ImageInferenceStage::new("ai", ScaleBackend::new()).unwrap();
    for state in [ImageState::Rf, ImageState::EnvelopeDetected, ImageState::Processed] {
        let metadata = common::metadata(state);
        let output = stage.receive(image(vec![1.0f32], &metadata)).unwrap();
        assert_eq!(output.metadata().state, ImageState::Processed);
    }
}

#[test]
fn test_rejects_raw_data() {
    let (reporter, reports) = ChannelReporter::new();
    let stage = ImageInferenceStage::with_reporter("ai", ScaleBackend::new(), Arc::new(reporter)).unwrap();
    let metadata = common::metadata(ImageState::RawDelayed);

    assert!(stage.receive(raw_i16(&metadata, 0)).is_none());
    assert_eq!(reports.try_recv().unwrap().kind, Some(ErrorKind::TypeMismatch));
}

#[test]
fn test_factor_domain() {
    let stage = ImageInferenceStage::new("ai", ScaleBackend::new()).unwrap();
    assert!(stage.reconfigure("factor", &json!(2.5)).is_err());
    assert!(stage.reconfigure("outputType", &json!("double")).is_err());
    assert_eq!(stage.parameter("factor").unwrap(), ParameterValue::Float(1.0));

    // Integers are accepted for float parameters
    assert_eq!(stage.reconfigure("factor", &json!(2)).unwrap(), ParameterValue::Float(2.0));
}

#[test]
fn test_concurrent_changes_never_tear() {
    let stage = Arc::new(ImageInferenceStage::new("ai", SlowScale).unwrap());
    let metadata = common::metadata(ImageState::ScanConverted);

    let reconfigurer = {
        let stage = stage.clone();
        thread::spawn(move || {
            for i in 0..50 {
                let factor = if i % 2 == 0 { 0.5 } else { 1.5 };
                stage.reconfigure("factor", &json!(factor)).unwrap();
                thread::sleep(Duration::from_micros(300));
            }
        })
    };

    let mut outputs = Vec::new();
    for _ in 0..50 {
        outputs.push(stage.receive(image(vec![1.0f32; 16], &metadata)).unwrap());
    }
    reconfigurer.join().unwrap();

    // Every record was computed and annotated under one configuration
    for output in outputs {
        let recorded = output
            .metadata()
            .specific_parameter("ImageInference.factor")
            .and_then(|v| v.as_f64())
            .unwrap() as f32;
        let samples = output.payload().get::<f32>().unwrap().as_slice();
        assert!(samples.iter().all(|v| *v == recorded), "{:?} vs {}", samples, recorded);
    }
}
