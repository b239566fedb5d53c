mod common;

use std::io::Write;
use std::sync::Arc;

use sonoflow::compute::DelayAndSumBackend;
use sonoflow::core::{ElementType, ImageState, ProcessingStage, RecordKind, Shape};
use sonoflow::nodes::BeamformingMvStage;
use sonoflow::source::RawFileSource;
use tempfile::NamedTempFile;

fn write_i16(values: &[i16]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for v in values {
        file.write_all(&v.to_le_bytes()).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_frames_decode_little_endian() {
    // Two frames of (2,2,1)
    let file = write_i16(&[1, -2, 300, -32768, 5, 6, 7, 8]);
    let metadata = common::metadata(ImageState::RawDelayed);

    let source = RawFileSource::open(
        file.path(),
        ElementType::Int16,
        Shape::new(2, 2, 1),
        RecordKind::RawData,
        metadata.clone(),
    )
    .unwrap();

    assert_eq!(source.frame_count(), 2);

    let first = source.record(0).unwrap();
    assert_eq!(first.element_type(), ElementType::Int16);
    assert_eq!(first.kind(), RecordKind::RawData);
    assert_eq!(first.payload().get::<i16>().unwrap().as_slice(), &[1, -2, 300, -32768]);

    let second = source.record(1).unwrap();
    assert_eq!(second.sequence_id(), 1);
    assert_eq!(second.payload().get::<i16>().unwrap().as_slice(), &[5, 6, 7, 8]);

    assert!(source.record(2).is_err());
}

#[test]
fn test_records_share_metadata() {
    let file = write_i16(&[0; 12]);
    let metadata = common::metadata(ImageState::RawDelayed);

    let source = RawFileSource::open(
        file.path(),
        ElementType::Int16,
        Shape::new(2, 1, 2),
        RecordKind::RawData,
        metadata.clone(),
    )
    .unwrap()
    .with_frame_interval(0.5);

    let records: Vec<_> = source.records().collect::<anyhow::Result<_>>().unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| Arc::ptr_eq(r.metadata(), &metadata)));
    assert_eq!(records[2].timestamps().receive, 1.0);
}

#[test]
fn test_float_frames() {
    let mut file = NamedTempFile::new().unwrap();
    for v in [0.5f32, -1.25, 3.0] {
        file.write_all(&v.to_le_bytes()).unwrap();
    }
    file.flush().unwrap();

    let source = RawFileSource::open(
        file.path(),
        ElementType::Float,
        Shape::new(3, 1, 1),
        RecordKind::Image,
        common::metadata(ImageState::ScanConverted),
    )
    .unwrap();

    let record = source.record(0).unwrap();
    assert_eq!(record.payload().get::<f32>().unwrap().as_slice(), &[0.5, -1.25, 3.0]);
}

#[test]
fn test_partial_frame_is_rejected() {
    // 5 int16 values cannot hold whole (2,2,1) frames
    let file = write_i16(&[1, 2, 3, 4, 5]);
    let result = RawFileSource::open(
        file.path(),
        ElementType::Int16,
        Shape::new(2, 2, 1),
        RecordKind::RawData,
        common::metadata(ImageState::RawDelayed),
    );

    let err = result.unwrap_err();
    assert!(err.to_string().contains("not a multiple"), "{}", err);
}

#[test]
fn test_overflowing_frame_shape_is_rejected() {
    let file = write_i16(&[1, 2, 3, 4]);
    let result = RawFileSource::open(
        file.path(),
        ElementType::Int16,
        Shape::new(usize::MAX / 2, 2, 1),
        RecordKind::RawData,
        common::metadata(ImageState::RawDelayed),
    );

    let err = result.unwrap_err();
    assert!(err.to_string().contains("overflows"), "{}", err);
}

#[test]
fn test_missing_and_empty_files() {
    let metadata = common::metadata(ImageState::RawDelayed);
    let missing = RawFileSource::open(
        "/nonexistent/frames.raw",
        ElementType::Int16,
        Shape::new(1, 1, 1),
        RecordKind::RawData,
        metadata.clone(),
    );
    assert!(missing.is_err());

    let empty = NamedTempFile::new().unwrap();
    let result = RawFileSource::open(empty.path(), ElementType::Int16, Shape::new(1, 1, 1), RecordKind::RawData, metadata);
    assert!(result.is_err());
}

#[test]
fn test_source_feeds_beamformer() {
    // 2 channels, 2 samples, 1 scanline per frame
    let file = write_i16(&[1, 2, 3, 4, 10, 20, 30, 40]);
    let metadata = common::metadata(ImageState::RawDelayed);
    let source = RawFileSource::open(
        file.path(),
        ElementType::Int16,
        Shape::new(2, 2, 1),
        RecordKind::RawData,
        metadata,
    )
    .unwrap();
    let stage = BeamformingMvStage::new("bf", DelayAndSumBackend::new()).unwrap();

    let outputs: Vec<_> = source
        .records()
        .map(|r| stage.receive(r.unwrap()).unwrap())
        .collect();

    assert_eq!(outputs[0].payload().get::<f32>().unwrap().as_slice(), &[3.0, 7.0]);
    assert_eq!(outputs[1].payload().get::<f32>().unwrap().as_slice(), &[30.0, 70.0]);
    assert_eq!(stage.metadata_derivations(), 1);
}
