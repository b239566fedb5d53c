use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sonoflow::compute::{DelayAndSumBackend, ScaleBackend};
use sonoflow::core::{Geometry, ImageState, Metadata, Payload, Record, RecordKind, Shape, Timestamps};
use sonoflow::source::RawFileSource;
use sonoflow::{BeamformingMvStage, ImageInferenceStage, StagePipeline};

const CHANNELS: usize = 16;
const SAMPLES: usize = 128;
const SCANLINES: usize = 32;
const FRAMES: usize = 8;

fn demo_metadata() -> Arc<Metadata> {
    Arc::new(Metadata::new(
        ImageState::RawDelayed,
        Geometry {
            scanlines: SCANLINES as u32,
            samples: SAMPLES as u32,
            channels: CHANNELS as u32,
            depth_mm: 60.0,
            ..Geometry::default()
        },
    ))
}

/// Synthetic delayed channel data: a bright reflector halfway down every line
fn synthetic_frames(metadata: &Arc<Metadata>) -> Result<Vec<Arc<Record>>> {
    let shape = Shape::new(CHANNELS, SAMPLES, SCANLINES);
    let mut frames = Vec::with_capacity(FRAMES);

    for frame in 0..FRAMES {
        let data: Vec<i16> = (0..shape.volume())
            .map(|i| {
                let sample = (i / CHANNELS) % SAMPLES;
                if sample.abs_diff(SAMPLES / 2) < 2 { 1000 } else { (i % 7) as i16 - 3 }
            })
            .collect();
        let time = frame as f64 * 0.02;
        let record = Record::new(
            RecordKind::RawData,
            Payload::from_vec(data),
            shape,
            metadata.clone(),
            Timestamps { receive: time, sync: time },
            frame as u64,
        )?;
        frames.push(Arc::new(record));
    }

    Ok(frames)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("Registered stages:");
    for descriptor in sonoflow::registry::catalog() {
        println!("  {} ({})", descriptor.name, descriptor.category);
        for param in &descriptor.parameters {
            println!("    {} = {}", param.key, param.default);
        }
    }
    println!();

    let beamformer = Arc::new(BeamformingMvStage::new("beamformer", DelayAndSumBackend::new())?);
    beamformer.configure(&serde_json::json!({ "subArraySize": 8, "temporalSmoothing": 2 }))?;

    let inference = Arc::new(ImageInferenceStage::new("inference", ScaleBackend::new())?);
    inference.configure(&serde_json::json!({ "factor": 0.5, "outputType": "uint8" }))?;

    let mut pipeline = StagePipeline::new(4);
    pipeline.add_stage(beamformer)?;
    pipeline.add_stage(inference)?;
    let mut output = pipeline.start()?;

    // Drained concurrently so triggers never wait on a full output channel
    let printer = tokio::spawn(async move {
        while let Some(record) = output.recv().await {
            let factor = record.metadata().specific_parameter("ImageInference.factor");
            println!(
                "frame {:>2}: {} {:?} {:?} factor={}",
                record.sequence_id(),
                record.element_type(),
                record.shape(),
                record.metadata().state,
                factor.map(|f| f.to_string()).unwrap_or_default(),
            );
        }
    });

    // Optional raw file of little-endian int16 frames in the demo geometry
    let metadata = demo_metadata();
    let frames = match std::env::args().nth(1) {
        Some(path) => RawFileSource::open(
            path,
            sonoflow::core::ElementType::Int16,
            Shape::new(CHANNELS, SAMPLES, SCANLINES),
            RecordKind::RawData,
            metadata.clone(),
        )?
        .records()
        .collect::<Result<Vec<_>>>()?,
        None => synthetic_frames(&metadata)?,
    };

    let half = frames.len() / 2;
    for (i, frame) in frames.into_iter().enumerate() {
        if i == half {
            pipeline.reconfigure("inference", "factor", &serde_json::json!(1.5)).await?;
        }
        pipeline.trigger(frame).await?;
    }

    // Valid value without a routine behind it: dropped and reported
    pipeline.reconfigure("beamformer", "outputType", &serde_json::json!("uint16")).await?;
    pipeline.trigger(synthetic_frames(&metadata)?.remove(0)).await?;

    pipeline.stop().await?;
    printer.await?;

    println!("\n{}", pipeline.monitor().generate_report());
    Ok(())
}
