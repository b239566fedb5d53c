use anyhow::{anyhow, Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::{Element, ElementType, Metadata, Payload, Record, RecordKind, Shape, Timestamps};

/// Replays frames stored back to back in a file of little-endian elements.
///
/// Every record shares the metadata `Arc` given at open time, so downstream
/// stages derive their output metadata once for the whole file.
pub struct RawFileSource {
    path: PathBuf,
    mmap: Mmap,
    element_type: ElementType,
    shape: Shape,
    kind: RecordKind,
    metadata: Arc<Metadata>,
    frame_bytes: usize,
    frame_interval: f64,
}

impl RawFileSource {
    pub fn open(
        path: impl AsRef<Path>,
        element_type: ElementType,
        shape: Shape,
        kind: RecordKind,
        metadata: Arc<Metadata>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let frame_bytes = shape
            .checked_volume()
            .and_then(|volume| volume.checked_mul(element_type.width()))
            .ok_or_else(|| anyhow!("Frame shape {:?} of {} overflows the address space", shape, element_type))?;
        if frame_bytes == 0 {
            return Err(anyhow!("Frame shape {:?} holds no elements", shape));
        }

        let file = File::open(&path).context(format!("Failed to open raw file {:?}", path))?;
        let len = file
            .metadata()
            .context(format!("Failed to stat raw file {:?}", path))?
            .len() as usize;
        if len == 0 {
            return Err(anyhow!("Raw file {:?} is empty", path));
        }
        if len % frame_bytes != 0 {
            return Err(anyhow!(
                "Raw file {:?} is {} bytes, not a multiple of the {}-byte frame ({} x {:?})",
                path,
                len,
                frame_bytes,
                element_type,
                shape
            ));
        }

        // The file is opened read-only and not expected to change while mapped
        let mmap = unsafe { Mmap::map(&file) }.context(format!("Failed to map raw file {:?}", path))?;

        tracing::debug!(
            path = %path.display(),
            frames = len / frame_bytes,
            element_type = %element_type,
            "raw file source opened"
        );

        Ok(Self {
            path,
            mmap,
            element_type,
            shape,
            kind,
            metadata,
            frame_bytes,
            frame_interval: 0.0,
        })
    }

    /// Seconds between consecutive frames, used for the record timestamps
    pub fn with_frame_interval(mut self, seconds: f64) -> Self {
        self.frame_interval = seconds;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn metadata(&self) -> &Arc<Metadata> {
        &self.metadata
    }

    pub fn frame_count(&self) -> usize {
        self.mmap.len() / self.frame_bytes
    }

    /// Decode frame `index` into a host-resident record
    pub fn record(&self, index: usize) -> Result<Arc<Record>> {
        let count = self.frame_count();
        if index >= count {
            return Err(anyhow!("Frame {} out of range, file has {} frames", index, count));
        }

        let start = index * self.frame_bytes;
        let bytes = &self.mmap[start..start + self.frame_bytes];
        let payload = match self.element_type {
            ElementType::Uint8 => decode::<u8>(bytes),
            ElementType::Int16 => decode::<i16>(bytes),
            ElementType::Uint16 => decode::<u16>(bytes),
            ElementType::Int32 => decode::<i32>(bytes),
            ElementType::Float => decode::<f32>(bytes),
            ElementType::Double => decode::<f64>(bytes),
        };

        let time = index as f64 * self.frame_interval;
        let record = Record::new(
            self.kind,
            payload,
            self.shape,
            self.metadata.clone(),
            Timestamps { receive: time, sync: time },
            index as u64,
        )?;
        Ok(Arc::new(record))
    }

    pub fn records(&self) -> impl Iterator<Item = Result<Arc<Record>>> + '_ {
        (0..self.frame_count()).map(move |index| self.record(index))
    }
}

fn decode<T: Element>(bytes: &[u8]) -> Payload {
    let data: Vec<T> = bytes.chunks_exact(T::WIDTH).map(T::read_le).collect();
    Payload::from_vec(data)
}

impl std::fmt::Debug for RawFileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFileSource")
            .field("path", &self.path)
            .field("element_type", &self.element_type)
            .field("shape", &self.shape)
            .field("frames", &self.frame_count())
            .finish()
    }
}
