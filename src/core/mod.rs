pub mod buffer;
pub mod element;
pub mod error;
pub mod metadata;
pub mod phase;
pub mod record;
pub mod stage;

pub use buffer::{Container, Location, Payload};
pub use element::{Element, ElementType, WorkType};
pub use error::{ErrorKind, RecordError, StageError};
pub use metadata::{Geometry, ImageState, Metadata, MetadataCache};
pub use phase::{PhaseCell, StagePhase};
pub use record::{Record, RecordKind, Shape, Timestamps};
pub use stage::{ProcessingStage, StageKind};
