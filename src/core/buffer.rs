use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::element::{Element, ElementType};

/// Where a container's memory currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    Host,
    Device,
    Both,
}

impl Default for Location {
    fn default() -> Self {
        Location::Host
    }
}

/// Typed, shared element buffer
#[derive(Debug, Clone)]
pub struct Container<T> {
    data: Arc<Vec<T>>,
    location: Location,
    /// Execution stream the data was produced on
    stream: u32,
}

impl<T: Element> Container<T> {
    pub fn new(location: Location, stream: u32, data: Vec<T>) -> Self {
        Self {
            data: Arc::new(data),
            location,
            stream,
        }
    }

    pub fn host(data: Vec<T>) -> Self {
        Self::new(Location::Host, 0, data)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn stream(&self) -> u32 {
        self.stream
    }

    pub fn is_host(&self) -> bool {
        matches!(self.location, Location::Host | Location::Both)
    }

    /// Host-resident view of the same data. Memory is shared, not copied,
    /// since the buffer is immutable.
    pub fn to_host(&self) -> Self {
        if self.is_host() {
            return self.clone();
        }
        Self {
            data: self.data.clone(),
            location: Location::Both,
            stream: self.stream,
        }
    }

    /// Whether two containers share one allocation
    pub fn shares_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Record payload. The variant is the element type.
#[derive(Debug, Clone)]
pub enum Payload {
    Uint8(Container<u8>),
    Int16(Container<i16>),
    Uint16(Container<u16>),
    Int32(Container<i32>),
    Float(Container<f32>),
    Double(Container<f64>),
}

macro_rules! each_payload {
    ($payload:expr, $c:ident => $body:expr) => {
        match $payload {
            Payload::Uint8($c) => $body,
            Payload::Int16($c) => $body,
            Payload::Uint16($c) => $body,
            Payload::Int32($c) => $body,
            Payload::Float($c) => $body,
            Payload::Double($c) => $body,
        }
    };
}

impl Payload {
    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        T::into_payload(Container::host(data))
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Payload::Uint8(_) => ElementType::Uint8,
            Payload::Int16(_) => ElementType::Int16,
            Payload::Uint16(_) => ElementType::Uint16,
            Payload::Int32(_) => ElementType::Int32,
            Payload::Float(_) => ElementType::Float,
            Payload::Double(_) => ElementType::Double,
        }
    }

    pub fn len(&self) -> usize {
        each_payload!(self, c => c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn location(&self) -> Location {
        each_payload!(self, c => c.location())
    }

    pub fn stream(&self) -> u32 {
        each_payload!(self, c => c.stream())
    }

    /// Typed access; `None` if `T` is not this payload's element type
    pub fn get<T: Element>(&self) -> Option<&Container<T>> {
        T::container(self)
    }
}

impl<T: Element> From<Container<T>> for Payload {
    fn from(container: Container<T>) -> Self {
        T::into_payload(container)
    }
}
