//! In-memory stream generator.

use std::rc::Rc;

use crate::algorithm::{StreamStatus, StreamingAlgorithm};
use crate::buffer::BufferUsage;
use crate::error::CoreError;
use crate::port::{Source, SourcePort};

/// Feeds a vector into a network as a stream, respecting backpressure.
///
/// The owned form copies elements into the output buffer as space opens up
/// across scheduler passes. [`VectorInput::shared`] instead aliases
/// caller-owned storage with no copying at all; consumers read straight from
/// the original allocation.
pub struct VectorInput<T: Clone + 'static> {
    output: Source<T>,
    data: Vec<T>,
    pushed: usize,
    aliased: bool,
}

impl<T: Clone + 'static> VectorInput<T> {
    /// Creates a generator that streams `data` out of its `data` port.
    pub fn new(data: Vec<T>) -> Self {
        Self {
            output: Source::new("data", BufferUsage::AudioStream),
            data,
            pushed: 0,
            aliased: false,
        }
    }

    /// Creates a zero-copy generator over caller-owned storage.
    pub fn shared(data: Rc<[T]>) -> Self {
        Self {
            output: Source::shared("data", data),
            data: Vec::new(),
            pushed: 0,
            aliased: true,
        }
    }
}

impl<T: Clone + 'static> StreamingAlgorithm for VectorInput<T> {
    fn name(&self) -> &'static str {
        "VectorInput"
    }

    fn output_names(&self) -> Vec<&str> {
        vec!["data"]
    }

    fn output_port(&self, name: &str) -> Option<&dyn SourcePort> {
        (name == "data").then_some(&self.output as &dyn SourcePort)
    }

    fn output_port_mut(&mut self, name: &str) -> Option<&mut dyn SourcePort> {
        (name == "data").then_some(&mut self.output as &mut dyn SourcePort)
    }

    fn process(&mut self) -> Result<StreamStatus, CoreError> {
        if self.aliased || self.pushed == self.data.len() {
            return Ok(StreamStatus::Pass);
        }
        let taken = self.output.push_slice(&self.data[self.pushed..])?;
        if taken == 0 {
            return Ok(StreamStatus::NoOutput);
        }
        self.pushed += taken;
        Ok(StreamStatus::Ok)
    }

    fn reset(&mut self) {
        self.pushed = 0;
    }

    fn exhausted(&self) -> bool {
        self.aliased || self.pushed == self.data.len()
    }
}
