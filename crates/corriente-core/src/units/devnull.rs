//! Stream terminator that discards everything.

use crate::algorithm::{StreamStatus, StreamingAlgorithm};
use crate::error::CoreError;
use crate::port::{Sink, SinkPort};

/// Consumes and discards a stream.
///
/// Every source in a network needs a consumer, or its buffer fills and stalls
/// the producer; `DevNull` caps outputs nothing else reads.
pub struct DevNull<T: Clone + 'static> {
    input: Sink<T>,
}

impl<T: Clone + 'static> DevNull<T> {
    /// Creates a discarder with a `data` input port.
    pub fn new() -> Self {
        Self {
            input: Sink::new("data"),
        }
    }
}

impl<T: Clone + 'static> Default for DevNull<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> StreamingAlgorithm for DevNull<T> {
    fn name(&self) -> &'static str {
        "DevNull"
    }

    fn input_names(&self) -> Vec<&str> {
        vec!["data"]
    }

    fn input_port(&self, name: &str) -> Option<&dyn SinkPort> {
        (name == "data").then_some(&self.input as &dyn SinkPort)
    }

    fn input_port_mut(&mut self, name: &str) -> Option<&mut dyn SinkPort> {
        (name == "data").then_some(&mut self.input as &mut dyn SinkPort)
    }

    fn process(&mut self) -> Result<StreamStatus, CoreError> {
        let n = self.input.available();
        if n == 0 {
            return Ok(StreamStatus::NoInput);
        }
        self.input.advance_by(n);
        Ok(StreamStatus::Ok)
    }
}
