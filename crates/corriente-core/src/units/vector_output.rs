//! Stream terminator collecting everything into a vector.

use crate::algorithm::{StreamStatus, StreamingAlgorithm};
use crate::error::CoreError;
use crate::port::{Sink, SinkPort};

/// Collects a whole stream into memory.
///
/// Keep a concrete handle (`Rc<RefCell<VectorOutput<T>>>`) before coercing a
/// clone into the network, so the results stay reachable after the run.
pub struct VectorOutput<T: Clone + 'static> {
    input: Sink<T>,
    results: Vec<T>,
}

impl<T: Clone + 'static> VectorOutput<T> {
    /// Creates an empty collector with a `data` input port.
    pub fn new() -> Self {
        Self {
            input: Sink::new("data"),
            results: Vec::new(),
        }
    }

    /// Everything collected so far.
    pub fn results(&self) -> &[T] {
        &self.results
    }

    /// Takes the collected elements, leaving the collector empty.
    pub fn take(&mut self) -> Vec<T> {
        std::mem::take(&mut self.results)
    }
}

impl<T: Clone + 'static> Default for VectorOutput<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> StreamingAlgorithm for VectorOutput<T> {
    fn name(&self) -> &'static str {
        "VectorOutput"
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
        if let Some(batch) = self.input.with_available(<[T]>::to_vec) {
            self.results.extend(batch);
        }
        self.input.advance_by(n);
        Ok(StreamStatus::Ok)
    }

    fn reset(&mut self) {
        self.results.clear();
    }
}
