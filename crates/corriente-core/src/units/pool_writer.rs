//! Stream terminator that accumulates into a [`Pool`].

use std::sync::Arc;

use crate::algorithm::{StreamStatus, StreamingAlgorithm};
use crate::error::CoreError;
use crate::pool::{Pool, PoolValue};
use crate::port::{Sink, SinkPort};

/// Appends every element of a stream under one pool descriptor.
pub struct PoolWriter<T: PoolValue> {
    input: Sink<T>,
    pool: Arc<Pool>,
    key: String,
}

impl<T: PoolValue> PoolWriter<T> {
    /// Creates a writer appending to `key` in `pool`, with a `data` input.
    pub fn new(pool: Arc<Pool>, key: impl Into<String>) -> Self {
        Self {
            input: Sink::new("data"),
            pool,
            key: key.into(),
        }
    }
}

impl<T: PoolValue> StreamingAlgorithm for PoolWriter<T> {
    fn name(&self) -> &'static str {
        "PoolWriter"
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
        let batch = self.input.with_available(<[T]>::to_vec).unwrap_or_default();
        for value in batch {
            self.pool.add(&self.key, value)?;
        }
        self.input.advance_by(n);
        Ok(StreamStatus::Ok)
    }
}
