//! Closure-backed node for one-shot side effects.

use crate::algorithm::{StreamStatus, StreamingAlgorithm};
use crate::error::CoreError;

/// Runs a closure on every activation, reporting [`StreamStatus::Pass`].
///
/// Used for `Single` steps in composite process orders: post-processing that
/// fires once per outer activation (normalizing a pool descriptor, flushing
/// aggregated state) without taking part in stream flow.
pub struct FnStage {
    name: &'static str,
    body: Box<dyn FnMut() -> Result<(), CoreError>>,
}

impl FnStage {
    /// Wraps a closure as a streaming node.
    pub fn new(name: &'static str, body: impl FnMut() -> Result<(), CoreError> + 'static) -> Self {
        Self {
            name,
            body: Box::new(body),
        }
    }
}

impl StreamingAlgorithm for FnStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&mut self) -> Result<StreamStatus, CoreError> {
        (self.body)()?;
        Ok(StreamStatus::Pass)
    }
}
