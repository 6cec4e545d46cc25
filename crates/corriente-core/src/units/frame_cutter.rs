//! Sliding-window framing of a sample stream.

use crate::algorithm::{StreamStatus, StreamingAlgorithm};
use crate::buffer::BufferUsage;
use crate::error::CoreError;
use crate::param::{ParamSpec, Parameters};
use crate::port::{Sink, SinkPort, Source, SourcePort};
use crate::types::Real;

/// Cuts a sample stream into frames of `frameSize` elements every `hopSize`
/// elements. With `hopSize < frameSize` consecutive frames overlap; the
/// acquire/release machinery of the input buffer does the retention, no
/// samples are copied ahead of time.
///
/// A tail shorter than a full frame is dropped: the stream ends cleanly after
/// the last complete frame.
pub struct FrameCutter {
    input: Sink<Real>,
    output: Source<Vec<Real>>,
    frame_size: usize,
    hop_size: usize,
    /// With `hopSize > frameSize`, the part of the last hop the producer had
    /// not yet delivered; consumed before the next cut.
    pending_skip: usize,
}

impl FrameCutter {
    /// Creates a cutter with default sizes (frame 1024, hop 512).
    pub fn new() -> Self {
        let mut cutter = Self {
            input: Sink::new("signal"),
            output: Source::new("frame", BufferUsage::SingleFrame),
            frame_size: 1024,
            hop_size: 512,
            pending_skip: 0,
        };
        // defaults always satisfy the window rules on an unattached sink
        let _ = cutter.input.set_sizes(1024, 512);
        cutter
    }

    /// Configured frame size.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Configured hop size.
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }
}

impl Default for FrameCutter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingAlgorithm for FrameCutter {
    fn name(&self) -> &'static str {
        "FrameCutter"
    }

    fn input_names(&self) -> Vec<&str> {
        vec!["signal"]
    }

    fn output_names(&self) -> Vec<&str> {
        vec!["frame"]
    }

    fn input_port(&self, name: &str) -> Option<&dyn SinkPort> {
        (name == "signal").then_some(&self.input as &dyn SinkPort)
    }

    fn input_port_mut(&mut self, name: &str) -> Option<&mut dyn SinkPort> {
        (name == "signal").then_some(&mut self.input as &mut dyn SinkPort)
    }

    fn output_port(&self, name: &str) -> Option<&dyn SourcePort> {
        (name == "frame").then_some(&self.output as &dyn SourcePort)
    }

    fn output_port_mut(&mut self, name: &str) -> Option<&mut dyn SourcePort> {
        (name == "frame").then_some(&mut self.output as &mut dyn SourcePort)
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("frameSize", "elements per output frame", "[1,inf)", 1024),
            ParamSpec::new("hopSize", "elements between frame starts", "[1,inf)", 512),
        ]
    }

    fn configure(&mut self, params: &Parameters) -> Result<(), CoreError> {
        let bound = Parameters::bind(&self.param_specs(), params, self.name())?;
        let frame_size = bound.int("frameSize")? as usize;
        let hop_size = bound.int("hopSize")? as usize;
        // validate the window before committing anything
        self.input
            .set_sizes(frame_size, hop_size.min(frame_size))?;
        self.frame_size = frame_size;
        self.hop_size = hop_size;
        self.pending_skip = 0;
        Ok(())
    }

    fn process(&mut self) -> Result<StreamStatus, CoreError> {
        if self.pending_skip > 0 {
            // finish the previous hop before cutting at the next frame start
            self.pending_skip -= self.input.advance_by(self.pending_skip);
            if self.pending_skip > 0 {
                return Ok(StreamStatus::NoInput);
            }
        }
        if !self.input.ready() {
            return Ok(StreamStatus::NoInput);
        }
        if !self.output.space_for(1) {
            return Ok(StreamStatus::NoOutput);
        }
        let Some(frame) = self.input.with_acquired(<[Real]>::to_vec) else {
            return Ok(StreamStatus::NoInput);
        };
        self.output.push(frame)?;
        if self.hop_size > self.frame_size {
            // gapped framing: skip the unused samples too; the producer may
            // not have delivered them all yet
            let skipped = self.input.advance_by(self.hop_size);
            self.pending_skip = self.hop_size - skipped;
        } else {
            self.input.advance();
        }
        Ok(StreamStatus::Ok)
    }

    fn reset(&mut self) {
        self.pending_skip = 0;
    }
}
