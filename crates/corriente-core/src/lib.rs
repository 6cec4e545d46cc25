//! Streaming execution core: buffers, ports, algorithms, scheduler, and the
//! results pool.
//!
//! Data moves through single-writer multi-reader [`StreamBuffer`]s connected
//! by typed [`Source`]/[`Sink`] port pairs. [`StreamingAlgorithm`]s are
//! activated by a cooperative single-threaded [`Network`] scheduler that
//! discovers the graph from its generator roots, fixes a producers-first
//! order, and repeats passes until the stream drains. Results land in a
//! thread-safe, namespaced [`Pool`].
//!
//! # Example
//!
//! Cut a signal into overlapping frames and collect them:
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use corriente_core::units::{FrameCutter, VectorInput, VectorOutput};
//! use corriente_core::{Network, Parameters, SharedNode, StreamingAlgorithm, connect, shared};
//!
//! # fn main() -> Result<(), corriente_core::CoreError> {
//! let input = shared(VectorInput::new((0..10).map(|i| i as f32).collect()));
//! let cutter = shared({
//!     let mut c = FrameCutter::new();
//!     c.configure(&Parameters::new().with("frameSize", 4).with("hopSize", 2))?;
//!     c
//! });
//! let collector = Rc::new(RefCell::new(VectorOutput::<Vec<f32>>::new()));
//! let collector_node: SharedNode = Rc::clone(&collector) as SharedNode;
//!
//! connect(&input, "data", &cutter, "signal")?;
//! connect(&cutter, "frame", &collector_node, "data")?;
//!
//! Network::new(input)?.run()?;
//! assert_eq!(collector.borrow().results().len(), 4);
//! # Ok(())
//! # }
//! ```

pub mod algorithm;
pub mod buffer;
pub mod composite;
pub mod error;
pub mod network;
pub mod param;
pub mod pool;
pub mod port;
pub mod types;
pub mod units;
pub mod value;

pub use algorithm::{
    Algorithm, PortProxy, SharedNode, StreamStatus, StreamingAlgorithm, WeakNode, shared,
};
pub use buffer::{BufferUsage, StreamBuffer};
pub use composite::{CompositeBody, ProcessStep};
pub use error::CoreError;
pub use network::{MAX_GREEDY_RUNS, Network};
pub use param::{Constraint, ParamSpec, ParamValue, Parameters};
pub use pool::{MergeMode, Pool, PoolError, PoolSingleValue, PoolValue};
pub use port::{SharedBuffer, Sink, SinkPort, Source, SourcePort, connect, disconnect};
pub use types::{Real, StereoSample, Tensor};
pub use value::{Value, ValueMap, ValueMapExt, matrix_from_rows};
