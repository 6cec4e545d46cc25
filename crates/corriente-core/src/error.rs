//! Error types for the execution core.
//!
//! Errors fall into three families: configuration errors (invalid parameter,
//! type-mismatched connection, window violations) which are fatal to the call
//! that raised them, runtime data errors (ragged arrays, missing bindings)
//! which abort the current activation, and scheduler faults (a stalled network
//! with undrained root input). Flow-control statuses
//! ([`StreamStatus`](crate::StreamStatus)) are values, never errors.

use thiserror::Error;

use crate::pool::PoolError;

/// Errors raised by buffers, ports, algorithms, and the network scheduler.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A parameter name was passed that the algorithm does not declare.
    #[error("unknown parameter '{name}' for algorithm '{algorithm}'")]
    UnknownParameter {
        /// Algorithm that rejected the parameter.
        algorithm: String,
        /// The undeclared parameter name.
        name: String,
    },

    /// A parameter value fell outside its declared constraint.
    #[error("parameter '{name}' = {value} violates constraint {constraint}")]
    ParameterOutOfRange {
        /// Name of the offending parameter.
        name: String,
        /// Declared constraint string.
        constraint: String,
        /// Rendering of the rejected value.
        value: String,
    },

    /// A constraint string could not be parsed.
    #[error("invalid constraint '{constraint}': {reason}")]
    InvalidConstraint {
        /// The malformed constraint string.
        constraint: String,
        /// Why parsing failed.
        reason: String,
    },

    /// A parameter held a different type than the accessor expected.
    #[error("parameter '{name}': expected {expected}, found {found}")]
    ParameterTypeMismatch {
        /// Name of the parameter.
        name: String,
        /// The requested type.
        expected: &'static str,
        /// The stored type.
        found: &'static str,
    },

    /// A port name was requested that the algorithm does not declare.
    #[error("algorithm '{algorithm}' has no port named '{port}'")]
    UnknownPort {
        /// Algorithm that was queried.
        algorithm: String,
        /// The undeclared port name.
        port: String,
    },

    /// A source and sink of different element types were connected.
    // thiserror reserves the field name `source` for error chaining, so the
    // port name is `source_port`
    #[error(
        "cannot connect source '{source_port}' ({source_type}) to sink '{sink}' ({sink_type}): \
         element types differ"
    )]
    PortTypeMismatch {
        /// Source port name.
        source_port: String,
        /// Sink port name.
        sink: String,
        /// Source element type.
        source_type: &'static str,
        /// Sink element type.
        sink_type: &'static str,
    },

    /// A sink already reads from another source (fan-in is not allowed).
    #[error("sink '{sink}' is already connected; fan-in is not supported")]
    SinkAlreadyConnected {
        /// Sink port name.
        sink: String,
    },

    /// An operation required a connected port.
    #[error("port '{port}' is not connected")]
    NotConnected {
        /// Port name.
        port: String,
    },

    /// A node was connected to itself.
    #[error("node '{node}' cannot be connected to itself")]
    SelfConnection {
        /// Node name.
        node: String,
    },

    /// Following connections from the roots revisited a node on the current path.
    #[error("cycle detected through node '{node}'")]
    CycleDetected {
        /// A node on the cycle.
        node: String,
    },

    /// A sink's acquire size exceeds the buffer's maximum contiguous capacity.
    #[error("port '{port}' requests {requested} elements but the buffer holds at most {capacity}")]
    AcquireExceedsCapacity {
        /// Sink port name.
        port: String,
        /// Requested acquire size.
        requested: usize,
        /// Buffer's maximum contiguous capacity.
        capacity: usize,
    },

    /// Acquire/release sizes violate the windowing invariant.
    #[error(
        "port '{port}': invalid window (acquire {acquire}, release {release}); \
         release must be > 0 and <= acquire"
    )]
    InvalidWindow {
        /// Sink port name.
        port: String,
        /// Requested acquire size.
        acquire: usize,
        /// Requested release size.
        release: usize,
    },

    /// A producer tried to write into a buffer aliasing caller-owned storage.
    #[error("port '{port}' aliases shared storage and cannot be written")]
    SharedBufferWrite {
        /// Source port name.
        port: String,
    },

    /// A standard algorithm input binding was absent.
    #[error("missing input value '{name}'")]
    MissingValue {
        /// Name of the absent binding.
        name: String,
    },

    /// A value binding held a different type than the algorithm expected.
    #[error("value '{name}': expected {expected}, found {found}")]
    ValueTypeMismatch {
        /// Name of the binding.
        name: String,
        /// The requested type.
        expected: &'static str,
        /// The stored type.
        found: &'static str,
    },

    /// Rows of a nested array had inconsistent lengths.
    #[error("ragged matrix '{name}': expected row length {expected}, found {found}")]
    RaggedMatrix {
        /// Name of the offending binding.
        name: String,
        /// Length of the first row.
        expected: usize,
        /// Length of the mismatched row.
        found: usize,
    },

    /// An algorithm received an empty array where at least one element is required.
    #[error("input '{name}' is empty")]
    EmptyInput {
        /// Name of the empty input.
        name: String,
    },

    /// Tensor shape and data length disagree.
    #[error("tensor shape expects {expected} elements, data holds {found}")]
    InvalidShape {
        /// Product of the shape dimensions.
        expected: usize,
        /// Actual flat data length.
        found: usize,
    },

    /// A full scheduler pass made no progress while a root still holds input.
    #[error("network stalled: root '{node}' still has undrained input")]
    StalledNetwork {
        /// The root that could not hand off its remaining data.
        node: String,
    },

    /// A pool operation failed.
    #[error(transparent)]
    Pool(#[from] PoolError),
}
