//! Algorithm contracts: streaming (push-driven) and standard (call-driven).
//!
//! A [`StreamingAlgorithm`] lives inside a [`Network`](crate::Network): its
//! `process()` is activated repeatedly by the scheduler and reports one of the
//! [`StreamStatus`] flow-control outcomes. A standard [`Algorithm`] is a plain
//! function over [`ValueMap`](crate::ValueMap) bindings with no scheduling.
//!
//! Nodes are shared as `Rc<RefCell<dyn StreamingAlgorithm>>` handles; graph
//! edges hold [`WeakNode`]s so dropping a graph never leaks cycles.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::CoreError;
use crate::param::{ParamSpec, Parameters};
use crate::port::{SinkPort, SourcePort};
use crate::value::ValueMap;

/// Outcome of one streaming activation. These are flow control, not errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamStatus {
    /// Work was done; the scheduler may activate this node again immediately.
    Ok,
    /// Not enough input to act; wait for upstream.
    NoInput,
    /// Output buffer full; wait for downstream to consume.
    NoOutput,
    /// Nothing to do and never will be (pass-through or finished node).
    Pass,
}

/// Shared handle to a streaming node.
pub type SharedNode = Rc<RefCell<dyn StreamingAlgorithm>>;

/// Weak handle used for graph edges.
pub type WeakNode = Weak<RefCell<dyn StreamingAlgorithm>>;

/// Resolution target for a composite's forwarded port.
#[derive(Clone)]
pub struct PortProxy {
    /// Inner node owning the concrete port.
    pub node: SharedNode,
    /// Port name on the inner node.
    pub port: String,
}

/// A push-driven node scheduled by a [`Network`](crate::Network).
///
/// Only `name()` and `process()` carry obligations; everything else has a
/// do-nothing default so sources, sinks, and glue nodes stay short.
pub trait StreamingAlgorithm {
    /// Algorithm name, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Names of declared input ports.
    fn input_names(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Names of declared output ports.
    fn output_names(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Looks up an input port by name.
    fn input_port(&self, _name: &str) -> Option<&dyn SinkPort> {
        None
    }

    /// Looks up an output port by name.
    fn output_port(&self, _name: &str) -> Option<&dyn SourcePort> {
        None
    }

    /// Looks up an input port by name, mutably.
    fn input_port_mut(&mut self, _name: &str) -> Option<&mut dyn SinkPort> {
        None
    }

    /// Looks up an output port by name, mutably.
    fn output_port_mut(&mut self, _name: &str) -> Option<&mut dyn SourcePort> {
        None
    }

    /// Resolves a forwarded input port, for composites.
    fn proxied_input(&self, _name: &str) -> Option<PortProxy> {
        None
    }

    /// Resolves a forwarded output port, for composites.
    fn proxied_output(&self, _name: &str) -> Option<PortProxy> {
        None
    }

    /// Declared parameters.
    fn param_specs(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    /// Applies parameters. Must be atomic: on error the previous
    /// configuration stays in effect.
    fn configure(&mut self, _params: &Parameters) -> Result<(), CoreError> {
        Ok(())
    }

    /// One activation: consume what is ready, produce what fits.
    fn process(&mut self) -> Result<StreamStatus, CoreError>;

    /// Clears internal state for a fresh run. Connections survive.
    fn reset(&mut self) {}

    /// For root (generator) nodes: true once all data has been handed to the
    /// output buffer. The scheduler uses this to tell a clean end of stream
    /// from a stall.
    fn exhausted(&self) -> bool {
        true
    }

    /// Nodes reachable over one edge from this node's outputs.
    fn downstream(&self) -> Vec<WeakNode> {
        let mut edges = Vec::new();
        for name in self.output_names() {
            if let Some(port) = self.output_port(name) {
                edges.extend(port.downstream().iter().cloned());
            }
        }
        edges
    }
}

/// A call-driven algorithm over named value bindings.
pub trait Algorithm {
    /// Algorithm name, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Declared parameters.
    fn param_specs(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    /// Applies parameters. Must be atomic on error.
    fn configure(&mut self, _params: &Parameters) -> Result<(), CoreError> {
        Ok(())
    }

    /// Reads inputs from `inputs`, writes results into `outputs`.
    fn compute(&mut self, inputs: &ValueMap, outputs: &mut ValueMap) -> Result<(), CoreError>;

    /// Clears internal state (history, accumulators).
    fn reset(&mut self) {}
}

/// Wraps a streaming algorithm into a shared node handle.
pub fn shared<A: StreamingAlgorithm + 'static>(algorithm: A) -> SharedNode {
    Rc::new(RefCell::new(algorithm))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    impl StreamingAlgorithm for Nop {
        fn name(&self) -> &'static str {
            "Nop"
        }

        fn process(&mut self) -> Result<StreamStatus, CoreError> {
            Ok(StreamStatus::Pass)
        }
    }

    #[test]
    fn defaults_are_empty() {
        let node = shared(Nop);
        let guard = node.borrow();
        assert!(guard.input_names().is_empty());
        assert!(guard.output_names().is_empty());
        assert!(guard.input_port("x").is_none());
        assert!(guard.downstream().is_empty());
        assert!(guard.exhausted());
    }

    #[test]
    fn weak_edges_do_not_keep_nodes_alive() {
        let node = shared(Nop);
        let weak: WeakNode = Rc::downgrade(&node);
        drop(node);
        assert!(weak.upgrade().is_none());
    }
}
