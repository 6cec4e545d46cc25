//! Composite algorithms: an outer node wrapping a private sub-network.
//!
//! A composite declares which inner ports stand for its own inputs and
//! outputs, and a process order describing how to drive the inner nodes. The
//! outer scheduler sees the composite as a single node; connections made to
//! its forwarded ports are resolved to the inner concrete ports, while graph
//! edges still point at the composite itself.
//!
//! Concrete composites embed a [`CompositeBody`] and delegate the port,
//! process, and reset hooks of
//! [`StreamingAlgorithm`](crate::StreamingAlgorithm) to it.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use crate::algorithm::{PortProxy, SharedNode, StreamStatus, WeakNode};
use crate::error::CoreError;
use crate::network::Network;

/// One step of a composite's process order.
pub enum ProcessStep {
    /// Drive the sub-network rooted at this node until it is quiescent.
    Chain(SharedNode),
    /// Activate this node exactly once per outer activation.
    Single(SharedNode),
}

/// Reusable innards for composite algorithms: forwarding tables plus the
/// compiled process order.
#[derive(Default)]
pub struct CompositeBody {
    steps: Vec<ProcessStep>,
    /// One compiled sub-network per step; `None` for `Single` steps.
    chains: Vec<Option<Network>>,
    inputs: BTreeMap<String, (SharedNode, String)>,
    outputs: BTreeMap<String, (SharedNode, String)>,
}

impl CompositeBody {
    /// Creates an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwards the composite input `name` to `port` on `node`.
    pub fn declare_input(&mut self, name: impl Into<String>, node: &SharedNode, port: &str) {
        self.inputs
            .insert(name.into(), (Rc::clone(node), port.to_string()));
    }

    /// Forwards the composite output `name` to `port` on `node`.
    pub fn declare_output(&mut self, name: impl Into<String>, node: &SharedNode, port: &str) {
        self.outputs
            .insert(name.into(), (Rc::clone(node), port.to_string()));
    }

    /// Fixes the process order and compiles the chain sub-networks.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CycleDetected`] if a chain's sub-graph is cyclic.
    pub fn set_process_order(&mut self, steps: Vec<ProcessStep>) -> Result<(), CoreError> {
        let mut chains = Vec::with_capacity(steps.len());
        for step in &steps {
            match step {
                ProcessStep::Chain(root) => {
                    chains.push(Some(Network::new(Rc::clone(root))?));
                }
                ProcessStep::Single(_) => chains.push(None),
            }
        }
        debug!(steps = steps.len(), "composite process order compiled");
        self.steps = steps;
        self.chains = chains;
        Ok(())
    }

    /// Tears down the process order and forwarding tables, for reconfigure.
    pub fn clear(&mut self) {
        self.steps.clear();
        self.chains.clear();
        self.inputs.clear();
        self.outputs.clear();
    }

    /// Declared composite input names.
    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.keys().map(String::as_str).collect()
    }

    /// Declared composite output names.
    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.keys().map(String::as_str).collect()
    }

    /// Resolves a forwarded input port.
    pub fn proxied_input(&self, name: &str) -> Option<PortProxy> {
        self.inputs.get(name).map(|(node, port)| PortProxy {
            node: Rc::clone(node),
            port: port.clone(),
        })
    }

    /// Resolves a forwarded output port.
    pub fn proxied_output(&self, name: &str) -> Option<PortProxy> {
        self.outputs.get(name).map(|(node, port)| PortProxy {
            node: Rc::clone(node),
            port: port.clone(),
        })
    }

    /// One outer activation: drain every chain, touch every single step once.
    ///
    /// Returns [`StreamStatus::Ok`] if any chain pass did work, otherwise
    /// [`StreamStatus::NoInput`]. Single steps run for their side effects and
    /// do not count toward progress.
    pub fn process(&mut self) -> Result<StreamStatus, CoreError> {
        let mut progress = false;
        for (step, chain) in self.steps.iter().zip(self.chains.iter_mut()) {
            match (step, chain) {
                (ProcessStep::Chain(_), Some(network)) => {
                    while network.run_pass()? {
                        progress = true;
                    }
                }
                (ProcessStep::Single(node), _) => {
                    node.borrow_mut().process()?;
                }
                (ProcessStep::Chain(_), None) => {}
            }
        }
        Ok(if progress {
            StreamStatus::Ok
        } else {
            StreamStatus::NoInput
        })
    }

    /// Resets every inner node reachable from the process order.
    pub fn reset(&mut self) {
        for (step, chain) in self.steps.iter().zip(self.chains.iter_mut()) {
            match (step, chain) {
                (ProcessStep::Chain(_), Some(network)) => network.reset(),
                (ProcessStep::Single(node), _) => node.borrow_mut().reset(),
                (ProcessStep::Chain(_), None) => {}
            }
        }
    }

    /// True once every step's entry node reports end of input.
    pub fn exhausted(&self) -> bool {
        self.steps.iter().all(|step| match step {
            ProcessStep::Chain(node) | ProcessStep::Single(node) => node.borrow().exhausted(),
        })
    }

    /// Outer nodes consuming from the composite's forwarded outputs.
    pub fn downstream(&self) -> Vec<WeakNode> {
        let mut edges = Vec::new();
        for (node, port) in self.outputs.values() {
            let guard = node.borrow();
            if let Some(source) = guard.output_port(port) {
                edges.extend(source.downstream().iter().cloned());
            }
        }
        edges
    }
}
