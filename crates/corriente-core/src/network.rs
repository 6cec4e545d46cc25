//! Graph discovery and the cooperative single-threaded scheduler.
//!
//! A [`Network`] is built from one or more root (generator) nodes. Discovery
//! walks downstream edges depth-first, rejects cycles, and fixes a
//! producers-first execution order. [`Network::run`] then repeats full passes
//! over that order until a pass makes no progress; at that point every root
//! must report [`exhausted`](crate::StreamingAlgorithm::exhausted), otherwise
//! the run fails with a stall diagnosis instead of spinning forever.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::algorithm::{SharedNode, StreamStatus};
use crate::error::CoreError;

/// Cap on consecutive `Ok` activations of one node within a pass. Keeps a
/// prolific producer from starving the rest of the pass.
pub const MAX_GREEDY_RUNS: usize = 128;

#[derive(Clone, Copy, Eq, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

enum Frame {
    Enter(SharedNode),
    Exit(SharedNode),
}

fn key_of(node: &SharedNode) -> usize {
    Rc::as_ptr(node).cast::<()>() as usize
}

/// An executable graph of streaming nodes with a fixed schedule.
pub struct Network {
    roots: Vec<SharedNode>,
    order: Vec<SharedNode>,
}

impl Network {
    /// Builds a network from a single root.
    pub fn new(root: SharedNode) -> Result<Self, CoreError> {
        Self::with_roots(vec![root])
    }

    /// Builds a network from several roots sharing one schedule.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CycleDetected`] if the connection graph reachable
    /// from the roots is not acyclic.
    pub fn with_roots(roots: Vec<SharedNode>) -> Result<Self, CoreError> {
        let order = discover(&roots)?;
        debug!(nodes = order.len(), roots = roots.len(), "network compiled");
        Ok(Self { roots, order })
    }

    /// Nodes in execution order, producers first.
    pub fn nodes(&self) -> &[SharedNode] {
        &self.order
    }

    /// One full pass over the schedule.
    ///
    /// Each node is activated repeatedly while it reports
    /// [`StreamStatus::Ok`], up to [`MAX_GREEDY_RUNS`], so data drains as far
    /// downstream as it can within the pass. Returns whether any node did
    /// work.
    pub fn run_pass(&mut self) -> Result<bool, CoreError> {
        let mut progress = false;
        for node in &self.order {
            let mut runs = 0;
            loop {
                let status = node.borrow_mut().process()?;
                match status {
                    StreamStatus::Ok => {
                        progress = true;
                        runs += 1;
                        if runs >= MAX_GREEDY_RUNS {
                            break;
                        }
                    }
                    StreamStatus::NoInput | StreamStatus::NoOutput | StreamStatus::Pass => break,
                }
            }
        }
        Ok(progress)
    }

    /// Runs passes until quiescent, then verifies the roots drained cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StalledNetwork`] if no pass can make progress
    /// while some root still holds unpushed input. A tail shorter than a
    /// consumer's window is not a stall: the root has pushed everything it
    /// has, downstream simply never sees a full window.
    pub fn run(&mut self) -> Result<(), CoreError> {
        let mut passes = 0_usize;
        while self.run_pass()? {
            passes += 1;
        }
        for root in &self.roots {
            let guard = root.borrow();
            if !guard.exhausted() {
                return Err(CoreError::StalledNetwork {
                    node: guard.name().to_string(),
                });
            }
        }
        debug!(passes, "network run complete");
        Ok(())
    }

    /// Resets every node for a fresh run. Connections survive.
    pub fn reset(&mut self) {
        for node in &self.order {
            node.borrow_mut().reset();
        }
    }
}

/// Depth-first discovery producing a producers-first order, with cycle
/// rejection. Edges are weak; nodes already dropped are skipped.
fn discover(roots: &[SharedNode]) -> Result<Vec<SharedNode>, CoreError> {
    let mut marks: HashMap<usize, Mark> = HashMap::new();
    let mut post: Vec<SharedNode> = Vec::new();
    let mut stack: Vec<Frame> = roots
        .iter()
        .rev()
        .map(|r| Frame::Enter(Rc::clone(r)))
        .collect();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(node) => {
                let key = key_of(&node);
                match marks.get(&key) {
                    Some(Mark::Visiting) => {
                        let name = node.borrow().name().to_string();
                        return Err(CoreError::CycleDetected { node: name });
                    }
                    Some(Mark::Done) => continue,
                    None => {}
                }
                marks.insert(key, Mark::Visiting);
                let edges = node.borrow().downstream();
                stack.push(Frame::Exit(node));
                for edge in edges {
                    if let Some(next) = edge.upgrade() {
                        stack.push(Frame::Enter(next));
                    }
                }
            }
            Frame::Exit(node) => {
                marks.insert(key_of(&node), Mark::Done);
                post.push(node);
            }
        }
    }

    post.reverse();
    Ok(post)
}
