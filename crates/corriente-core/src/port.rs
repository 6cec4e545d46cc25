//! Typed source and sink ports, and the connection operations between them.
//!
//! A [`Source`] owns a [`StreamBuffer`]; connecting a [`Sink`] registers a
//! reader on that buffer, so data flows without copying. Ports are generic
//! over their element type but connections are made through the object-safe
//! [`SourcePort`] / [`SinkPort`] traits, with a `TypeId` check standing in for
//! compile-time type equality at the graph boundary.
//!
//! [`connect`] and [`disconnect`] operate on node handles and resolve
//! composite port proxies before touching the underlying ports.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::algorithm::{SharedNode, WeakNode};
use crate::buffer::{BufferUsage, StreamBuffer};
use crate::error::CoreError;

/// Buffer handle shared between one source and its sinks.
pub type SharedBuffer<T> = Rc<RefCell<StreamBuffer<T>>>;

/// Producing end of a stream connection.
pub struct Source<T: Clone> {
    name: String,
    buffer: SharedBuffer<T>,
    downstream: Vec<WeakNode>,
}

impl<T: Clone + 'static> Source<T> {
    /// Creates a source with an owned buffer sized for `usage`.
    pub fn new(name: impl Into<String>, usage: BufferUsage) -> Self {
        Self {
            name: name.into(),
            buffer: Rc::new(RefCell::new(StreamBuffer::new(usage))),
            downstream: Vec::new(),
        }
    }

    /// Creates a source whose buffer aliases caller-owned storage.
    ///
    /// The data counts as fully produced; pushes through this source fail.
    pub fn shared(name: impl Into<String>, data: Rc<[T]>) -> Self {
        Self {
            name: name.into(),
            buffer: Rc::new(RefCell::new(StreamBuffer::shared(data))),
            downstream: Vec::new(),
        }
    }

    /// Returns true if `n` more elements fit before backpressure.
    pub fn space_for(&self, n: usize) -> bool {
        self.buffer.borrow().space() >= n
    }

    /// Pushes one element; `Ok(false)` means the window is full.
    pub fn push(&mut self, value: T) -> Result<bool, CoreError> {
        self.buffer.borrow_mut().try_push(value, &self.name)
    }

    /// Pushes elements until the window fills; returns how many were taken.
    pub fn push_slice(&mut self, values: &[T]) -> Result<usize, CoreError> {
        let mut buf = self.buffer.borrow_mut();
        let mut taken = 0;
        for value in values {
            if !buf.try_push(value.clone(), &self.name)? {
                break;
            }
            taken += 1;
        }
        Ok(taken)
    }

    /// Total number of elements ever produced through this source.
    pub fn total_produced(&self) -> usize {
        self.buffer.borrow().total_written()
    }

    pub(crate) fn buffer(&self) -> SharedBuffer<T> {
        Rc::clone(&self.buffer)
    }
}

/// Consuming end of a stream connection.
///
/// A sink reads windows of `acquire` elements and advances by `release`
/// elements, so overlapping windows fall out of `release < acquire`.
pub struct Sink<T: Clone> {
    name: String,
    buffer: Option<SharedBuffer<T>>,
    reader: usize,
    acquire: usize,
    release: usize,
}

impl<T: Clone + 'static> Sink<T> {
    /// Creates an unconnected sink reading one element at a time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buffer: None,
            reader: 0,
            acquire: 1,
            release: 1,
        }
    }

    /// Sets the window sizes.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidWindow`] unless `0 < release <= acquire`;
    /// [`CoreError::AcquireExceedsCapacity`] if a connected buffer cannot hold
    /// `acquire` elements at once.
    pub fn set_sizes(&mut self, acquire: usize, release: usize) -> Result<(), CoreError> {
        if release == 0 || release > acquire {
            return Err(CoreError::InvalidWindow {
                port: self.name.clone(),
                acquire,
                release,
            });
        }
        if let Some(buffer) = &self.buffer {
            let capacity = buffer.borrow().max_len();
            if acquire > capacity {
                return Err(CoreError::AcquireExceedsCapacity {
                    port: self.name.clone(),
                    requested: acquire,
                    capacity,
                });
            }
        }
        self.acquire = acquire;
        self.release = release;
        Ok(())
    }

    /// Returns the configured acquire size.
    pub fn acquire_size(&self) -> usize {
        self.acquire
    }

    /// Returns the configured release size.
    pub fn release_size(&self) -> usize {
        self.release
    }

    /// Returns how many unconsumed elements are waiting.
    pub fn available(&self) -> usize {
        match &self.buffer {
            Some(buffer) => buffer.borrow().available(self.reader),
            None => 0,
        }
    }

    /// Returns true if a full acquire window is waiting.
    pub fn ready(&self) -> bool {
        self.available() >= self.acquire
    }

    /// Runs `f` over the next acquire window, or returns `None` if the window
    /// is not full yet. Does not advance the cursor.
    pub fn with_acquired<R>(&self, f: impl FnOnce(&[T]) -> R) -> Option<R> {
        let buffer = self.buffer.as_ref()?;
        let guard = buffer.borrow();
        guard.read_slice(self.reader, self.acquire).map(f)
    }

    /// Runs `f` over everything currently waiting, regardless of window size.
    pub fn with_available<R>(&self, f: impl FnOnce(&[T]) -> R) -> Option<R> {
        let buffer = self.buffer.as_ref()?;
        let guard = buffer.borrow();
        let n = guard.available(self.reader);
        guard.read_slice(self.reader, n).map(f)
    }

    /// Advances the cursor by the release size; returns the actual advance.
    pub fn advance(&mut self) -> usize {
        self.advance_by(self.release)
    }

    /// Advances the cursor by up to `n` elements.
    ///
    /// Returns how far the cursor actually moved; it stops at the last
    /// produced element, so a skip past the end of the stream comes back
    /// short.
    pub fn advance_by(&mut self, n: usize) -> usize {
        match &self.buffer {
            Some(buffer) => buffer.borrow_mut().consume(self.reader, n),
            None => 0,
        }
    }

    /// Returns true if the sink is connected to a source.
    pub fn is_connected(&self) -> bool {
        self.buffer.is_some()
    }

    fn attach(&mut self, buffer: SharedBuffer<T>) -> Result<(), CoreError> {
        let capacity = buffer.borrow().max_len();
        if self.acquire > capacity {
            return Err(CoreError::AcquireExceedsCapacity {
                port: self.name.clone(),
                requested: self.acquire,
                capacity,
            });
        }
        self.reader = buffer.borrow_mut().add_reader();
        self.buffer = Some(buffer);
        Ok(())
    }

    fn detach(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.borrow_mut().remove_reader(self.reader);
        }
    }

    fn shares_buffer(&self, other: &SharedBuffer<T>) -> bool {
        self.buffer
            .as_ref()
            .is_some_and(|b| Rc::ptr_eq(b, other))
    }
}

/// Object-safe view of a [`Source`], used at the connection boundary.
pub trait SourcePort {
    /// Port name.
    fn name(&self) -> &str;
    /// `TypeId` of the element type.
    fn element_type(&self) -> TypeId;
    /// Printable element type name, for error messages.
    fn element_type_name(&self) -> &'static str;
    /// Wires `sink` to this source's buffer and records the downstream node.
    fn connect_sink(&mut self, sink: &mut dyn SinkPort, downstream: WeakNode)
    -> Result<(), CoreError>;
    /// Unwires `sink` and forgets the downstream node `to`.
    fn disconnect_sink(&mut self, sink: &mut dyn SinkPort, to: &SharedNode)
    -> Result<(), CoreError>;
    /// Nodes consuming from this source.
    fn downstream(&self) -> &[WeakNode];
}

/// Object-safe view of a [`Sink`], used at the connection boundary.
pub trait SinkPort {
    /// Port name.
    fn name(&self) -> &str;
    /// `TypeId` of the element type.
    fn element_type(&self) -> TypeId;
    /// Printable element type name, for error messages.
    fn element_type_name(&self) -> &'static str;
    /// Returns true if already wired to a source.
    fn is_connected(&self) -> bool;
    /// Downcast hook for the typed side of connection.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Clone + 'static> SourcePort for Source<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn element_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn element_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn connect_sink(
        &mut self,
        sink: &mut dyn SinkPort,
        downstream: WeakNode,
    ) -> Result<(), CoreError> {
        let sink_name = sink.name().to_string();
        if sink.element_type() != TypeId::of::<T>() {
            return Err(CoreError::PortTypeMismatch {
                source_port: self.name.clone(),
                sink: sink_name,
                source_type: std::any::type_name::<T>(),
                sink_type: sink.element_type_name(),
            });
        }
        if sink.is_connected() {
            return Err(CoreError::SinkAlreadyConnected { sink: sink_name });
        }
        // type check above guarantees the downcast
        let Some(typed) = sink.as_any_mut().downcast_mut::<Sink<T>>() else {
            return Err(CoreError::SinkAlreadyConnected { sink: sink_name });
        };
        typed.attach(self.buffer())?;
        self.downstream.push(downstream);
        Ok(())
    }

    fn disconnect_sink(
        &mut self,
        sink: &mut dyn SinkPort,
        to: &SharedNode,
    ) -> Result<(), CoreError> {
        let port_name = sink.name().to_string();
        let typed = sink
            .as_any_mut()
            .downcast_mut::<Sink<T>>()
            .ok_or_else(|| CoreError::NotConnected {
                port: port_name.clone(),
            })?;
        if !typed.shares_buffer(&self.buffer) {
            return Err(CoreError::NotConnected { port: port_name });
        }
        typed.detach();
        let target = Rc::downgrade(to);
        self.downstream.retain(|w| !w.ptr_eq(&target));
        Ok(())
    }

    fn downstream(&self) -> &[WeakNode] {
        &self.downstream
    }
}

impl<T: Clone + 'static> SinkPort for Sink<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn element_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn element_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn is_connected(&self) -> bool {
        self.is_connected()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// Composite proxy chains are shallow; anything deeper is a wiring mistake.
const MAX_PROXY_DEPTH: usize = 64;

fn resolve_output(node: &SharedNode, port: &str) -> Result<(SharedNode, String), CoreError> {
    let mut node = Rc::clone(node);
    let mut port = port.to_string();
    for _ in 0..MAX_PROXY_DEPTH {
        let next = node.borrow().proxied_output(&port);
        match next {
            Some(proxy) => {
                node = proxy.node;
                port = proxy.port;
            }
            None => return Ok((node, port)),
        }
    }
    let name = node.borrow().name().to_string();
    Err(CoreError::CycleDetected { node: name })
}

fn resolve_input(node: &SharedNode, port: &str) -> Result<(SharedNode, String), CoreError> {
    let mut node = Rc::clone(node);
    let mut port = port.to_string();
    for _ in 0..MAX_PROXY_DEPTH {
        let next = node.borrow().proxied_input(&port);
        match next {
            Some(proxy) => {
                node = proxy.node;
                port = proxy.port;
            }
            None => return Ok((node, port)),
        }
    }
    let name = node.borrow().name().to_string();
    Err(CoreError::CycleDetected { node: name })
}

/// Connects `from`'s output `output` to `to`'s input `input`.
///
/// Composite port proxies on either side are resolved to the inner concrete
/// ports, but the recorded downstream handle is the outer node `to`, so graph
/// discovery schedules composites as single units.
pub fn connect(
    from: &SharedNode,
    output: &str,
    to: &SharedNode,
    input: &str,
) -> Result<(), CoreError> {
    if Rc::ptr_eq(from, to) {
        let name = from.borrow().name().to_string();
        return Err(CoreError::SelfConnection { node: name });
    }
    let (src_node, src_port) = resolve_output(from, output)?;
    let (dst_node, dst_port) = resolve_input(to, input)?;
    if Rc::ptr_eq(&src_node, &dst_node) {
        let name = src_node.borrow().name().to_string();
        return Err(CoreError::SelfConnection { node: name });
    }

    let mut src = src_node.borrow_mut();
    let mut dst = dst_node.borrow_mut();
    let src_name = src.name();
    let dst_name = dst.name();
    let source = src
        .output_port_mut(&src_port)
        .ok_or_else(|| CoreError::UnknownPort {
            algorithm: src_name.to_string(),
            port: src_port.clone(),
        })?;
    let sink = dst
        .input_port_mut(&dst_port)
        .ok_or_else(|| CoreError::UnknownPort {
            algorithm: dst_name.to_string(),
            port: dst_port.clone(),
        })?;
    source.connect_sink(sink, Rc::downgrade(to))?;
    debug!(
        source = %format!("{src_name}.{src_port}"),
        sink = %format!("{dst_name}.{dst_port}"),
        "connected ports"
    );
    Ok(())
}

/// Severs a connection made by [`connect`].
pub fn disconnect(
    from: &SharedNode,
    output: &str,
    to: &SharedNode,
    input: &str,
) -> Result<(), CoreError> {
    let (src_node, src_port) = resolve_output(from, output)?;
    let (dst_node, dst_port) = resolve_input(to, input)?;

    let mut src = src_node.borrow_mut();
    let mut dst = dst_node.borrow_mut();
    let src_name = src.name();
    let dst_name = dst.name();
    let source = src
        .output_port_mut(&src_port)
        .ok_or_else(|| CoreError::UnknownPort {
            algorithm: src_name.to_string(),
            port: src_port.clone(),
        })?;
    let sink = dst
        .input_port_mut(&dst_port)
        .ok_or_else(|| CoreError::UnknownPort {
            algorithm: dst_name.to_string(),
            port: dst_port.clone(),
        })?;
    source.disconnect_sink(sink, to)?;
    debug!(
        source = %format!("{src_name}.{src_port}"),
        sink = %format!("{dst_name}.{dst_port}"),
        "disconnected ports"
    );
    Ok(())
}
