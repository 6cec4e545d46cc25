//! Global algorithm registry: look up descriptors and build instances by name.
//!
//! The registry is process-wide state behind a lock. [`init`] populates it
//! with the built-in algorithms and is idempotent; [`shutdown`] tears it down
//! (mainly for tests). Applications extend it at startup with
//! [`register_streaming`] / [`register_standard`].
//!
//! Factories must be `Send + Sync` so the registry itself can be shared, but
//! the streaming nodes they build are single-threaded handles: create them on
//! the thread that runs the network.

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use corriente_core::units::{DevNull, FrameCutter, Mean, VectorOutput};
use corriente_core::{Algorithm, Real, SharedNode, shared};

/// Whether an algorithm is streaming (scheduled) or standard (call-driven).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlgorithmKind {
    /// Call-driven, computes over value maps.
    Standard,
    /// Push-driven, scheduled inside a network.
    Streaming,
}

/// Coarse grouping used by browsing UIs and docs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlgorithmCategory {
    /// Stream endpoints: generators, collectors, sinks.
    InputOutput,
    /// Framing, routing, and glue.
    Utility,
    /// Descriptive statistics.
    Statistics,
}

impl AlgorithmCategory {
    /// Display name of the category.
    pub const fn name(self) -> &'static str {
        match self {
            AlgorithmCategory::InputOutput => "Input/Output",
            AlgorithmCategory::Utility => "Utility",
            AlgorithmCategory::Statistics => "Statistics",
        }
    }
}

/// Static metadata describing a registered algorithm.
#[derive(Clone, Copy, Debug)]
pub struct AlgorithmDescriptor {
    /// Unique algorithm name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Browsing category.
    pub category: AlgorithmCategory,
    /// Streaming or standard.
    pub kind: AlgorithmKind,
}

/// Errors raised by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// [`init`] has not been called (or [`shutdown`] already was).
    #[error("algorithm registry is not initialized")]
    NotInitialized,

    /// No algorithm registered under this name and kind.
    #[error("unknown algorithm '{name}'")]
    UnknownAlgorithm {
        /// The requested name.
        name: String,
    },

    /// The name is taken by another registration of the same kind.
    #[error("algorithm '{name}' is already registered")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },
}

type StreamingFactory = Box<dyn Fn() -> SharedNode + Send + Sync>;
type StandardFactory = Box<dyn Fn() -> Box<dyn Algorithm> + Send + Sync>;

#[derive(Default)]
struct Registry {
    streaming: HashMap<&'static str, (AlgorithmDescriptor, StreamingFactory)>,
    standard: HashMap<&'static str, (AlgorithmDescriptor, StandardFactory)>,
}

static REGISTRY: RwLock<Option<Registry>> = RwLock::new(None);

/// Initializes the registry with the built-in algorithms. Idempotent.
pub fn init() {
    let mut guard = REGISTRY.write();
    if guard.is_some() {
        return;
    }
    let mut registry = Registry::default();
    register_builtins(&mut registry);
    debug!(
        streaming = registry.streaming.len(),
        standard = registry.standard.len(),
        "algorithm registry initialized"
    );
    *guard = Some(registry);
}

/// Clears the registry. Subsequent lookups fail until [`init`] runs again.
pub fn shutdown() {
    *REGISTRY.write() = None;
}

/// Returns true between [`init`] and [`shutdown`].
pub fn is_initialized() -> bool {
    REGISTRY.read().is_some()
}

/// Registers a streaming algorithm factory.
pub fn register_streaming(
    descriptor: AlgorithmDescriptor,
    factory: impl Fn() -> SharedNode + Send + Sync + 'static,
) -> Result<(), RegistryError> {
    let mut guard = REGISTRY.write();
    let registry = guard.as_mut().ok_or(RegistryError::NotInitialized)?;
    if registry.streaming.contains_key(descriptor.name) {
        return Err(RegistryError::DuplicateName {
            name: descriptor.name.to_string(),
        });
    }
    registry
        .streaming
        .insert(descriptor.name, (descriptor, Box::new(factory)));
    Ok(())
}

/// Registers a standard algorithm factory.
pub fn register_standard(
    descriptor: AlgorithmDescriptor,
    factory: impl Fn() -> Box<dyn Algorithm> + Send + Sync + 'static,
) -> Result<(), RegistryError> {
    let mut guard = REGISTRY.write();
    let registry = guard.as_mut().ok_or(RegistryError::NotInitialized)?;
    if registry.standard.contains_key(descriptor.name) {
        return Err(RegistryError::DuplicateName {
            name: descriptor.name.to_string(),
        });
    }
    registry
        .standard
        .insert(descriptor.name, (descriptor, Box::new(factory)));
    Ok(())
}

/// Builds a streaming node by name.
pub fn create_streaming(name: &str) -> Result<SharedNode, RegistryError> {
    let guard = REGISTRY.read();
    let registry = guard.as_ref().ok_or(RegistryError::NotInitialized)?;
    let (_, factory) = registry
        .streaming
        .get(name)
        .ok_or_else(|| RegistryError::UnknownAlgorithm {
            name: name.to_string(),
        })?;
    Ok(factory())
}

/// Builds a standard algorithm by name.
pub fn create_standard(name: &str) -> Result<Box<dyn Algorithm>, RegistryError> {
    let guard = REGISTRY.read();
    let registry = guard.as_ref().ok_or(RegistryError::NotInitialized)?;
    let (_, factory) = registry
        .standard
        .get(name)
        .ok_or_else(|| RegistryError::UnknownAlgorithm {
            name: name.to_string(),
        })?;
    Ok(factory())
}

/// All registered descriptors, sorted by name.
pub fn descriptors() -> Result<Vec<AlgorithmDescriptor>, RegistryError> {
    let guard = REGISTRY.read();
    let registry = guard.as_ref().ok_or(RegistryError::NotInitialized)?;
    let mut all: Vec<AlgorithmDescriptor> = registry
        .streaming
        .values()
        .map(|(d, _)| *d)
        .chain(registry.standard.values().map(|(d, _)| *d))
        .collect();
    all.sort_by_key(|d| d.name);
    Ok(all)
}

fn register_builtins(registry: &mut Registry) {
    let streaming: [(AlgorithmDescriptor, StreamingFactory); 3] = [
        (
            AlgorithmDescriptor {
                name: "FrameCutter",
                description: "Cuts a sample stream into overlapping frames",
                category: AlgorithmCategory::Utility,
                kind: AlgorithmKind::Streaming,
            },
            Box::new(|| shared(FrameCutter::new())),
        ),
        (
            AlgorithmDescriptor {
                name: "DevNull",
                description: "Consumes and discards a real-valued stream",
                category: AlgorithmCategory::InputOutput,
                kind: AlgorithmKind::Streaming,
            },
            Box::new(|| shared(DevNull::<Real>::new())),
        ),
        (
            AlgorithmDescriptor {
                name: "VectorOutput",
                description: "Collects a real-valued stream into memory",
                category: AlgorithmCategory::InputOutput,
                kind: AlgorithmKind::Streaming,
            },
            Box::new(|| shared(VectorOutput::<Real>::new())),
        ),
    ];
    for (descriptor, factory) in streaming {
        registry.streaming.insert(descriptor.name, (descriptor, factory));
    }

    let standard: [(AlgorithmDescriptor, StandardFactory); 1] = [(
        AlgorithmDescriptor {
            name: "Mean",
            description: "Arithmetic mean of a real vector",
            category: AlgorithmCategory::Statistics,
            kind: AlgorithmKind::Standard,
        },
        Box::new(|| Box::new(Mean::new()) as Box<dyn Algorithm>),
    )];
    for (descriptor, factory) in standard {
        registry.standard.insert(descriptor.name, (descriptor, factory));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::{Mutex, MutexGuard};

    // the registry is process-global; serialize tests that touch it
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        TEST_LOCK.lock()
    }

    #[test]
    fn init_is_idempotent() {
        let _guard = serial();
        init();
        init();
        assert!(is_initialized());
        let all = descriptors().unwrap();
        assert!(all.iter().any(|d| d.name == "FrameCutter"));
        assert!(all.iter().any(|d| d.name == "Mean"));
    }

    #[test]
    fn create_streaming_builds_fresh_nodes() {
        use corriente_core::StreamingAlgorithm;
        let _guard = serial();
        init();
        let a = create_streaming("FrameCutter").unwrap();
        let b = create_streaming("FrameCutter").unwrap();
        assert!(!std::rc::Rc::ptr_eq(&a, &b));
        assert_eq!(a.borrow().name(), "FrameCutter");
    }

    #[test]
    fn unknown_name_is_error() {
        let _guard = serial();
        init();
        assert!(matches!(
            create_streaming("Nope"),
            Err(RegistryError::UnknownAlgorithm { .. })
        ));
        assert!(matches!(
            create_standard("Nope"),
            Err(RegistryError::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn standard_algorithms_compute() {
        let _guard = serial();
        init();
        use corriente_core::{Value, ValueMap, ValueMapExt};
        let mut mean = create_standard("Mean").unwrap();
        let mut inputs = ValueMap::new();
        inputs.insert("array".into(), Value::VectorReal(vec![2.0, 4.0]));
        let mut outputs = ValueMap::new();
        mean.compute(&inputs, &mut outputs).unwrap();
        assert_eq!(outputs.real("mean").unwrap(), 3.0);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let _guard = serial();
        init();
        let descriptor = AlgorithmDescriptor {
            name: "FrameCutter",
            description: "dup",
            category: AlgorithmCategory::Utility,
            kind: AlgorithmKind::Streaming,
        };
        let err = register_streaming(descriptor, || shared(FrameCutter::new())).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName { .. }));
    }

    #[test]
    fn full_lifecycle_round_trip() {
        use corriente_core::{Parameters, StreamingAlgorithm};
        let _guard = serial();
        init();

        let cutter = create_streaming("FrameCutter").unwrap();
        cutter
            .borrow_mut()
            .configure(&Parameters::new().with("frameSize", 256).with("hopSize", 128))
            .unwrap();

        shutdown();
        assert!(!is_initialized());
        assert!(matches!(
            create_streaming("FrameCutter"),
            Err(RegistryError::NotInitialized)
        ));

        init();
        assert!(create_streaming("FrameCutter").is_ok());
    }
}
