//! Thread-safe storage of named analysis results.
//!
//! A [`Pool`] maps dot-separated descriptor names (`"lowlevel.mfcc"`) to
//! either accumulating multi-value entries (each `add` appends) or
//! last-write-wins single values (`set`). Each supported element type lives in
//! its own map behind its own lock, so concurrent appends to existing
//! descriptors of different types never contend.
//!
//! Structural changes (inserting a new descriptor name) take every lock in a
//! fixed order, which makes the cross-type namespace rules enforceable: a
//! descriptor name may not coexist with an equal name of another type, nor
//! with an ancestor or descendant name in the namespace tree.

use std::collections::HashMap;

use parking_lot::{RwLock, RwLockWriteGuard};
use thiserror::Error;

use crate::types::{Real, StereoSample, Tensor};

/// Errors raised by [`Pool`] operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The descriptor name exists already under a different type.
    #[error("descriptor '{key}' already exists with a different type")]
    NameConflict {
        /// The conflicting name.
        key: String,
    },

    /// An existing descriptor is an ancestor of the new name.
    #[error("descriptor '{key}' would nest under existing descriptor '{parent}'")]
    ParentConflict {
        /// The rejected name.
        key: String,
        /// The existing ancestor descriptor.
        parent: String,
    },

    /// An existing descriptor is a descendant of the new name.
    #[error("descriptor '{key}' would become a namespace above existing '{child}'")]
    ChildConflict {
        /// The rejected name.
        key: String,
        /// The existing descendant descriptor.
        child: String,
    },

    /// No descriptor with this name and type.
    #[error("descriptor '{key}' not found")]
    NotFound {
        /// The requested name.
        key: String,
    },

    /// A merge hit an existing descriptor without a merge mode.
    #[error("descriptor '{key}' already exists; a merge mode is required")]
    MergeModeRequired {
        /// The target name.
        key: String,
    },

    /// Interleave merging requires equal lengths on both sides.
    #[error(
        "cannot interleave '{key}': existing length {existing} != incoming length {incoming}"
    )]
    InterleaveLengthMismatch {
        /// The target name.
        key: String,
        /// Length already stored.
        existing: usize,
        /// Length of the incoming values.
        incoming: usize,
    },

    /// Single-value descriptors only support replace merging.
    #[error("single-value descriptor '{key}' only supports replace merging")]
    SingleValueMergeUnsupported {
        /// The target name.
        key: String,
    },

    /// A checked insert rejected a non-finite value.
    #[error("value for '{key}' is not finite")]
    InvalidValue {
        /// The target name.
        key: String,
    },
}

/// How incoming values combine with an existing descriptor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergeMode {
    /// Incoming values follow the existing ones.
    Append,
    /// Incoming values supersede the existing ones.
    Replace,
    /// Existing and incoming values alternate; lengths must match.
    Interleave,
}

type Bucket<T> = RwLock<HashMap<String, Vec<T>>>;
type SingleBucket<T> = RwLock<HashMap<String, T>>;

/// Write guards over every map, acquired in declaration order.
#[doc(hidden)]
pub struct AllGuards<'a> {
    real: RwLockWriteGuard<'a, HashMap<String, Vec<Real>>>,
    string: RwLockWriteGuard<'a, HashMap<String, Vec<String>>>,
    vector_real: RwLockWriteGuard<'a, HashMap<String, Vec<Vec<Real>>>>,
    vector_string: RwLockWriteGuard<'a, HashMap<String, Vec<Vec<String>>>>,
    stereo: RwLockWriteGuard<'a, HashMap<String, Vec<StereoSample>>>,
    tensor: RwLockWriteGuard<'a, HashMap<String, Vec<Tensor>>>,
    single_real: RwLockWriteGuard<'a, HashMap<String, Real>>,
    single_string: RwLockWriteGuard<'a, HashMap<String, String>>,
    single_vector_real: RwLockWriteGuard<'a, HashMap<String, Vec<Real>>>,
    single_vector_string: RwLockWriteGuard<'a, HashMap<String, Vec<String>>>,
    single_tensor: RwLockWriteGuard<'a, HashMap<String, Tensor>>,
}

impl AllGuards<'_> {
    fn all_names(&self) -> impl Iterator<Item = &String> {
        self.real
            .keys()
            .chain(self.string.keys())
            .chain(self.vector_real.keys())
            .chain(self.vector_string.keys())
            .chain(self.stereo.keys())
            .chain(self.tensor.keys())
            .chain(self.single_real.keys())
            .chain(self.single_string.keys())
            .chain(self.single_vector_real.keys())
            .chain(self.single_vector_string.keys())
            .chain(self.single_tensor.keys())
    }

    /// Namespace rules for a name about to be inserted. The caller has
    /// already ruled out an exact match in the target map itself.
    fn validate_key(&self, key: &str) -> Result<(), PoolError> {
        let as_parent = format!("{key}.");
        for name in self.all_names() {
            if name == key {
                return Err(PoolError::NameConflict {
                    key: key.to_string(),
                });
            }
            if name.starts_with(&as_parent) {
                return Err(PoolError::ChildConflict {
                    key: key.to_string(),
                    child: name.clone(),
                });
            }
            if key.starts_with(&format!("{name}.")) {
                return Err(PoolError::ParentConflict {
                    key: key.to_string(),
                    parent: name.clone(),
                });
            }
        }
        Ok(())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Element types storable as accumulating (multi-value) descriptors.
///
/// Implemented for [`Real`], `String`, `Vec<Real>`, `Vec<String>`,
/// [`StereoSample`], and [`Tensor`]; the trait is sealed.
pub trait PoolValue: sealed::Sealed + Clone + Send + Sync + 'static {
    #[doc(hidden)]
    fn bucket(pool: &Pool) -> &Bucket<Self>
    where
        Self: Sized;

    #[doc(hidden)]
    fn slot<'g>(guards: &'g mut AllGuards<'_>) -> &'g mut HashMap<String, Vec<Self>>
    where
        Self: Sized;

    /// Finiteness check used by the checked insert paths.
    fn is_valid(&self) -> bool {
        true
    }
}

/// Element types storable as single-value descriptors.
///
/// Everything in [`PoolValue`] except [`StereoSample`].
pub trait PoolSingleValue: PoolValue {
    #[doc(hidden)]
    fn single_bucket(pool: &Pool) -> &SingleBucket<Self>
    where
        Self: Sized;

    #[doc(hidden)]
    fn single_slot<'g>(guards: &'g mut AllGuards<'_>) -> &'g mut HashMap<String, Self>
    where
        Self: Sized;
}

macro_rules! pool_value {
    ($ty:ty, $bucket:ident, $valid:expr) => {
        impl sealed::Sealed for $ty {}

        impl PoolValue for $ty {
            fn bucket(pool: &Pool) -> &Bucket<Self> {
                &pool.$bucket
            }

            fn slot<'g>(guards: &'g mut AllGuards<'_>) -> &'g mut HashMap<String, Vec<Self>> {
                &mut guards.$bucket
            }

            fn is_valid(&self) -> bool {
                #[allow(clippy::redundant_closure_call)]
                ($valid)(self)
            }
        }
    };
}

macro_rules! pool_single_value {
    ($ty:ty, $bucket:ident) => {
        impl PoolSingleValue for $ty {
            fn single_bucket(pool: &Pool) -> &SingleBucket<Self> {
                &pool.$bucket
            }

            fn single_slot<'g>(guards: &'g mut AllGuards<'_>) -> &'g mut HashMap<String, Self> {
                &mut guards.$bucket
            }
        }
    };
}

pool_value!(Real, real, |v: &Real| v.is_finite());
pool_value!(String, string, |_: &String| true);
pool_value!(Vec<Real>, vector_real, |v: &Vec<Real>| v
    .iter()
    .all(|x| x.is_finite()));
pool_value!(Vec<String>, vector_string, |_: &Vec<String>| true);
pool_value!(StereoSample, stereo, |v: &StereoSample| v.is_finite());
pool_value!(Tensor, tensor, |v: &Tensor| v.is_finite());

pool_single_value!(Real, single_real);
pool_single_value!(String, single_string);
pool_single_value!(Vec<Real>, single_vector_real);
pool_single_value!(Vec<String>, single_vector_string);
pool_single_value!(Tensor, single_tensor);

/// Thread-safe map from descriptor names to analysis results.
#[derive(Default)]
pub struct Pool {
    real: Bucket<Real>,
    string: Bucket<String>,
    vector_real: Bucket<Vec<Real>>,
    vector_string: Bucket<Vec<String>>,
    stereo: Bucket<StereoSample>,
    tensor: Bucket<Tensor>,
    single_real: SingleBucket<Real>,
    single_string: SingleBucket<String>,
    single_vector_real: SingleBucket<Vec<Real>>,
    single_vector_string: SingleBucket<Vec<String>>,
    single_tensor: SingleBucket<Tensor>,
}

impl Pool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_all(&self) -> AllGuards<'_> {
        AllGuards {
            real: self.real.write(),
            string: self.string.write(),
            vector_real: self.vector_real.write(),
            vector_string: self.vector_string.write(),
            stereo: self.stereo.write(),
            tensor: self.tensor.write(),
            single_real: self.single_real.write(),
            single_string: self.single_string.write(),
            single_vector_real: self.single_vector_real.write(),
            single_vector_string: self.single_vector_string.write(),
            single_tensor: self.single_tensor.write(),
        }
    }

    /// Appends `value` under `key`, creating the descriptor on first use.
    ///
    /// Appending to an existing descriptor takes only that type's lock; the
    /// first add of a name takes all locks to enforce the namespace rules.
    pub fn add<T: PoolValue>(&self, key: &str, value: T) -> Result<(), PoolError> {
        {
            let mut map = T::bucket(self).write();
            if let Some(entry) = map.get_mut(key) {
                entry.push(value);
                return Ok(());
            }
        }
        let mut guards = self.lock_all();
        // the descriptor may have appeared between the two lock acquisitions
        if let Some(entry) = T::slot(&mut guards).get_mut(key) {
            entry.push(value);
            return Ok(());
        }
        guards.validate_key(key)?;
        T::slot(&mut guards).insert(key.to_string(), vec![value]);
        Ok(())
    }

    /// Like [`add`](Pool::add), but rejects non-finite values first.
    pub fn add_checked<T: PoolValue>(&self, key: &str, value: T) -> Result<(), PoolError> {
        if !value.is_valid() {
            return Err(PoolError::InvalidValue {
                key: key.to_string(),
            });
        }
        self.add(key, value)
    }

    /// Sets the single-value descriptor `key`, replacing any previous value.
    pub fn set<T: PoolSingleValue>(&self, key: &str, value: T) -> Result<(), PoolError> {
        {
            let mut map = T::single_bucket(self).write();
            if let Some(entry) = map.get_mut(key) {
                *entry = value;
                return Ok(());
            }
        }
        let mut guards = self.lock_all();
        if let Some(entry) = T::single_slot(&mut guards).get_mut(key) {
            *entry = value;
            return Ok(());
        }
        guards.validate_key(key)?;
        T::single_slot(&mut guards).insert(key.to_string(), value);
        Ok(())
    }

    /// Like [`set`](Pool::set), but rejects non-finite values first.
    pub fn set_checked<T: PoolSingleValue>(&self, key: &str, value: T) -> Result<(), PoolError> {
        if !value.is_valid() {
            return Err(PoolError::InvalidValue {
                key: key.to_string(),
            });
        }
        self.set(key, value)
    }

    /// Merges `values` into the multi-value descriptor `key`.
    ///
    /// On a fresh name this is a bulk insert and `mode` is not consulted. On
    /// an existing name a mode is mandatory; `None` is an error rather than a
    /// silent append.
    pub fn merge<T: PoolValue>(
        &self,
        key: &str,
        values: Vec<T>,
        mode: Option<MergeMode>,
    ) -> Result<(), PoolError> {
        {
            let mut map = T::bucket(self).write();
            if let Some(entry) = map.get_mut(key) {
                return merge_into(entry, values, mode, key);
            }
        }
        // existing descriptors go through the mode check above even for an
        // empty batch; a fresh name with nothing to insert is a no-op
        if values.is_empty() {
            return Ok(());
        }
        let mut guards = self.lock_all();
        if let Some(entry) = T::slot(&mut guards).get_mut(key) {
            return merge_into(entry, values, mode, key);
        }
        guards.validate_key(key)?;
        T::slot(&mut guards).insert(key.to_string(), values);
        Ok(())
    }

    /// Merges into the single-value descriptor `key`.
    ///
    /// With [`MergeMode::Replace`] this behaves like [`set`](Pool::set). Any
    /// other mode only succeeds when the descriptor does not exist yet.
    pub fn merge_single<T: PoolSingleValue>(
        &self,
        key: &str,
        value: T,
        mode: Option<MergeMode>,
    ) -> Result<(), PoolError> {
        if mode == Some(MergeMode::Replace) {
            return self.set(key, value);
        }
        if T::single_bucket(self).read().contains_key(key) {
            return Err(PoolError::SingleValueMergeUnsupported {
                key: key.to_string(),
            });
        }
        self.set(key, value)
    }

    /// Merges every descriptor of `other` into this pool.
    pub fn merge_pool(&self, other: &Pool, mode: Option<MergeMode>) -> Result<(), PoolError> {
        self.merge_bucket::<Real>(other, mode)?;
        self.merge_bucket::<String>(other, mode)?;
        self.merge_bucket::<Vec<Real>>(other, mode)?;
        self.merge_bucket::<Vec<String>>(other, mode)?;
        self.merge_bucket::<StereoSample>(other, mode)?;
        self.merge_bucket::<Tensor>(other, mode)?;
        self.merge_single_bucket::<Real>(other, mode)?;
        self.merge_single_bucket::<String>(other, mode)?;
        self.merge_single_bucket::<Vec<Real>>(other, mode)?;
        self.merge_single_bucket::<Vec<String>>(other, mode)?;
        self.merge_single_bucket::<Tensor>(other, mode)?;
        Ok(())
    }

    fn merge_bucket<T: PoolValue>(
        &self,
        other: &Pool,
        mode: Option<MergeMode>,
    ) -> Result<(), PoolError> {
        let snapshot: Vec<(String, Vec<T>)> = T::bucket(other)
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, values) in snapshot {
            self.merge(&key, values, mode)?;
        }
        Ok(())
    }

    fn merge_single_bucket<T: PoolSingleValue>(
        &self,
        other: &Pool,
        mode: Option<MergeMode>,
    ) -> Result<(), PoolError> {
        let snapshot: Vec<(String, T)> = T::single_bucket(other)
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, value) in snapshot {
            self.merge_single(&key, value, mode)?;
        }
        Ok(())
    }

    /// Returns a copy of the multi-value descriptor `key`.
    pub fn value<T: PoolValue>(&self, key: &str) -> Result<Vec<T>, PoolError> {
        T::bucket(self)
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| PoolError::NotFound {
                key: key.to_string(),
            })
    }

    /// Returns a copy of the single-value descriptor `key`.
    pub fn single_value<T: PoolSingleValue>(&self, key: &str) -> Result<T, PoolError> {
        T::single_bucket(self)
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| PoolError::NotFound {
                key: key.to_string(),
            })
    }

    /// Removes the descriptor `key` from every map; true if anything went.
    pub fn remove(&self, key: &str) -> bool {
        let mut guards = self.lock_all();
        let mut removed = false;
        removed |= guards.real.remove(key).is_some();
        removed |= guards.string.remove(key).is_some();
        removed |= guards.vector_real.remove(key).is_some();
        removed |= guards.vector_string.remove(key).is_some();
        removed |= guards.stereo.remove(key).is_some();
        removed |= guards.tensor.remove(key).is_some();
        removed |= guards.single_real.remove(key).is_some();
        removed |= guards.single_string.remove(key).is_some();
        removed |= guards.single_vector_real.remove(key).is_some();
        removed |= guards.single_vector_string.remove(key).is_some();
        removed |= guards.single_tensor.remove(key).is_some();
        removed
    }

    /// Removes every descriptor under `namespace`; returns how many went.
    ///
    /// Matching is on whole namespace segments: `"a"` removes `"a.b"` but not
    /// `"ab"`, and a bare descriptor named exactly `namespace` stays.
    pub fn remove_namespace(&self, namespace: &str) -> usize {
        let prefix = format!("{namespace}.");
        let mut guards = self.lock_all();
        let mut removed = 0;

        fn sweep<V>(map: &mut HashMap<String, V>, prefix: &str, removed: &mut usize) {
            let before = map.len();
            map.retain(|k, _| !k.starts_with(prefix));
            *removed += before - map.len();
        }

        sweep(&mut guards.real, &prefix, &mut removed);
        sweep(&mut guards.string, &prefix, &mut removed);
        sweep(&mut guards.vector_real, &prefix, &mut removed);
        sweep(&mut guards.vector_string, &prefix, &mut removed);
        sweep(&mut guards.stereo, &prefix, &mut removed);
        sweep(&mut guards.tensor, &prefix, &mut removed);
        sweep(&mut guards.single_real, &prefix, &mut removed);
        sweep(&mut guards.single_string, &prefix, &mut removed);
        sweep(&mut guards.single_vector_real, &prefix, &mut removed);
        sweep(&mut guards.single_vector_string, &prefix, &mut removed);
        sweep(&mut guards.single_tensor, &prefix, &mut removed);
        removed
    }

    /// Returns true if `key` exists under any type.
    pub fn contains(&self, key: &str) -> bool {
        let guards = self.lock_all();
        guards.all_names().any(|name| name == key)
    }

    /// Returns true if `key` is a single-value descriptor.
    pub fn is_single_value(&self, key: &str) -> bool {
        self.single_real.read().contains_key(key)
            || self.single_string.read().contains_key(key)
            || self.single_vector_real.read().contains_key(key)
            || self.single_vector_string.read().contains_key(key)
            || self.single_tensor.read().contains_key(key)
    }

    /// All descriptor names across every type, sorted.
    pub fn descriptor_names(&self) -> Vec<String> {
        let guards = self.lock_all();
        let mut names: Vec<String> = guards.all_names().cloned().collect();
        names.sort();
        names
    }

    /// Descriptor names under `namespace`, sorted.
    pub fn descriptor_names_in(&self, namespace: &str) -> Vec<String> {
        let prefix = format!("{namespace}.");
        let mut names = self.descriptor_names();
        names.retain(|n| n.starts_with(&prefix));
        names
    }

    /// Verifies the namespace rules hold across every map.
    ///
    /// The per-operation checks make violations unreachable through the
    /// public API; this exists as a diagnostic for long-running sessions.
    pub fn check_integrity(&self) -> Result<(), PoolError> {
        let guards = self.lock_all();
        let mut names: Vec<&String> = guards.all_names().collect();
        names.sort();
        for pair in names.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b {
                return Err(PoolError::NameConflict { key: a.clone() });
            }
            if b.starts_with(&format!("{a}.")) {
                return Err(PoolError::ParentConflict {
                    key: b.clone(),
                    parent: a.clone(),
                });
            }
        }
        Ok(())
    }

    /// Drops every descriptor.
    pub fn clear(&self) {
        let mut guards = self.lock_all();
        guards.real.clear();
        guards.string.clear();
        guards.vector_real.clear();
        guards.vector_string.clear();
        guards.stereo.clear();
        guards.tensor.clear();
        guards.single_real.clear();
        guards.single_string.clear();
        guards.single_vector_real.clear();
        guards.single_vector_string.clear();
        guards.single_tensor.clear();
    }
}

fn merge_into<T>(
    existing: &mut Vec<T>,
    mut incoming: Vec<T>,
    mode: Option<MergeMode>,
    key: &str,
) -> Result<(), PoolError> {
    match mode {
        None => Err(PoolError::MergeModeRequired {
            key: key.to_string(),
        }),
        Some(MergeMode::Append) => {
            existing.append(&mut incoming);
            Ok(())
        }
        Some(MergeMode::Replace) => {
            *existing = incoming;
            Ok(())
        }
        Some(MergeMode::Interleave) => {
            if existing.len() != incoming.len() {
                return Err(PoolError::InterleaveLengthMismatch {
                    key: key.to_string(),
                    existing: existing.len(),
                    incoming: incoming.len(),
                });
            }
            let old = std::mem::take(existing);
            existing.reserve(old.len() * 2);
            for (a, b) in old.into_iter().zip(incoming) {
                existing.push(a);
                existing.push(b);
            }
            Ok(())
        }
    }
}
