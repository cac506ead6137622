//! Foreign data wrapped as EDN values.
//!
//! Equality and hashing of external values are resolved through a
//! process-wide table keyed by type-id. Register every type before values of
//! that type are compared from several threads; the table itself is guarded
//! by a read-mostly lock.

use std::{
    any::Any,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

use rustc_hash::{FxHashMap, FxHasher};
use tracing::debug;

pub type ExternalData = dyn Any + Send + Sync;
pub type EqualFn = fn(&ExternalData, &ExternalData) -> bool;
pub type HashFn = fn(&ExternalData) -> u64;

#[derive(Copy, Clone)]
struct Callbacks {
    equal: EqualFn,
    hash: HashFn,
}

static EXTERNAL_TYPES: LazyLock<RwLock<FxHashMap<u32, Callbacks>>> =
    LazyLock::new(|| RwLock::new(FxHashMap::default()));

/// Registers equality and hash callbacks for `type_id`, replacing any previous
/// pair. Returns whether a pair was replaced.
pub fn register_external_type(type_id: u32, equal: EqualFn, hash: HashFn) -> bool {
    let replaced = EXTERNAL_TYPES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(type_id, Callbacks { equal, hash })
        .is_some();
    debug!(type_id, replaced, "registered external type");
    replaced
}

pub fn unregister_external_type(type_id: u32) -> bool {
    let removed = EXTERNAL_TYPES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&type_id)
        .is_some();
    debug!(type_id, removed, "unregistered external type");
    removed
}

fn callbacks(type_id: u32) -> Option<Callbacks> {
    EXTERNAL_TYPES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .copied()
}

/// Equality callback comparing two values of the same concrete type `T`.
pub fn equal_as<T: PartialEq + 'static>(a: &ExternalData, b: &ExternalData) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Hash callback hashing a value of concrete type `T` with `FxHasher`.
pub fn hash_as<T: Hash + 'static>(data: &ExternalData) -> u64 {
    let mut hasher = FxHasher::default();
    if let Some(value) = data.downcast_ref::<T>() {
        value.hash(&mut hasher);
    }
    hasher.finish()
}

/// Opaque user data tagged with a user-defined type-id.
#[derive(Clone)]
pub struct External {
    type_id: u32,
    data: Arc<ExternalData>,
}

impl External {
    pub fn new<T: Any + Send + Sync>(type_id: u32, data: T) -> Self {
        Self {
            type_id,
            data: Arc::new(data),
        }
    }

    #[inline]
    pub fn type_id(&self) -> u32 {
        self.type_id
    }

    #[inline]
    pub fn data(&self) -> &ExternalData {
        &*self.data
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.data).cast::<()>() as usize
    }

    /// Registered equality, falling back to identity.
    pub(crate) fn equals(&self, other: &External) -> bool {
        if self.type_id != other.type_id {
            return false;
        }
        if Arc::ptr_eq(&self.data, &other.data) {
            return true;
        }
        callbacks(self.type_id).is_some_and(|cb| (cb.equal)(self.data(), other.data()))
    }

    /// Registered hash, falling back to the data address.
    pub(crate) fn hash_code(&self) -> u64 {
        match callbacks(self.type_id) {
            Some(cb) => (cb.hash)(self.data()),
            None => self.address() as u64,
        }
    }

    /// Tie-break for values that are neither equal nor distinguished by hash.
    pub(crate) fn identity(&self) -> usize {
        self.address()
    }
}

impl fmt::Debug for External {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("External")
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(PartialEq, Hash)]
    struct Meters(u32);

    const METERS: u32 = 0x6d65_7472;
    const UNREGISTERED: u32 = 0x6e6f_6e65;

    #[test]
    fn registered_callbacks_drive_equality() {
        register_external_type(METERS, equal_as::<Meters>, hash_as::<Meters>);
        let a = External::new(METERS, Meters(3));
        let b = External::new(METERS, Meters(3));
        let c = External::new(METERS, Meters(4));
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
        assert_eq!(a.hash_code(), b.hash_code());
    }

    #[test]
    fn unregistered_types_compare_by_identity() {
        let a = External::new(UNREGISTERED, 1u8);
        let b = External::new(UNREGISTERED, 1u8);
        assert!(a.equals(&a.clone()));
        assert!(!a.equals(&b));
        assert_eq!(a.downcast_ref::<u8>(), Some(&1));
        assert_eq!(a.downcast_ref::<u16>(), None);
    }

    #[test]
    fn unregister_reports_presence() {
        const TEMP: u32 = 0x7465_6d70;
        register_external_type(TEMP, equal_as::<u8>, hash_as::<u8>);
        assert!(unregister_external_type(TEMP));
        assert!(!unregister_external_type(TEMP));
    }
}
