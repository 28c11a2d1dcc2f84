//! Opaque handle registry.
//!
//! Objects handed to C never leave Rust memory. Each kind lives in its own
//! [`HandleTable`] and C holds a `u64` token for it. Tokens come from one
//! process-wide counter starting at 1, so `0` never names an object and a
//! token of one kind never resolves in another kind's table.
//!
//! Consuming calls (builder setters) leave a tombstone behind: later use of
//! the old token fails with `ERR_NULL_POINTER` and a message saying it was
//! consumed, and releasing it just clears the tombstone. Releasing a token
//! twice, or using it after release, fails with `ERR_NULL_POINTER` instead of
//! touching freed memory.

use crate::error::{ERR_NULL_POINTER, FfiError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Token naming an object owned by the library. `0` is never issued.
pub type ExtractumHandle = u64;

/// The token returned when a call fails.
pub const INVALID_HANDLE: ExtractumHandle = 0;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

enum Slot<T> {
    Live(Arc<Mutex<T>>),
    Consumed,
}

pub(crate) struct HandleTable<T> {
    kind: &'static str,
    slots: Mutex<HashMap<ExtractumHandle, Slot<T>>>,
}

impl<T> HandleTable<T> {
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn insert(&self, value: T) -> ExtractumHandle {
        let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
        self.slots.lock().insert(handle, Slot::Live(Arc::new(Mutex::new(value))));
        tracing::trace!(kind = self.kind, handle, "issued handle");
        handle
    }

    /// Shared access to a live object. The table lock is released before the
    /// caller locks the object, so slow work on one handle never blocks others.
    pub(crate) fn get(&self, handle: ExtractumHandle) -> Result<Arc<Mutex<T>>, FfiError> {
        match self.slots.lock().get(&handle) {
            Some(Slot::Live(object)) => Ok(Arc::clone(object)),
            Some(Slot::Consumed) => Err(self.consumed(handle)),
            None => Err(self.unknown(handle)),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_live(&self, handle: ExtractumHandle) -> bool {
        matches!(self.slots.lock().get(&handle), Some(Slot::Live(_)))
    }

    /// Move the object out, leaving a tombstone under the old token.
    pub(crate) fn take(&self, handle: ExtractumHandle) -> Result<T, FfiError>
    where
        T: Clone,
    {
        let object = {
            let mut slots = self.slots.lock();
            match slots.insert(handle, Slot::Consumed) {
                Some(Slot::Live(object)) => object,
                Some(Slot::Consumed) => return Err(self.consumed(handle)),
                None => {
                    slots.remove(&handle);
                    return Err(self.unknown(handle));
                }
            }
        };
        tracing::trace!(kind = self.kind, handle, "consumed handle");
        // A concurrent reader may still hold the Arc; it keeps its own copy alive.
        Ok(Arc::try_unwrap(object)
            .map(Mutex::into_inner)
            .unwrap_or_else(|shared| shared.lock().clone()))
    }

    /// Drop the entry for `handle`, live or tombstoned.
    pub(crate) fn release(&self, handle: ExtractumHandle) -> Result<(), FfiError> {
        match self.slots.lock().remove(&handle) {
            Some(_) => {
                tracing::trace!(kind = self.kind, handle, "released handle");
                Ok(())
            }
            None => Err(self.unknown(handle)),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }

    fn consumed(&self, handle: ExtractumHandle) -> FfiError {
        FfiError::new(
            ERR_NULL_POINTER,
            format!("{} handle {} was consumed by a previous call", self.kind, handle),
        )
    }

    fn unknown(&self, handle: ExtractumHandle) -> FfiError {
        if handle == INVALID_HANDLE {
            FfiError::null_pointer(self.kind)
        } else {
            FfiError::new(
                ERR_NULL_POINTER,
                format!("{} handle {} is not live (never issued or already released)", self.kind, handle),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_start_above_zero_and_are_unique() {
        let a = HandleTable::new("A");
        let b = HandleTable::new("B");
        let first = a.insert(1u32);
        let second = b.insert(2u32);
        assert_ne!(first, INVALID_HANDLE);
        assert_ne!(first, second);
        assert_eq!(b.get(first).unwrap_err().code, ERR_NULL_POINTER);
    }

    #[test]
    fn test_get_returns_shared_object() {
        let table = HandleTable::new("Counter");
        let handle = table.insert(10u32);
        *table.get(handle).unwrap().lock() += 5;
        assert_eq!(*table.get(handle).unwrap().lock(), 15);
    }

    #[test]
    fn test_take_leaves_tombstone() {
        let table = HandleTable::new("Config");
        let handle = table.insert("value".to_string());
        assert_eq!(table.take(handle).unwrap(), "value");

        let err = table.get(handle).unwrap_err();
        assert_eq!(err.code, ERR_NULL_POINTER);
        assert!(err.message.contains("consumed"));
        assert_eq!(table.take(handle).unwrap_err().code, ERR_NULL_POINTER);
        assert!(!table.is_live(handle));

        table.release(handle).unwrap();
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_take_while_shared_clones() {
        let table = HandleTable::new("Config");
        let handle = table.insert(vec![1, 2, 3]);
        let shared = table.get(handle).unwrap();
        assert_eq!(table.take(handle).unwrap(), vec![1, 2, 3]);
        assert_eq!(*shared.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_double_release() {
        let table = HandleTable::new("Stream");
        let handle = table.insert(());
        table.release(handle).unwrap();
        let err = table.release(handle).unwrap_err();
        assert_eq!(err.code, ERR_NULL_POINTER);
        assert!(err.message.contains("not live"));
        assert_eq!(table.get(handle).unwrap_err().code, ERR_NULL_POINTER);
    }

    #[test]
    fn test_unknown_and_zero_handles() {
        let table: HandleTable<u8> = HandleTable::new("Metadata");
        assert_eq!(table.release(INVALID_HANDLE).unwrap_err().message, "Metadata cannot be NULL");
        assert_eq!(table.take(u64::MAX).unwrap_err().code, ERR_NULL_POINTER);
        assert_eq!(table.len(), 0);
    }
}
