// Copyright (c) 2026 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! A shared/exclusive mutex that is recursive on both axes.
//!
//! Ported from `libs/utils/impl/RecursiveSharedMutex.cpp`: a thread already holding the exclusive
//! lock may re-acquire it (or take the shared lock) without blocking, and a thread already holding
//! the shared lock may re-acquire it any number of times. `std::sync::RwLock` gives neither
//! guarantee, so the per-thread unique-owner slot and shared-count map are tracked explicitly
//! alongside a plain [`std::sync::RwLock`].

use std::collections::HashMap;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::ThreadId;

/// A shared/exclusive mutex, recursive on both the exclusive and the shared side.
///
/// At most one thread may hold the exclusive lock at a time, but that thread may re-enter
/// [`lock`](Self::lock) or [`lock_shared`](Self::lock_shared) any number of times. Any number of
/// threads may hold the shared lock simultaneously, and each may re-enter
/// [`lock_shared`](Self::lock_shared) any number of times.
#[derive(Debug)]
pub struct RecursiveSharedMutex {
    inner: RwLock<()>,
    unique_owner: Mutex<UniqueOwner>,
    shared_counts: Mutex<HashMap<ThreadId, usize>>,
}

/// The thread currently holding the exclusive lock, and how many times it has re-entered it.
#[derive(Debug, Default)]
struct UniqueOwner {
    /// `None` when no thread holds the exclusive lock.
    thread: Option<ThreadId>,
    count: usize,
}

/// RAII guard returned by [`RecursiveSharedMutex::lock`].
#[derive(Debug)]
pub struct ExclusiveGuard<'a> {
    mutex: &'a RecursiveSharedMutex,
    /// The underlying write guard, held only by the first (non-recursive) acquisition.
    guard: Option<RwLockWriteGuard<'a, ()>>,
}

/// RAII guard returned by [`RecursiveSharedMutex::lock_shared`].
#[derive(Debug)]
pub struct SharedGuard<'a> {
    mutex: &'a RecursiveSharedMutex,
    guard: Option<RwLockReadGuard<'a, ()>>,
}

impl Default for RecursiveSharedMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl RecursiveSharedMutex {
    /// Create a new, unlocked mutex.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(()),
            unique_owner: Mutex::new(UniqueOwner::default()),
            shared_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the exclusive lock, blocking until available.
    ///
    /// Re-entrant: if the calling thread already holds the exclusive lock, this returns
    /// immediately instead of deadlocking.
    pub fn lock(&self) -> ExclusiveGuard<'_> {
        let this_thread = std::thread::current().id();

        let mut owner = self.unique_owner.lock().expect("lock poisoned");
        if owner.thread == Some(this_thread) {
            owner.count += 1;
            return ExclusiveGuard {
                mutex: self,
                guard: None,
            };
        }
        drop(owner);

        let guard = self.inner.write().expect("lock poisoned");

        let mut owner = self.unique_owner.lock().expect("lock poisoned");
        debug_assert_eq!(owner.count, 0);
        owner.thread = Some(this_thread);
        owner.count = 1;

        ExclusiveGuard {
            mutex: self,
            guard: Some(guard),
        }
    }

    /// Acquire the shared lock, blocking until available.
    ///
    /// Re-entrant: if the calling thread already holds the exclusive lock, this returns
    /// immediately without blocking on the underlying `RwLock` (which would otherwise deadlock).
    /// If the calling thread already holds the shared lock, the per-thread count is bumped instead
    /// of re-acquiring the underlying read lock.
    pub fn lock_shared(&self) -> SharedGuard<'_> {
        let this_thread = std::thread::current().id();

        {
            let owner = self.unique_owner.lock().expect("lock poisoned");
            if owner.thread == Some(this_thread) {
                drop(owner);
                let mut counts = self.shared_counts.lock().expect("lock poisoned");
                *counts.entry(this_thread).or_insert(0) += 1;
                return SharedGuard {
                    mutex: self,
                    guard: None,
                };
            }
        }

        let need_lock = {
            let mut counts = self.shared_counts.lock().expect("lock poisoned");
            let count = counts.entry(this_thread).or_insert(0);
            if *count == 0 {
                true
            } else {
                *count += 1;
                false
            }
        };

        if !need_lock {
            return SharedGuard {
                mutex: self,
                guard: None,
            };
        }

        let guard = self.inner.read().expect("lock poisoned");
        let mut counts = self.shared_counts.lock().expect("lock poisoned");
        *counts.entry(this_thread).or_insert(0) += 1;

        SharedGuard {
            mutex: self,
            guard: Some(guard),
        }
    }

    /// `true` if the calling thread currently holds the shared lock (debug/test helper, mirrors
    /// the source's `#ifndef NDEBUG` `isSharedLocked`).
    #[must_use]
    pub fn is_shared_locked_by_current_thread(&self) -> bool {
        let this_thread = std::thread::current().id();
        self.shared_counts
            .lock()
            .expect("lock poisoned")
            .get(&this_thread)
            .is_some_and(|count| *count > 0)
    }

    /// `true` if the calling thread currently holds the exclusive lock.
    #[must_use]
    pub fn is_unique_locked_by_current_thread(&self) -> bool {
        let this_thread = std::thread::current().id();
        self.unique_owner.lock().expect("lock poisoned").thread == Some(this_thread)
    }
}

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        let mut owner = self.mutex.unique_owner.lock().expect("lock poisoned");
        debug_assert!(owner.count > 0);
        owner.count -= 1;
        if owner.count == 0 {
            owner.thread = None;
            drop(owner);
            // self.guard (if any) drops here, releasing the underlying write lock.
        }
    }
}

impl Drop for SharedGuard<'_> {
    fn drop(&mut self) {
        let this_thread = std::thread::current().id();
        let mut counts = self.mutex.shared_counts.lock().expect("lock poisoned");
        if let Some(count) = counts.get_mut(&this_thread) {
            debug_assert!(*count > 0);
            *count -= 1;
        }
        // self.guard (if any) drops here, releasing the underlying read lock.
    }
}

// Safety/Send/Sync: both guards only ever touch `&RecursiveSharedMutex` plus the thread-local
// bookkeeping protected by its own `Mutex`es, so they inherit `Sync` from `RwLock`/`Mutex`.
unsafe impl Send for ExclusiveGuard<'_> {}
unsafe impl Send for SharedGuard<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn shared_readers_can_coexist() {
        let mutex = RecursiveSharedMutex::new();
        let a = mutex.lock_shared();
        let b = mutex.lock_shared();
        drop(a);
        drop(b);
    }

    #[test]
    fn exclusive_lock_is_recursive_on_same_thread() {
        let mutex = RecursiveSharedMutex::new();
        let a = mutex.lock();
        let b = mutex.lock();
        assert!(mutex.is_unique_locked_by_current_thread());
        drop(a);
        assert!(mutex.is_unique_locked_by_current_thread());
        drop(b);
        assert!(!mutex.is_unique_locked_by_current_thread());
    }

    #[test]
    fn shared_lock_is_recursive_on_same_thread() {
        let mutex = RecursiveSharedMutex::new();
        let a = mutex.lock_shared();
        let b = mutex.lock_shared();
        drop(a);
        assert!(mutex.is_shared_locked_by_current_thread());
        drop(b);
        assert!(!mutex.is_shared_locked_by_current_thread());
    }

    #[test]
    fn exclusive_holder_can_also_take_shared() {
        let mutex = RecursiveSharedMutex::new();
        let _excl = mutex.lock();
        let _shared = mutex.lock_shared();
    }

    #[test]
    fn exclusive_lock_excludes_other_threads() {
        let mutex = Arc::new(RecursiveSharedMutex::new());
        let guard = mutex.lock();

        let other = Arc::clone(&mutex);
        let handle = thread::spawn(move || {
            let _g = other.lock_shared();
        });

        thread::sleep(std::time::Duration::from_millis(50));
        assert!(!handle.is_finished());

        drop(guard);
        handle.join().unwrap();
    }
}
