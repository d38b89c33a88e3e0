// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Thread-safe, name-keyed snapshot of the watched objects.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

pub struct ObjectCache<K> {
    objects: Mutex<BTreeMap<String, K>>,
    synced: watch::Sender<bool>,
}

impl<K: Clone> ObjectCache<K> {
    pub fn new() -> Self {
        let (synced, _) = watch::channel(false);
        Self {
            objects: Mutex::new(BTreeMap::new()),
            synced,
        }
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<String, K>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the cached object; callers never alias cache storage.
    pub fn get(&self, name: &str) -> Option<K> {
        self.objects().get(name).cloned()
    }

    pub fn set(&self, name: &str, object: &K) {
        self.objects().insert(name.to_string(), object.clone());
    }

    pub fn delete(&self, name: &str) {
        self.objects().remove(name);
    }

    /// Copies of every cached object satisfying the predicate, ordered by name.
    /// The predicate runs on a snapshot, after the lock is released.
    pub fn select<F>(&self, predicate: F) -> Vec<K>
    where
        F: Fn(&K) -> bool,
    {
        let snapshot: Vec<K> = self.objects().values().cloned().collect();
        snapshot.into_iter().filter(|o| predicate(o)).collect()
    }

    /// Drop every entry whose name fails the predicate.
    pub fn retain<F>(&self, keep: F)
    where
        F: Fn(&str) -> bool,
    {
        self.objects().retain(|name, _| keep(name));
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }

    /// Flag the initial listing as complete.
    pub fn mark_synced(&self) {
        self.synced.send_replace(true);
    }

    pub fn is_synced(&self) -> bool {
        *self.synced.borrow()
    }

    /// Resolve once the initial listing is complete.
    pub async fn wait_synced(&self) {
        let mut rx = self.synced.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|synced| *synced).await;
    }
}

impl<K: Clone> Default for ObjectCache<K> {
    fn default() -> Self {
        Self::new()
    }
}
