// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Registered configurations, keyed by name in registration order.

use crate::types::Configuration;
use kube::ResourceExt;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct Registry<C> {
    entries: Mutex<Vec<C>>,
}

impl<C: Configuration> Registry<C> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<C>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace the configuration with the same name.
    pub fn register(&self, config: C) {
        let name = config.name_any();
        let mut entries = self.entries();

        match entries.iter_mut().find(|c| c.name_any() == name) {
            Some(existing) => *existing = config,
            None => entries.push(config),
        }
    }

    pub fn unregister(&self, name: &str) {
        self.entries().retain(|c| c.name_any() != name);
    }

    pub fn get(&self, name: &str) -> Option<C> {
        self.entries().iter().find(|c| c.name_any() == name).cloned()
    }

    /// Configurations that select or name the target, in registration order.
    pub fn matching(&self, target: &C::Target) -> Vec<C> {
        let name = target.name_any();
        let snapshot: Vec<C> = self.entries().clone();

        snapshot
            .into_iter()
            .filter(|c| c.named_objects().contains(&name) || c.matches(target))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl<C: Configuration> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}
