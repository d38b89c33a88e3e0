// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watch task keeping the object cache current and raising object messages.

use crate::sync::cache::ObjectCache;
use crate::sync::manager::{Message, Source, SyncManagerHandle};
use crate::types::{Configuration, ManagedObject};
use futures::{Stream, StreamExt};
use kube::runtime::watcher::{self, watcher, Event};
use kube::{Api, Resource, ResourceExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct ObjectWatcher<C: Configuration> {
    api: Api<C::Target>,
    cache: Arc<ObjectCache<C::Target>>,
    handle: SyncManagerHandle<C>,
    /// Names seen during the current (re)list, if one is in progress
    relisted: Option<BTreeSet<String>>,
}

impl<C: Configuration> ObjectWatcher<C> {
    pub fn new(
        api: Api<C::Target>,
        cache: Arc<ObjectCache<C::Target>>,
        handle: SyncManagerHandle<C>,
    ) -> Self {
        Self {
            api,
            cache,
            handle,
            relisted: None,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("Watching {} objects", C::Target::kind(&()));

        let stream = watcher(self.api.clone(), watcher::Config::default());
        self.consume(stream).await
    }

    /// Drain watch events into the cache. The stream ending is an error so
    /// the controller of this kind stops instead of running on a stale cache.
    async fn consume<S>(mut self, stream: S) -> anyhow::Result<()>
    where
        S: Stream<Item = Result<Event<C::Target>, watcher::Error>>,
    {
        let kind = C::Target::kind(&());
        let mut stream = Box::pin(stream);

        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => self.handle_event(event),
                Err(e) => warn!("{} watch error: {}", kind, e),
            }
        }

        error!("{} watch stream closed", kind);
        Err(anyhow::anyhow!("{} watch stream closed", kind))
    }

    pub(crate) fn handle_event(&mut self, event: Event<C::Target>) {
        match event {
            Event::Init => {
                debug!("Starting list of {} objects", C::Target::kind(&()));
                self.relisted = Some(BTreeSet::new());
            }
            Event::InitApply(object) => {
                if let Some(seen) = self.relisted.as_mut() {
                    seen.insert(object.name_any());
                }
                self.observe(object);
            }
            Event::InitDone => {
                if let Some(seen) = self.relisted.take() {
                    self.cache.retain(|name| seen.contains(name));
                }
                info!(
                    "Listed {} {} objects",
                    self.cache.len(),
                    C::Target::kind(&())
                );
                self.cache.mark_synced();
            }
            Event::Apply(object) => {
                self.observe(object);
            }
            Event::Delete(object) => {
                debug!("{} deleted", object.name_any());
                self.cache.delete(&object.name_any());
            }
        }
    }

    /// Refresh the cache and raise an object message if a managed field
    /// changed. The first sighting of an object never raises one.
    fn observe(&self, object: C::Target) -> bool {
        let name = object.name_any();
        let changed = self
            .cache
            .get(&name)
            .is_some_and(|cached| !cached.same_managed_fields(&object));

        self.cache.set(&name, &object);

        if changed {
            debug!("{} changed, queueing reconciliation", name);
            if let Err(e) = self.handle.notify(Source::Watcher, Message::Object(object)) {
                error!("Failed to queue {}: {}", name, e);
            }
        }

        changed
    }
}
