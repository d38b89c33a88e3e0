// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-kind processor applying configurations to cluster objects.

use crate::error::{FactotumError, Result};
use crate::kubernetes::{ensure_object_exists, two_way_merge_patch};
use crate::sync::cache::ObjectCache;
use crate::sync::handlers::Handler;
use crate::sync::registry::Registry;
use crate::sync::selector::Selector;
use crate::sync::watch::ObjectWatcher;
use crate::types::Configuration;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, Resource, ResourceExt};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument};

/// Who raised a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Reconciler,
    Cleanup,
    Watcher,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Reconciler => "reconciler",
            Source::Cleanup => "cleanup",
            Source::Watcher => "watcher",
        })
    }
}

/// Work for the processor
#[derive(Debug)]
pub enum Message<C: Configuration> {
    /// One object changed; compare it against every registered configuration
    Object(C::Target),
    /// One configuration changed; apply it to every object it selects
    Configuration(C),
}

pub struct Envelope<C: Configuration> {
    pub(crate) source: Source,
    pub(crate) message: Message<C>,
    done: Option<oneshot::Sender<()>>,
}

/// Handle to send messages to the SyncManager and reach its registry
pub struct SyncManagerHandle<C: Configuration> {
    tx: mpsc::UnboundedSender<Envelope<C>>,
    registry: Arc<Registry<C>>,
}

impl<C: Configuration> Clone for SyncManagerHandle<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<C: Configuration> SyncManagerHandle<C> {
    /// Queue a message without waiting for it to be processed.
    pub fn notify(&self, source: Source, message: Message<C>) -> Result<()> {
        self.send(source, message, None)
    }

    /// Queue a message and wait until the processor has finished its sweep.
    pub async fn notify_and_wait(&self, source: Source, message: Message<C>) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(source, message, Some(done_tx))?;

        done_rx.await.map_err(|_| {
            FactotumError::ProcessorStopped(format!(
                "{} message for {} dropped before completion",
                source,
                C::kind(&())
            ))
        })
    }

    fn send(&self, source: Source, message: Message<C>, done: Option<oneshot::Sender<()>>) -> Result<()> {
        self.tx
            .send(Envelope {
                source,
                message,
                done,
            })
            .map_err(|_| {
                FactotumError::ProcessorStopped(format!(
                    "{} message for {} not delivered",
                    source,
                    C::kind(&())
                ))
            })
    }

    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }
}

/// Serialized processor for one configuration kind.
/// Receives messages from the reconciler and the object watcher and patches
/// the selected objects.
pub struct SyncManager<C: Configuration> {
    api: Api<C::Target>,
    cache: Arc<ObjectCache<C::Target>>,
    registry: Arc<Registry<C>>,
    handlers: Vec<Handler>,
    rx: mpsc::UnboundedReceiver<Envelope<C>>,
    handle: SyncManagerHandle<C>,
}

impl<C: Configuration> SyncManager<C> {
    pub fn new(client: Client) -> (Self, SyncManagerHandle<C>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Registry::new());
        let handle = SyncManagerHandle {
            tx,
            registry: registry.clone(),
        };

        let manager = Self {
            api: Api::all(client),
            cache: Arc::new(ObjectCache::new()),
            registry,
            handlers: C::handlers(),
            rx,
            handle: handle.clone(),
        };

        (manager, handle)
    }

    /// The watch task feeding this manager's cache.
    pub fn watcher(&self) -> ObjectWatcher<C> {
        ObjectWatcher::new(self.api.clone(), self.cache.clone(), self.handle.clone())
    }

    pub fn cache(&self) -> &Arc<ObjectCache<C::Target>> {
        &self.cache
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let kind = C::Target::kind(&());
        info!("SyncManager for {} waiting for initial object list...", kind);
        self.cache.wait_synced().await;
        info!(
            "Initial list complete with {} {} objects, processing messages...",
            self.cache.len(),
            kind
        );

        while let Some(envelope) = self.next_envelope().await {
            self.handle_envelope(envelope).await;
        }

        Ok(())
    }

    pub(crate) async fn next_envelope(&mut self) -> Option<Envelope<C>> {
        self.rx.recv().await
    }

    #[cfg(test)]
    pub(crate) fn try_next_envelope(&mut self) -> Option<Envelope<C>> {
        self.rx.try_recv().ok()
    }

    /// Process one message and signal its completion, exactly once.
    pub(crate) async fn handle_envelope(&self, envelope: Envelope<C>) {
        let Envelope {
            source,
            message,
            done,
        } = envelope;

        match message {
            Message::Object(object) => self.process_object(source, object).await,
            Message::Configuration(config) => self.process_configuration(source, &config).await,
        }

        if let Some(done) = done {
            if done.send(()).is_err() {
                debug!("Completion receiver for {} message is gone", source);
            }
        }
    }

    #[instrument(skip(self, source, config), fields(config = %config.name_any(), source = %source))]
    async fn process_configuration(&self, source: Source, config: &C) {
        debug!("Processing configuration");

        let selector = config.compiled_selector();

        if let Some(previous) = config.previous_selector() {
            let mut departed_config = config.clone();
            departed_config.cleanup();

            let previous = Selector::new(Some(&previous));
            let departed = self.cache.select(|object| {
                previous.matches(object.labels()) && !selector.matches(object.labels())
            });
            info!(
                "Selector changed, cleaning up {} objects no longer selected",
                departed.len()
            );
            for object in &departed {
                self.apply_logged(&departed_config, object).await;
            }
        }

        // Empty while the configuration is being deleted
        let mut targets: Vec<C::Target> = Vec::new();
        for requested in config.requested_objects() {
            match ensure_object_exists(&self.api, &requested).await {
                Ok(object) => targets.push(object),
                Err(e) => error!("Failed to ensure {} exists: {}", requested.name_any(), e),
            }
        }

        let named = config.named_objects();
        let cached = self.cache.select(|object| {
            named.contains(&object.name_any()) || selector.matches(object.labels())
        });
        for object in cached {
            if !targets.iter().any(|t| t.name_any() == object.name_any()) {
                targets.push(object);
            }
        }

        debug!("Applying to {} objects", targets.len());
        for target in &targets {
            self.apply_logged(config, target).await;
        }
    }

    #[instrument(skip(self, source, object), fields(object = %object.name_any(), source = %source))]
    async fn process_object(&self, source: Source, object: C::Target) {
        let configs = self.registry.matching(&object);
        debug!("Object matches {} configurations", configs.len());

        let mut current = object;
        for config in &configs {
            if let Some(updated) = self.apply_logged(config, &current).await {
                current = updated;
            }
        }
    }

    /// Apply a configuration to one object; errors are logged and swallowed.
    /// Returns the patched object if a patch was sent.
    async fn apply_logged(&self, config: &C, target: &C::Target) -> Option<C::Target> {
        match self.apply(config, target).await {
            Ok(updated) => updated,
            Err(e) => {
                error!(
                    "Failed to apply {} to {} {}: {}",
                    config.name_any(),
                    C::Target::kind(&()),
                    target.name_any(),
                    e
                );
                None
            }
        }
    }

    async fn apply(&self, config: &C, target: &C::Target) -> Result<Option<C::Target>> {
        let mut modified = target.clone();
        let mut changed = false;
        for handler in &self.handlers {
            changed |= handler.apply(&mut modified, config);
        }

        let patch = match two_way_merge_patch(target, &modified) {
            Some(patch) if changed => patch,
            _ => {
                debug!("{} already up to date", target.name_any());
                return Ok(None);
            }
        };

        let name = target.name_any();
        info!(
            "Patching {} {} for {}",
            C::Target::kind(&()),
            name,
            config.name_any()
        );
        let patched = self
            .api
            .patch(&name, &PatchParams::default(), &Patch::Strategic(patch))
            .await?;
        Ok(Some(patched))
    }
}
