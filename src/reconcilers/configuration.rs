// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Configuration reconciler - registers configurations with the sync manager,
//! waits for each apply or cleanup pass and persists the outcome.

use crate::config::Config;
use crate::constants::OPERATOR_NAME;
use crate::error::{FactotumError, Result};
use crate::reconcilers::finalizer::{add_finalizer, has_finalizer, remove_finalizer, with_finalizer};
use crate::sync::{Message, Source, SyncManagerHandle};
use crate::types::Configuration;
use futures::StreamExt;
use kube::{
    api::{Patch, PatchParams},
    runtime::{controller::Action, Controller},
    Api, Client, Resource, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub struct ConfigReconciler<C: Configuration> {
    client: Client,
    handle: SyncManagerHandle<C>,
    error_requeue: Duration,
}

impl<C: Configuration> ConfigReconciler<C> {
    pub fn new(client: Client, handle: SyncManagerHandle<C>, config: &Config) -> Self {
        Self {
            client,
            handle,
            error_requeue: config.error_requeue,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let configs: Api<C> = Api::all(self.client.clone());
        let context = Arc::new(self);

        Controller::new(configs, WatcherConfig::default())
            .run(reconcile::<C>, error_policy::<C>, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled {}: {:?}", C::kind(&()), o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    fn api(&self) -> Api<C> {
        Api::all(self.client.clone())
    }

    #[instrument(skip(self, config), fields(config = %config.name_any()))]
    async fn apply(&self, config: &C) -> Result<Action> {
        let api = self.api();
        let mut config = config.clone();

        if !has_finalizer(config.meta()) {
            add_finalizer(&api, &config).await?;
            let finalizers = with_finalizer(config.finalizers());
            config.meta_mut().finalizers = Some(finalizers);
        }

        let registry = self.handle.registry();
        registry.register(config.clone());

        if let Err(e) = self
            .handle
            .notify_and_wait(Source::Reconciler, Message::Configuration(config.clone()))
            .await
        {
            config.mark_failed(&e.to_string());
            registry.register(config.clone());
            if let Err(status_err) = self.patch_status(&api, &config).await {
                warn!("Failed to record failure in status: {}", status_err);
            }
            return Err(e);
        }

        config.mark_applied();
        registry.register(config.clone());
        self.patch_status(&api, &config).await?;

        info!("Configuration applied");
        Ok(Action::await_change())
    }

    #[instrument(skip(self, config), fields(config = %config.name_any()))]
    async fn cleanup(&self, config: &C) -> Result<Action> {
        if !has_finalizer(config.meta()) {
            debug!("No finalizer present, nothing to clean up");
            return Ok(Action::await_change());
        }

        let mut cleaned = config.clone();
        cleaned.cleanup();

        let registry = self.handle.registry();
        registry.register(cleaned.clone());
        self.handle
            .notify_and_wait(Source::Cleanup, Message::Configuration(cleaned))
            .await?;
        registry.unregister(&config.name_any());

        remove_finalizer(&self.api(), config).await?;

        info!("Configuration cleaned up");
        Ok(Action::await_change())
    }

    /// Persist the status through server-side apply.
    async fn patch_status(&self, api: &Api<C>, config: &C) -> Result<()> {
        let patch = json!({
            "apiVersion": C::api_version(&()),
            "kind": C::kind(&()),
            "status": config.status_value()?,
        });

        api.patch_status(
            &config.name_any(),
            &PatchParams::apply(OPERATOR_NAME).force(),
            &Patch::Apply(&patch),
        )
        .await?;
        Ok(())
    }
}

async fn reconcile<C: Configuration>(config: Arc<C>, ctx: Arc<ConfigReconciler<C>>) -> Result<Action> {
    debug!("Reconciling {} {}", C::kind(&()), config.name_any());

    if config.meta().deletion_timestamp.is_some() {
        ctx.cleanup(&config).await
    } else {
        ctx.apply(&config).await
    }
}

fn error_policy<C: Configuration>(
    config: Arc<C>,
    error: &FactotumError,
    ctx: Arc<ConfigReconciler<C>>,
) -> Action {
    error!("Reconciliation error for {}: {}", config.name_any(), error);
    Action::requeue(ctx.error_requeue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FINALIZER;
    use crate::sync::SyncManager;
    use crate::test_utils::{node_config_json, MockService};
    use crate::types::{NodeConfig, NodeConfigSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use serde_json::json;

    const CONFIG_PATH: &str = "/apis/factotum.io/v1alpha1/nodeconfigs/workers";
    const STATUS_PATH: &str = "/apis/factotum.io/v1alpha1/nodeconfigs/workers/status";

    fn make_config(finalizers: &[&str]) -> NodeConfig {
        let mut spec = NodeConfigSpec::default();
        spec.common.labels = Some([("team".to_string(), "a".to_string())].into_iter().collect());
        let mut config = NodeConfig::new("workers", spec);
        config.metadata.resource_version = Some("1".to_string());
        config.metadata.generation = Some(3);
        if !finalizers.is_empty() {
            config.metadata.finalizers = Some(finalizers.iter().map(|f| f.to_string()).collect());
        }
        config
    }

    fn make_reconciler(
        mock: &MockService,
    ) -> (SyncManager<NodeConfig>, Arc<ConfigReconciler<NodeConfig>>) {
        let (manager, handle) = SyncManager::new(mock.clone().into_client());
        let reconciler = ConfigReconciler::new(mock.clone().into_client(), handle, &Config::default());
        (manager, Arc::new(reconciler))
    }

    #[tokio::test]
    async fn test_finalizer_removed_only_after_cleanup_pass() {
        let mock = MockService::new().on_patch(
            CONFIG_PATH,
            200,
            &node_config_json("workers", &["other-finalizer"]),
        );
        let (mut manager, reconciler) = make_reconciler(&mock);

        let mut config = make_config(&[FINALIZER, "other-finalizer"]);
        config.metadata.deletion_timestamp = Some(Time(k8s_openapi::chrono::Utc::now()));
        let task = tokio::spawn(reconcile(Arc::new(config), reconciler.clone()));

        let envelope = manager.next_envelope().await.unwrap();
        assert_eq!(envelope.source, Source::Cleanup);
        assert!(mock.requests_matching("PATCH", CONFIG_PATH).is_empty());
        assert!(!task.is_finished());

        manager.handle_envelope(envelope).await;
        let action = task.await.unwrap().unwrap();
        assert_eq!(action, Action::await_change());

        let patches = mock.requests_matching("PATCH", CONFIG_PATH);
        assert_eq!(patches.len(), 1);
        assert_eq!(
            patches[0].body["metadata"]["finalizers"],
            json!(["other-finalizer"])
        );
        assert_eq!(patches[0].body["metadata"]["resourceVersion"], "1");
        assert!(reconciler.handle.registry().get("workers").is_none());
    }

    #[tokio::test]
    async fn test_cleanup_without_finalizer_is_a_no_op() {
        let mock = MockService::new();
        let (mut manager, reconciler) = make_reconciler(&mock);

        let mut config = make_config(&["other-finalizer"]);
        config.metadata.deletion_timestamp = Some(Time(k8s_openapi::chrono::Utc::now()));
        reconcile(Arc::new(config), reconciler).await.unwrap();

        assert!(manager.try_next_envelope().is_none());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_apply_adds_finalizer_and_records_status() {
        let mock = MockService::new()
            .on_patch(CONFIG_PATH, 200, &node_config_json("workers", &[FINALIZER]))
            .on_patch(STATUS_PATH, 200, &node_config_json("workers", &[FINALIZER]));
        let (mut manager, reconciler) = make_reconciler(&mock);

        let task = tokio::spawn(reconcile(Arc::new(make_config(&[])), reconciler.clone()));

        let envelope = manager.next_envelope().await.unwrap();
        assert_eq!(envelope.source, Source::Reconciler);
        // The finalizer is persisted before the configuration is applied
        let finalizer_patches = mock.requests_matching("PATCH", CONFIG_PATH);
        assert_eq!(finalizer_patches.len(), 1);
        assert_eq!(
            finalizer_patches[0].body["metadata"]["finalizers"],
            json!([FINALIZER])
        );
        assert!(mock.requests_matching("PATCH", STATUS_PATH).is_empty());

        manager.handle_envelope(envelope).await;
        task.await.unwrap().unwrap();

        let status_patches = mock.requests_matching("PATCH", STATUS_PATH);
        assert_eq!(status_patches.len(), 1);
        let body = &status_patches[0].body;
        assert_eq!(body["kind"], "NodeConfig");
        assert_eq!(body["apiVersion"], "factotum.io/v1alpha1");
        assert_eq!(body["status"]["appliedLabels"]["team"], "a");
        assert_eq!(body["status"]["conditions"][0]["type"], "Applied");
        assert_eq!(body["status"]["conditions"][0]["status"], "True");
        assert_eq!(body["status"]["conditions"][0]["observedGeneration"], 3);

        let registered = reconciler.handle.registry().get("workers").unwrap();
        assert!(registered.status.is_some());
        assert!(has_finalizer(registered.meta()));
    }

    #[tokio::test]
    async fn test_apply_marks_failure_when_processor_is_gone() {
        let mock = MockService::new()
            .on_patch(STATUS_PATH, 200, &node_config_json("workers", &[FINALIZER]));
        let (manager, reconciler) = make_reconciler(&mock);
        drop(manager);

        let result = reconcile(Arc::new(make_config(&[FINALIZER])), reconciler.clone()).await;

        assert!(matches!(result, Err(FactotumError::ProcessorStopped(_))));
        let status_patches = mock.requests_matching("PATCH", STATUS_PATH);
        assert_eq!(status_patches.len(), 1);
        assert_eq!(
            status_patches[0].body["status"]["conditions"][0]["status"],
            "False"
        );
        assert_eq!(
            reconciler
                .handle
                .registry()
                .get("workers")
                .unwrap()
                .status
                .unwrap()
                .common
                .applied_condition()
                .unwrap()
                .status,
            "False"
        );
    }

    #[tokio::test]
    async fn test_finalizer_failure_stops_reconcile() {
        // No PATCH response registered, so the finalizer patch fails with 404
        let mock = MockService::new();
        let (mut manager, reconciler) = make_reconciler(&mock);

        let result = reconcile(Arc::new(make_config(&[])), reconciler).await;

        assert!(matches!(result, Err(FactotumError::FinalizerError(_))));
        assert!(manager.try_next_envelope().is_none());
    }

    #[tokio::test]
    async fn test_error_policy_requeues_after_configured_delay() {
        let mock = MockService::new();
        let (_manager, reconciler) = make_reconciler(&mock);

        let action = error_policy(
            Arc::new(make_config(&[])),
            &FactotumError::FinalizerError("boom".to_string()),
            reconciler,
        );

        assert_eq!(action, Action::requeue(Duration::from_secs(60)));
    }
}
