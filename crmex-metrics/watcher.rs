use crmex_kube::{StreamBackoff, WatchBackoff};
use futures::{StreamExt, TryStreamExt};
use kube::api::{ApiResource, DynamicObject};
use kube::runtime::watcher::{self, watcher};
use kube::{Api, Client};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{MetricsStore, RegisteredFamily};

/// Background task that keeps [`MetricsStore`] in sync with Kubernetes objects.
pub struct BgMetricsStore {
    description: String,
    task: Option<JoinHandle<()>>,
    cancellation_token: CancellationToken,
    ready: Arc<AtomicBool>,
}

impl BgMetricsStore {
    /// Starts watching objects served by `api` and writing their metrics to `families`.\
    /// **Note** that the task is cancelled together with the `parent` token.
    pub fn start(
        runtime: &Handle,
        api: Api<DynamicObject>,
        families: Arc<[RegisteredFamily]>,
        description: String,
        parent: &CancellationToken,
    ) -> Self {
        let cancellation_token = parent.child_token();
        let store = MetricsStore::new(families);
        let ready = store.readiness();

        tracing::debug!("Starting metrics store for {}", description);
        let task = runtime.spawn(watch(api, store, description.clone(), cancellation_token.clone()));

        Self {
            description,
            task: Some(task),
            cancellation_token,
            ready,
        }
    }

    /// Returns description of the observed objects.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns `true` if the store received the initial list of objects.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Returns shared readiness flag of the store.
    pub fn readiness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.ready)
    }

    /// Cancels [`BgMetricsStore`] task.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    /// Cancels [`BgMetricsStore`] task and waits until it is finished.
    pub fn stop(&mut self) {
        self.cancel();
        crmex_common::tasks::wait_for_task(self.task.take(), &self.description);
    }
}

impl Drop for BgMetricsStore {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Starts one [`BgMetricsStore`] per namespace for the namespaced resource.
pub fn new_namespaced_metrics_stores(
    runtime: &Handle,
    client: &Client,
    ar: &ApiResource,
    namespaces: &[String],
    families: &Arc<[RegisteredFamily]>,
    parent: &CancellationToken,
) -> Vec<BgMetricsStore> {
    namespaces
        .iter()
        .map(|namespace| {
            BgMetricsStore::start(
                runtime,
                Api::namespaced_with(client.clone(), namespace, ar),
                Arc::clone(families),
                format!("{} in {}", ar.plural, namespace),
                parent,
            )
        })
        .collect()
}

/// Starts single [`BgMetricsStore`] for the cluster scoped resource.
pub fn new_cluster_scoped_metrics_stores(
    runtime: &Handle,
    client: &Client,
    ar: &ApiResource,
    families: &Arc<[RegisteredFamily]>,
    parent: &CancellationToken,
) -> Vec<BgMetricsStore> {
    vec![BgMetricsStore::start(
        runtime,
        Api::all_with(client.clone(), ar),
        Arc::clone(families),
        ar.plural.clone(),
        parent,
    )]
}

async fn watch(api: Api<DynamicObject>, mut store: MetricsStore, description: String, cancellation_token: CancellationToken) {
    let mut stream = StreamBackoff::new(watcher(api, watcher::Config::default()), WatchBackoff::default()).boxed();

    while !cancellation_token.is_cancelled() {
        tokio::select! {
            () = cancellation_token.cancelled() => (),
            result = stream.try_next() => match result {
                Ok(Some(event)) => store.apply_event(event),
                Ok(None) => {
                    tracing::warn!("Watch {} has ended", description);
                    break;
                },
                Err(error) => tracing::warn!("Watch {}: {}", description, error),
            },
        }
    }

    store.clear();
    tracing::debug!("Metrics store for {} stopped", description);
}
