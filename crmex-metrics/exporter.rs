use crmex_kube::{
    ApiResourceLists, CatalogError, api_version, find_api_resource, format_gvk, get_api_resource_lists, is_namespaced,
};
use kube::Client;
use kube::core::GroupVersionKind;
use prometheus_client::registry::Registry;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    BgMetricsStore, RegisteredFamily, StoresReadiness, generate_metric_families, new_cluster_scoped_metrics_stores,
    new_namespaced_metrics_stores, register_families, serve_metrics,
};

#[cfg(test)]
#[path = "./exporter.tests.rs"]
mod exporter_tests;

/// Possible errors from setting up custom resource metrics.
#[derive(thiserror::Error, Debug)]
pub enum CrMetricsError {
    /// No namespaces to generate metrics for.
    #[error("namespaces were empty; pass at least one namespace to generate custom resource metrics")]
    EmptyNamespaces,

    /// Resource type lookup failed.
    #[error(transparent)]
    CatalogError(#[from] CatalogError),
}

/// Running custom resource metrics stores together with the metrics server.
pub struct CrMetrics {
    stores: Vec<BgMetricsStore>,
    server: Option<JoinHandle<()>>,
    cancellation_token: CancellationToken,
}

impl CrMetrics {
    /// Returns number of running metrics stores.
    pub fn stores_count(&self) -> usize {
        self.stores.len()
    }

    /// Returns `true` if every metrics store received the initial list of objects.
    pub fn is_ready(&self) -> bool {
        self.stores.iter().all(BgMetricsStore::is_ready)
    }

    /// Cancels metrics stores and the metrics server.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    /// Cancels metrics stores and the metrics server and waits until they are finished.\
    /// **Note** that it must not be called from within the async runtime worker thread.
    pub fn stop(&mut self) {
        self.cancel();
        for store in &mut self.stores {
            store.stop();
        }

        crmex_common::tasks::wait_for_task(self.server.take(), "metrics server");
    }
}

impl Drop for CrMetrics {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Generates `<kind>_info` metrics for each custom resource type in `gvks` and starts serving them on `host:port`.\
/// Namespaced resources are observed in each of the `namespaces`, passing an empty list results in an error.
pub async fn generate_and_serve_cr_metrics(
    client: Client,
    namespaces: &[String],
    gvks: &[GroupVersionKind],
    host: &str,
    port: u16,
) -> Result<CrMetrics, CrMetricsError> {
    if namespaces.is_empty() {
        return Err(CrMetricsError::EmptyNamespaces);
    }

    tracing::debug!("Starting collecting operator types");
    let lists = get_api_resource_lists(&client, gvks).await?;

    let runtime = Handle::current();
    let cancellation_token = CancellationToken::new();
    let mut registry = Registry::default();
    let stores = start_metrics_stores(
        &runtime,
        &client,
        namespaces,
        gvks,
        &lists,
        &mut registry,
        &cancellation_token,
    )?;

    tracing::debug!("Starting serving custom resource metrics");
    let readiness = StoresReadiness::new(stores.iter().map(BgMetricsStore::readiness));
    let registry = Arc::new(registry);
    let host = host.to_owned();
    let server_token = cancellation_token.clone();
    let server = runtime.spawn(async move {
        if let Err(error) = serve_metrics(registry, readiness, &host, port, server_token).await {
            tracing::error!("Custom resource metrics server error: {}", error);
        }
    });

    Ok(CrMetrics {
        stores,
        server: Some(server),
        cancellation_token,
    })
}

/// Registers metric families and starts metrics stores for every resource type.\
/// Resource types with the same kind (e.g. served in many versions) share their metric families.\
/// **Note** that already started stores are cancelled when any resource type cannot be resolved.
fn start_metrics_stores(
    runtime: &Handle,
    client: &Client,
    namespaces: &[String],
    gvks: &[GroupVersionKind],
    lists: &ApiResourceLists,
    registry: &mut Registry,
    parent: &CancellationToken,
) -> Result<Vec<BgMetricsStore>, CatalogError> {
    let mut stores = Vec::new();
    let mut registered = HashMap::<String, Arc<[RegisteredFamily]>>::new();
    for (index, gvk) in gvks.iter().enumerate() {
        if gvks[..index].contains(gvk) {
            tracing::warn!("Skipping duplicated resource type {}", format_gvk(gvk));
            continue;
        }

        let ar = find_api_resource(gvk, lists)?;
        let families = match registered.entry(gvk.kind.to_lowercase()) {
            Entry::Occupied(entry) => {
                let names = entry.get().iter().map(RegisteredFamily::name).collect::<Vec<_>>();
                tracing::debug!("Sharing metric families {} with {}", names.join(", "), format_gvk(gvk));
                Arc::clone(entry.get())
            },
            Entry::Vacant(entry) => {
                tracing::debug!(api_version = %api_version(gvk), kind = %gvk.kind, "Generating metric families");
                let generators = generate_metric_families(&gvk.kind);
                Arc::clone(entry.insert(register_families(generators, registry)))
            },
        };

        if is_namespaced(gvk, lists)? {
            stores.extend(new_namespaced_metrics_stores(runtime, client, &ar, namespaces, &families, parent));
        } else {
            stores.extend(new_cluster_scoped_metrics_stores(runtime, client, &ar, &families, parent));
        }
    }

    Ok(stores)
}
