use std::path::Path;

#[cfg(test)]
#[path = "./namespaces.tests.rs"]
mod namespaces_tests;

pub const WATCH_NAMESPACE_ENV: &str = "WATCH_NAMESPACE";
pub const SERVICE_ACCOUNT_NAMESPACE_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Possible errors from resolving namespaces.
#[derive(thiserror::Error, Debug)]
pub enum NamespaceError {
    /// `WATCH_NAMESPACE` environment variable is not set.
    #[error("{WATCH_NAMESPACE_ENV} must be set")]
    WatchNamespaceNotSet,

    /// Service account namespace file cannot be read.
    #[error("cannot read operator namespace, not running in a cluster")]
    NotInCluster(#[source] std::io::Error),

    /// Service account namespace file is empty.
    #[error("operator namespace is empty")]
    EmptyOperatorNamespace,
}

/// Reads namespace the operator runs in from the service account namespace file.
pub fn operator_namespace() -> Result<String, NamespaceError> {
    read_namespace_file(Path::new(SERVICE_ACCOUNT_NAMESPACE_PATH))
}

/// Returns value of the `WATCH_NAMESPACE` environment variable.
pub fn watch_namespace() -> Result<String, NamespaceError> {
    std::env::var(WATCH_NAMESPACE_ENV).map_err(|_| NamespaceError::WatchNamespaceNotSet)
}

/// Returns namespaces to export metrics for.\
/// It is just the operator namespace unless `watch_namespace` is a comma separated list of namespaces.
pub fn namespaces_for_metrics(operator_namespace: &str, watch_namespace: &str) -> Vec<String> {
    if watch_namespace.contains(',') {
        watch_namespace
            .split(',')
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .map(String::from)
            .collect()
    } else {
        vec![operator_namespace.to_owned()]
    }
}

fn read_namespace_file(path: &Path) -> Result<String, NamespaceError> {
    let namespace = std::fs::read_to_string(path).map_err(NamespaceError::NotInCluster)?;
    let namespace = namespace.trim();
    if namespace.is_empty() {
        Err(NamespaceError::EmptyOperatorNamespace)
    } else {
        Ok(namespace.to_owned())
    }
}
