use clap::Parser;
use crmex_config::{Config, ResourceConfig};
use crmex_kube::{
    GroupVersionKind, GvkError, NamespaceError, namespaces_for_metrics, operator_namespace, parse_gvk, watch_namespace,
};
use std::path::PathBuf;

#[cfg(test)]
#[path = "./cli.tests.rs"]
mod cli_tests;

/// crmex exports `<kind>_info` Prometheus metrics for Kubernetes custom resources.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, short, env = "CRMEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the kubeconfig file (defaults to in-cluster configuration or $HOME/.kube/config).
    #[arg(long, env = "KUBECONFIG")]
    pub kube_config: Option<PathBuf>,

    /// Context to use from the kubeconfig file.
    #[arg(long)]
    pub context: Option<String>,

    /// Skip TLS certificate verification (insecure).
    #[arg(long)]
    pub insecure: bool,

    /// Host to serve metrics on.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to serve metrics on.
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Namespace the operator runs in (defaults to the service account namespace).
    #[arg(long, short, env = "POD_NAMESPACE")]
    pub namespace: Option<String>,

    /// Comma separated namespaces to export metrics for (overrides WATCH_NAMESPACE based resolution).
    #[arg(long, value_delimiter = ',')]
    pub metrics_namespaces: Vec<String>,

    /// Custom resource types to export metrics for (e.g. Memcached.cache.example.com/v1alpha1).
    #[arg()]
    pub resources: Vec<String>,
}

impl Args {
    /// Returns host or `default` if host is not set.
    pub fn host<'a>(&'a self, default: &'a str) -> &'a str {
        self.host.as_deref().unwrap_or(default)
    }

    /// Returns port or `default` if port is not set.
    pub fn port(&self, default: u16) -> u16 {
        self.port.unwrap_or(default)
    }

    /// Returns resource types from the command line or from the configuration if none were provided.
    pub fn resources(&self, config: &Config) -> Result<Vec<GroupVersionKind>, GvkError> {
        if self.resources.is_empty() {
            Ok(config.resources.iter().map(to_gvk).collect())
        } else {
            self.resources.iter().map(|r| parse_gvk(r)).collect()
        }
    }

    /// Returns namespaces to export metrics for.\
    /// If they are not set explicitly, they are resolved from the operator namespace and `WATCH_NAMESPACE`.
    pub fn namespaces(&self, config: &Config) -> Result<Vec<String>, NamespaceError> {
        if let Some(namespaces) = self.explicit_namespaces(config) {
            return Ok(namespaces);
        }

        let operator_ns = match self.namespace.as_deref() {
            Some(namespace) => namespace.to_owned(),
            None => operator_namespace()?,
        };

        Ok(namespaces_for_metrics(&operator_ns, &watch_namespace()?))
    }

    /// Returns namespaces set on the command line or in the configuration.
    pub fn explicit_namespaces(&self, config: &Config) -> Option<Vec<String>> {
        let namespaces = self
            .metrics_namespaces
            .iter()
            .map(|ns| ns.trim())
            .filter(|ns| !ns.is_empty())
            .map(String::from)
            .collect::<Vec<_>>();

        if namespaces.is_empty() {
            config.namespaces.clone()
        } else {
            Some(namespaces)
        }
    }
}

fn to_gvk(resource: &ResourceConfig) -> GroupVersionKind {
    GroupVersionKind::gvk(resource.group.trim(), resource.version.trim(), resource.kind.trim())
}
