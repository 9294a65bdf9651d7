use kube::config::{InferConfigError, KubeConfigOptions, Kubeconfig, KubeconfigError};
use kube::{Client, Config};
use std::path::Path;

/// Possible errors from building kubernetes client.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// Failed to infer in-cluster or local kube configuration.
    #[error("failed to infer kube configuration")]
    InferConfigError(#[from] InferConfigError),

    /// Failed to process kube configuration.
    #[error("failed to process kube configuration")]
    KubeconfigError(#[from] KubeconfigError),

    /// Failed to build kubernetes client.
    #[error("failed to build kubernetes client")]
    KubeError(#[from] kube::Error),
}

/// Wrapper for the kubernetes [`Client`].
pub struct KubernetesClient {
    client: Client,
    context: Option<String>,
    k8s_version: String,
}

impl KubernetesClient {
    /// Creates new [`KubernetesClient`] instance.\
    /// Without `kube_config` and `context` the configuration is inferred (in-cluster first, then local kubeconfig).
    pub async fn new(kube_config: Option<&Path>, context: Option<&str>, insecure: bool) -> Result<Self, ClientError> {
        let mut config = get_config(kube_config, context).await?;
        if insecure {
            config.accept_invalid_certs = true;
        }

        let client = Client::try_from(config)?;
        let k8s_version = client.apiserver_version().await?.git_version;

        Ok(Self {
            client,
            context: context.map(String::from),
            k8s_version,
        })
    }

    /// Returns cloned kubernetes client that can be consumed.
    pub fn get_client(&self) -> Client {
        self.client.clone()
    }

    /// Returns kube context name used to build the client, `None` if configuration was inferred.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns kubernetes API server version.
    pub fn k8s_version(&self) -> &str {
        &self.k8s_version
    }
}

async fn get_config(kube_config: Option<&Path>, context: Option<&str>) -> Result<Config, ClientError> {
    if kube_config.is_none() && context.is_none() {
        return Ok(Config::infer().await?);
    }

    let kube_config = match kube_config {
        Some(path) => Kubeconfig::read_from(path)?,
        None => Kubeconfig::read()?,
    };
    let options = KubeConfigOptions {
        context: context.map(String::from),
        cluster: None,
        user: None,
    };

    Ok(Config::from_custom_kubeconfig(kube_config, &options).await?)
}
