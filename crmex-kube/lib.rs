pub use self::backoff::WatchBackoff;
pub use self::catalog::{ApiResourceLists, CatalogError, find_api_resource, get_api_resource_lists, is_namespaced};
pub use self::client::{ClientError, KubernetesClient};
pub use self::gvk::{GvkError, api_version, format_gvk, parse_gvk};
pub use self::namespaces::{
    NamespaceError, SERVICE_ACCOUNT_NAMESPACE_PATH, WATCH_NAMESPACE_ENV, namespaces_for_metrics, operator_namespace,
    watch_namespace,
};
pub use self::stream_backoff::StreamBackoff;
pub use kube::core::GroupVersionKind;

mod backoff;
mod catalog;
mod client;
mod gvk;
mod namespaces;
mod stream_backoff;
