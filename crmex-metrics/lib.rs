pub use self::exporter::{CrMetrics, CrMetricsError, generate_and_serve_cr_metrics};
pub use self::family::{FamilyGenerator, LabelSet, Metric, RegisteredFamily, generate_metric_families, register_families};
pub use self::server::{OPENMETRICS_CONTENT_TYPE, ServerError, StoresReadiness, metrics_router, serve_metrics, serve_metrics_on};
pub use self::store::MetricsStore;
pub use self::watcher::{BgMetricsStore, new_cluster_scoped_metrics_stores, new_namespaced_metrics_stores};

mod exporter;
mod family;
mod server;
mod store;
mod watcher;
