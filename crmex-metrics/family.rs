use kube::ResourceExt;
use kube::api::DynamicObject;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(test)]
#[path = "./family.tests.rs"]
mod family_tests;

/// Label pairs identifying one time series in a metric family.
pub type LabelSet = Vec<(String, String)>;

type GenerateFn = dyn Fn(&DynamicObject) -> Vec<Metric> + Send + Sync;

/// Single metric generated for a Kubernetes object.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label_keys: Vec<String>,
    pub label_values: Vec<String>,
    pub value: i64,
}

impl Metric {
    /// Returns metric labels as key/value pairs.
    pub fn labels(&self) -> LabelSet {
        self.label_keys
            .iter()
            .cloned()
            .zip(self.label_values.iter().cloned())
            .collect()
    }
}

/// Describes gauge metric family and generates its metrics for Kubernetes objects.
#[derive(Clone)]
pub struct FamilyGenerator {
    pub name: String,
    pub help: String,
    generate: Arc<GenerateFn>,
}

impl FamilyGenerator {
    /// Creates new [`FamilyGenerator`] instance.
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        generate: impl Fn(&DynamicObject) -> Vec<Metric> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            generate: Arc::new(generate),
        }
    }

    /// Generates metrics for the provided object.
    pub fn generate(&self, object: &DynamicObject) -> Vec<Metric> {
        (self.generate)(object)
    }
}

impl Debug for FamilyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilyGenerator")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

/// Generates metric families for the custom resource `kind`.\
/// It is a single `<kind>_info` gauge that is always `1` and labeled with object namespace and name.
pub fn generate_metric_families(kind: &str) -> Vec<FamilyGenerator> {
    let name = format!("{}_info", kind.to_lowercase());
    let help = format!("Information about the {kind} custom resource.");

    vec![FamilyGenerator::new(name, help, |object| {
        vec![Metric {
            label_keys: vec!["namespace".to_owned(), "name".to_owned()],
            label_values: vec![object.namespace().unwrap_or_default(), object.name_any()],
            value: 1,
        }]
    })]
}

/// Metric family generator together with the gauge family it writes to.\
/// Time series are reference counted, so the family can be shared by stores that observe the same objects.
#[derive(Clone, Debug)]
pub struct RegisteredFamily {
    generator: FamilyGenerator,
    family: Family<LabelSet, Gauge>,
    owners: Arc<Mutex<HashMap<LabelSet, usize>>>,
}

impl RegisteredFamily {
    /// Creates gauge family for the `generator` and registers it in the `registry`.
    pub fn register(generator: FamilyGenerator, registry: &mut Registry) -> Self {
        let family = Family::<LabelSet, Gauge>::default();
        // registry terminates help text with a dot on its own
        registry.register(&generator.name, generator.help.trim_end_matches('.'), family.clone());

        Self {
            generator,
            family,
            owners: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns metric family name.
    pub fn name(&self) -> &str {
        &self.generator.name
    }

    /// Generates label sets and values for the provided object.
    pub fn generate(&self, object: &DynamicObject) -> Vec<(LabelSet, i64)> {
        self.generator
            .generate(object)
            .into_iter()
            .map(|metric| (metric.labels(), metric.value))
            .collect()
    }

    /// Takes ownership of the time series identified by `labels` and sets its value.
    pub fn acquire(&self, labels: &LabelSet, value: i64) {
        let mut owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        *owners.entry(labels.clone()).or_default() += 1;
        self.family.get_or_create(labels).set(value);
    }

    /// Sets value of the already acquired time series identified by `labels`.
    pub fn set(&self, labels: &LabelSet, value: i64) {
        self.family.get_or_create(labels).set(value);
    }

    /// Gives up ownership of the time series identified by `labels`.\
    /// Returns `true` if it was the last owner and the time series was removed.
    pub fn release(&self, labels: &LabelSet) -> bool {
        let mut owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(count) = owners.get_mut(labels) else {
            return false;
        };

        *count -= 1;
        if *count > 0 {
            return false;
        }

        owners.remove(labels);
        self.family.remove(labels)
    }
}

/// Registers all `generators` in the `registry`.
pub fn register_families(generators: Vec<FamilyGenerator>, registry: &mut Registry) -> Arc<[RegisteredFamily]> {
    generators
        .into_iter()
        .map(|generator| RegisteredFamily::register(generator, registry))
        .collect()
}
