use k8s_openapi::serde_json::json;
use kube::api::ApiResource;
use kube::core::GroupVersionKind;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;

use super::*;
use crate::{FamilyGenerator, Metric, generate_metric_families, register_families};

fn memcached(name: &str, phase: &str) -> DynamicObject {
    let ar = ApiResource::from_gvk(&GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Memcached"));
    DynamicObject::new(name, &ar)
        .within("default")
        .data(json!({ "status": { "phase": phase } }))
}

fn phase_family() -> FamilyGenerator {
    FamilyGenerator::new("memcached_status_phase", "Memcached phase.", |object| {
        vec![Metric {
            label_keys: vec!["name".to_owned(), "phase".to_owned()],
            label_values: vec![
                object.name_any(),
                object.data["status"]["phase"].as_str().unwrap_or_default().to_owned(),
            ],
            value: 1,
        }]
    })
}

fn new_store(generators: Vec<FamilyGenerator>) -> (MetricsStore, Registry) {
    let mut registry = Registry::default();
    let families = register_families(generators, &mut registry);
    (MetricsStore::new(families), registry)
}

fn series(registry: &Registry) -> Vec<String> {
    let mut text = String::new();
    encode(&mut text, registry).unwrap();
    text.lines().filter(|l| !l.starts_with('#')).map(String::from).collect()
}

#[test]
fn apply_and_delete_test() {
    let (mut store, registry) = new_store(generate_metric_families("Memcached"));

    store.apply_event(Event::Apply(memcached("first", "Running")));
    store.apply_event(Event::Apply(memcached("second", "Running")));
    store.apply_event(Event::Apply(memcached("first", "Running")));

    assert_eq!(2, store.len());
    let lines = series(&registry);
    assert_eq!(2, lines.len());
    assert!(lines.contains(&r#"memcached_info{namespace="default",name="first"} 1"#.to_owned()));
    assert!(lines.contains(&r#"memcached_info{namespace="default",name="second"} 1"#.to_owned()));

    store.apply_event(Event::Delete(memcached("first", "Running")));

    assert_eq!(1, store.len());
    assert_eq!(
        vec![r#"memcached_info{namespace="default",name="second"} 1"#.to_owned()],
        series(&registry)
    );
}

#[test]
fn relist_drops_stale_objects_test() {
    let (mut store, registry) = new_store(generate_metric_families("Memcached"));
    store.apply_event(Event::Init);
    store.apply_event(Event::InitApply(memcached("first", "Running")));
    store.apply_event(Event::InitApply(memcached("second", "Running")));
    store.apply_event(Event::InitDone);
    assert_eq!(2, store.len());

    store.apply_event(Event::Init);
    store.apply_event(Event::InitApply(memcached("second", "Running")));
    store.apply_event(Event::InitApply(memcached("third", "Running")));
    assert_eq!(3, store.len());
    store.apply_event(Event::InitDone);

    assert_eq!(2, store.len());
    let lines = series(&registry);
    assert!(!lines.iter().any(|l| l.contains(r#"name="first""#)));
    assert!(lines.iter().any(|l| l.contains(r#"name="second""#)));
    assert!(lines.iter().any(|l| l.contains(r#"name="third""#)));
}

#[test]
fn ready_after_initial_list_test() {
    let (mut store, _registry) = new_store(generate_metric_families("Memcached"));
    let readiness = store.readiness();

    store.apply_event(Event::Init);
    assert!(!store.is_ready());

    store.apply_event(Event::InitDone);
    assert!(store.is_ready());
    assert!(readiness.load(Ordering::Relaxed));
    assert!(store.is_empty());

    store.apply_event(Event::Init);
    assert!(store.is_ready());
}

#[test]
fn changed_labels_replace_series_test() {
    let (mut store, registry) = new_store(vec![phase_family()]);

    store.apply_event(Event::Apply(memcached("first", "Pending")));
    store.apply_event(Event::Apply(memcached("first", "Running")));

    assert_eq!(
        vec![r#"memcached_status_phase{name="first",phase="Running"} 1"#.to_owned()],
        series(&registry)
    );
}

#[test]
fn clear_removes_all_series_test() {
    let mut generators = generate_metric_families("Memcached");
    generators.push(phase_family());
    let (mut store, registry) = new_store(generators);

    store.apply_event(Event::Apply(memcached("first", "Running")));
    store.apply_event(Event::Apply(memcached("second", "Pending")));
    assert_eq!(4, series(&registry).len());

    store.clear();

    assert!(store.is_empty());
    assert!(series(&registry).is_empty());
}

#[test]
fn stores_sharing_families_keep_common_series_test() {
    let mut registry = Registry::default();
    let families = register_families(generate_metric_families("Memcached"), &mut registry);
    let mut first = MetricsStore::new(Arc::clone(&families));
    let mut second = MetricsStore::new(families);

    first.apply_event(Event::Apply(memcached("example", "Running")));
    second.apply_event(Event::Apply(memcached("example", "Running")));
    second.apply_event(Event::Apply(memcached("example", "Running")));

    let expected = vec![r#"memcached_info{namespace="default",name="example"} 1"#.to_owned()];
    assert_eq!(expected, series(&registry));

    first.apply_event(Event::Delete(memcached("example", "Running")));
    assert_eq!(expected, series(&registry));

    second.clear();
    assert!(series(&registry).is_empty());
}
