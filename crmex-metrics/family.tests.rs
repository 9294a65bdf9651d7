use kube::api::ApiResource;
use kube::core::GroupVersionKind;
use prometheus_client::encoding::text::encode;
use rstest::rstest;

use super::*;

fn memcached(name: &str, namespace: Option<&str>) -> DynamicObject {
    let ar = ApiResource::from_gvk(&GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Memcached"));
    let object = DynamicObject::new(name, &ar);
    match namespace {
        Some(namespace) => object.within(namespace),
        None => object,
    }
}

fn labels(namespace: &str, name: &str) -> LabelSet {
    vec![
        ("namespace".to_owned(), namespace.to_owned()),
        ("name".to_owned(), name.to_owned()),
    ]
}

#[rstest]
#[case("Memcached", "memcached_info")]
#[case("CacheCluster", "cachecluster_info")]
#[case("etcd", "etcd_info")]
fn metric_family_name_test(#[case] kind: &str, #[case] expected: &str) {
    let families = generate_metric_families(kind);

    assert_eq!(1, families.len());
    assert_eq!(expected, families[0].name);
    assert_eq!(format!("Information about the {kind} custom resource."), families[0].help);
}

#[test]
fn namespaced_object_metric_test() {
    let families = generate_metric_families("Memcached");

    let metrics = families[0].generate(&memcached("example", Some("default")));

    assert_eq!(
        vec![Metric {
            label_keys: vec!["namespace".to_owned(), "name".to_owned()],
            label_values: vec!["default".to_owned(), "example".to_owned()],
            value: 1,
        }],
        metrics
    );
    assert_eq!(labels("default", "example"), metrics[0].labels());
}

#[test]
fn cluster_scoped_object_metric_test() {
    let families = generate_metric_families("Memcached");

    let metrics = families[0].generate(&memcached("global", None));

    assert_eq!(1, metrics.len());
    assert_eq!(1, metrics[0].value);
    assert_eq!(labels("", "global"), metrics[0].labels());
}

#[test]
fn registered_family_encoding_test() {
    let mut registry = Registry::default();
    let families = register_families(generate_metric_families("Memcached"), &mut registry);
    let family = &families[0];

    for (labels, value) in family.generate(&memcached("example", Some("default"))) {
        family.acquire(&labels, value);
    }

    let mut text = String::new();
    encode(&mut text, &registry).unwrap();
    assert_eq!("memcached_info", family.name());
    assert!(text.contains("# TYPE memcached_info gauge"));
    assert!(text.contains("# HELP memcached_info Information about the Memcached custom resource"));
    assert!(text.contains(r#"memcached_info{namespace="default",name="example"} 1"#));

    assert!(family.release(&labels("default", "example")));
    assert!(!family.release(&labels("default", "example")));

    let mut text = String::new();
    encode(&mut text, &registry).unwrap();
    assert!(!text.contains(r#"memcached_info{"#));
}

#[test]
fn shared_series_removed_by_last_owner_test() {
    let mut registry = Registry::default();
    let families = register_families(generate_metric_families("Memcached"), &mut registry);
    let family = &families[0];
    let series = labels("default", "example");

    family.acquire(&series, 1);
    family.acquire(&series, 1);

    assert!(!family.release(&series));
    let mut text = String::new();
    encode(&mut text, &registry).unwrap();
    assert!(text.contains(r#"memcached_info{namespace="default",name="example"} 1"#));

    assert!(family.release(&series));
    let mut text = String::new();
    encode(&mut text, &registry).unwrap();
    assert!(!text.contains(r#"memcached_info{"#));
}
