use rstest::rstest;

use super::*;

#[rstest]
#[case("Memcached.cache.example.com/v1alpha1", "cache.example.com", "v1alpha1", "Memcached")]
#[case("ConfigMap/v1", "", "v1", "ConfigMap")]
#[case("ConfigMap./v1", "", "v1", "ConfigMap")]
#[case(" Deployment.apps/v1 ", "apps", "v1", "Deployment")]
fn parse_gvk_test(#[case] value: &str, #[case] group: &str, #[case] version: &str, #[case] kind: &str) {
    let gvk = parse_gvk(value).unwrap();

    assert_eq!(group, gvk.group);
    assert_eq!(version, gvk.version);
    assert_eq!(kind, gvk.kind);
}

#[rstest]
#[case("Memcached", GvkError::MissingVersion("Memcached".to_owned()))]
#[case("Memcached.cache.example.com/", GvkError::MissingVersion("Memcached.cache.example.com/".to_owned()))]
#[case("Memcached.example.com/v1/extra", GvkError::MissingVersion("Memcached.example.com/v1/extra".to_owned()))]
#[case(".cache.example.com/v1", GvkError::MissingKind(".cache.example.com/v1".to_owned()))]
#[case("/v1", GvkError::MissingKind("/v1".to_owned()))]
fn parse_gvk_error_test(#[case] value: &str, #[case] expected: GvkError) {
    assert_eq!(expected, parse_gvk(value).unwrap_err());
}

#[test]
fn format_gvk_test() {
    let gvk = GroupVersionKind::gvk("cache.example.com", "v1alpha1", "Memcached");
    assert_eq!("cache.example.com/v1alpha1", api_version(&gvk));
    assert_eq!("cache.example.com/v1alpha1, Kind=Memcached", format_gvk(&gvk));

    let gvk = GroupVersionKind::gvk("", "v1", "ConfigMap");
    assert_eq!("v1", api_version(&gvk));
    assert_eq!("v1, Kind=ConfigMap", format_gvk(&gvk));
}
