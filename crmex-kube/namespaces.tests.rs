use rstest::rstest;

use super::*;

#[rstest]
#[case("operators", "", vec!["operators"])]
#[case("operators", "apps", vec!["operators"])]
#[case("operators", "apps,tools", vec!["apps", "tools"])]
#[case("operators", "apps, tools ,", vec!["apps", "tools"])]
#[case("operators", ",", vec![])]
fn namespaces_for_metrics_test(#[case] operator_ns: &str, #[case] watch_ns: &str, #[case] expected: Vec<&str>) {
    assert_eq!(expected, namespaces_for_metrics(operator_ns, watch_ns));
}

#[test]
fn read_namespace_file_test() {
    let path = std::env::temp_dir().join(format!("crmex-namespace-{}", std::process::id()));
    std::fs::write(&path, "operators\n").unwrap();

    let namespace = read_namespace_file(&path);
    std::fs::remove_file(&path).unwrap();

    assert_eq!("operators", namespace.unwrap());
}

#[test]
fn read_empty_namespace_file_test() {
    let path = std::env::temp_dir().join(format!("crmex-empty-namespace-{}", std::process::id()));
    std::fs::write(&path, "  \n").unwrap();

    let namespace = read_namespace_file(&path);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(namespace, Err(NamespaceError::EmptyOperatorNamespace)));
}

#[test]
fn read_missing_namespace_file_test() {
    let namespace = read_namespace_file(Path::new("/definitely/not/here/namespace"));

    assert!(matches!(namespace, Err(NamespaceError::NotInCluster(_))));
}
