use rstest::rstest;

use super::*;

#[test]
fn empty_yaml_gives_defaults_test() {
    let config = Config::from_yaml("{}").unwrap();

    assert_eq!(Config::default(), config);
    assert_eq!("0.0.0.0", config.host);
    assert_eq!(8686, config.port);
    assert!(config.namespaces.is_none());
    assert!(config.logs.dir.is_none());
}

#[test]
fn full_yaml_test() {
    let yaml = r#"
host: 127.0.0.1
port: 9090
namespaces: [apps, tools]
resources:
  - group: cache.example.com
    version: v1alpha1
    kind: Memcached
  - version: v1
    kind: ConfigMap
logs:
  dir: /var/log/crmex
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!("127.0.0.1", config.host);
    assert_eq!(9090, config.port);
    assert_eq!(Some(vec!["apps".to_owned(), "tools".to_owned()]), config.namespaces);
    assert_eq!(2, config.resources.len());
    assert_eq!("Memcached.cache.example.com/v1alpha1", config.resources[0].to_string());
    assert_eq!("ConfigMap/v1", config.resources[1].to_string());
    assert_eq!(Some(PathBuf::from("/var/log/crmex")), config.logs.dir);
}

#[rstest]
#[case("resources: [{ version: v1, kind: '' }]")]
#[case("resources: [{ group: example.com, version: ' ', kind: Memcached }]")]
fn incomplete_resource_test(#[case] yaml: &str) {
    let result = Config::from_yaml(yaml);

    assert!(matches!(result, Err(ConfigError::IncompleteResource(_))));
}

#[test]
fn invalid_yaml_test() {
    let result = Config::from_yaml("port: not-a-number");

    assert!(matches!(result, Err(ConfigError::SerializationError(_))));
}

#[tokio::test]
async fn load_missing_file_test() {
    let result = Config::load(Path::new("/definitely/not/here/config.yaml")).await;

    assert!(matches!(result, Err(ConfigError::IoError(_))));
}

#[tokio::test]
async fn load_or_default_without_path_test() {
    let config = Config::load_or_default(None).await.unwrap();

    assert_eq!(Config::default(), config);
}
