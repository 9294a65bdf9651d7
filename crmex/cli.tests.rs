use crmex_config::ResourceConfig;
use rstest::rstest;

use super::*;

fn parse(args: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("crmex").chain(args.iter().copied())).unwrap()
}

#[rstest]
#[case(&[], "0.0.0.0", 8686)]
#[case(&["--host", "127.0.0.1"], "127.0.0.1", 8686)]
#[case(&["--host", "::1", "--port", "9090"], "::1", 9090)]
#[case(&["-p", "8080"], "0.0.0.0", 8080)]
fn host_and_port_test(#[case] args: &[&str], #[case] expected_host: &str, #[case] expected_port: u16) {
    let args = parse(args);

    assert_eq!(expected_host, args.host("0.0.0.0"));
    assert_eq!(expected_port, args.port(8686));
}

#[test]
fn resources_from_command_line_test() {
    let args = parse(&["Memcached.cache.example.com/v1alpha1", "ConfigMap/v1"]);
    let config = Config {
        resources: vec![ResourceConfig {
            group: "ignored.example.com".to_owned(),
            version: "v1".to_owned(),
            kind: "Ignored".to_owned(),
        }],
        ..Default::default()
    };

    let gvks = args.resources(&config).unwrap();

    assert_eq!(2, gvks.len());
    assert_eq!("cache.example.com", gvks[0].group);
    assert_eq!("Memcached", gvks[0].kind);
    assert_eq!("", gvks[1].group);
    assert_eq!("ConfigMap", gvks[1].kind);
}

#[test]
fn resources_from_config_test() {
    let args = parse(&[]);
    let config = Config {
        resources: vec![ResourceConfig {
            group: "cache.example.com".to_owned(),
            version: "v1alpha1".to_owned(),
            kind: "Memcached".to_owned(),
        }],
        ..Default::default()
    };

    let gvks = args.resources(&config).unwrap();

    assert_eq!(1, gvks.len());
    assert_eq!("v1alpha1", gvks[0].version);
    assert_eq!("Memcached", gvks[0].kind);
}

#[test]
fn invalid_resource_test() {
    let args = parse(&["Memcached"]);

    assert!(matches!(args.resources(&Config::default()), Err(GvkError::MissingVersion(_))));
}

#[test]
fn explicit_namespaces_test() {
    let config = Config {
        namespaces: Some(vec!["from-config".to_owned()]),
        ..Default::default()
    };

    let args = parse(&["--metrics-namespaces", "apps, tools"]);
    assert_eq!(Some(vec!["apps".to_owned(), "tools".to_owned()]), args.explicit_namespaces(&config));

    let args = parse(&[]);
    assert_eq!(Some(vec!["from-config".to_owned()]), args.explicit_namespaces(&config));
    assert_eq!(None, args.explicit_namespaces(&Config::default()));

    let args = parse(&["--metrics-namespaces", "apps"]);
    assert_eq!(vec!["apps".to_owned()], args.namespaces(&Config::default()).unwrap());
}
