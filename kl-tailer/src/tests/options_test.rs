use clap::Parser;
use rstest::*;

use crate::{
    Options,
    build_config,
};

#[rstest]
fn test_options_defaults() {
    let args = Options::try_parse_from(["kl-tailer"]).unwrap();

    assert_eq!(args.url, "http://127.0.0.1:8001/");
    assert_eq!(args.cluster, "default");
    assert_eq!(args.since, -1);
    assert!(args.decode);
    assert!(args.labels);
    assert!(!args.json);

    let config = build_config(&args).unwrap();
    assert_eq!(config.since_seconds, None);
    assert!(config.decode);
    assert!(config.merge_labels);
}

#[rstest]
fn test_options_overrides() {
    let args = Options::try_parse_from([
        "kl-tailer",
        "--url",
        "http://10.0.0.1:8080/",
        "--cluster",
        "prod",
        "--since",
        "600",
        "--decode",
        "false",
        "--labels",
        "false",
        "--json",
    ])
    .unwrap();

    let config = build_config(&args).unwrap();
    assert_eq!(config.base_url.as_str(), "http://10.0.0.1:8080/");
    assert_eq!(config.cluster_name, "prod");
    assert_eq!(config.since_seconds, Some(600));
    assert!(!config.decode);
    assert!(!config.merge_labels);
}

#[rstest]
fn test_invalid_url_is_fatal() {
    let args = Options::try_parse_from(["kl-tailer", "--url", "::nope::"]).unwrap();
    assert!(build_config(&args).is_err());
}
