use reqwest::Url;

use crate::errors::*;

// Runtime options shared by every node in the watch tree.  The config also
// owns URL construction so the individual tree levels never do string
// surgery on the base URL themselves.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: Url,
    pub cluster_name: String,

    // When set, log requests carry sinceSeconds
    pub since_seconds: Option<u64>,

    // Master switch for JSON message promotion
    pub decode: bool,

    // Merge workload labels into every emitted record
    pub merge_labels: bool,
}

impl Config {
    pub fn new(base_url: &str, cluster_name: &str) -> anyhow::Result<Config> {
        let base_url = Url::parse(base_url).map_err(|_| AgentError::config_invalid(base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(AgentError::config_invalid(base_url.as_str()));
        }

        Ok(Config {
            base_url,
            cluster_name: cluster_name.into(),
            since_seconds: None,
            decode: true,
            merge_labels: true,
        })
    }

    pub fn namespaces_url(&self) -> Url {
        self.watch_url(&["api", "v1", "namespaces"])
    }

    pub fn workloads_url(&self, namespace: &str) -> Url {
        self.watch_url(&["api", "v1", "namespaces", namespace, "pods"])
    }

    pub fn log_url(&self, namespace: &str, workload: &str, container: &str) -> Url {
        let mut url = self.api_url(&["api", "v1", "namespaces", namespace, "pods", workload, "log"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("follow", "true");
            query.append_pair("timestamps", "true");
            query.append_pair("container", container);
            if let Some(secs) = self.since_seconds {
                query.append_pair("sinceSeconds", &secs.to_string());
            }
        }
        url
    }

    fn watch_url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url(segments);
        url.query_pairs_mut().append_pair("watch", "true");
        url
    }

    // Appends path segments to whatever path the base URL already carries, so
    // a base pointing at a reverse-proxy prefix keeps working.
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .expect("base URL validated at construction")
            .pop_if_empty()
            .extend(segments);
        url
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::errors::AgentError;

    #[rstest]
    #[case::garbage("not a url")]
    #[case::no_base("mailto:root@example.com")]
    fn test_invalid_base_url(#[case] bad: &str) {
        let err = Config::new(bad, "default").unwrap_err();
        assert!(matches!(err.downcast_ref(), Some(AgentError::ConfigInvalid(_))));
    }

    #[rstest]
    #[case::bare_host("http://127.0.0.1:8001")]
    #[case::trailing_slash("http://127.0.0.1:8001/")]
    fn test_namespaces_url(#[case] base: &str) {
        let config = Config::new(base, "default").unwrap();
        assert_eq!(
            config.namespaces_url().as_str(),
            "http://127.0.0.1:8001/api/v1/namespaces?watch=true"
        );
    }

    #[rstest]
    fn test_workloads_url_keeps_base_path_prefix() {
        let config = Config::new("http://proxy.local/cluster-a/", "default").unwrap();
        assert_eq!(
            config.workloads_url("kube-system").as_str(),
            "http://proxy.local/cluster-a/api/v1/namespaces/kube-system/pods?watch=true"
        );
    }

    #[rstest]
    #[case::without_since(None, "http://h/api/v1/namespaces/ns/pods/wl/log?follow=true&timestamps=true&container=main")]
    #[case::with_since(
        Some(600),
        "http://h/api/v1/namespaces/ns/pods/wl/log?follow=true&timestamps=true&container=main&sinceSeconds=600"
    )]
    fn test_log_url(#[case] since_seconds: Option<u64>, #[case] expected: &str) {
        let mut config = Config::new("http://h/", "default").unwrap();
        config.since_seconds = since_seconds;
        assert_eq!(config.log_url("ns", "wl", "main").as_str(), expected);
    }
}
