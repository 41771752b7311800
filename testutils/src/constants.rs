pub const TEST_CLUSTER: &str = "test-cluster";
pub const TEST_NAMESPACE: &str = "test-namespace";
pub const TEST_WORKLOAD: &str = "the-workload";
pub const TEST_NODE: &str = "node-1";
pub const TEST_CONTAINER: &str = "the-container";
pub const TEST_CONTAINER_ID: &str = "containerd://id-1";

// A base URL with nothing listening behind it; connection attempts fail fast
pub const UNROUTABLE_BASE_URL: &str = "http://127.0.0.1:1/";
