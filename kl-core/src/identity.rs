use std::collections::BTreeMap;

// The label context attached to every emitted record.  Each level of the
// watch tree extends its parent's bag into a fresh value, so a leaf never
// needs to chase pointers back up the tree at emit time.  `decode_field`
// rides along because it is resolved from workload annotations at the same
// point the rest of the workload context is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Identity {
    pub cluster: String,
    pub namespace: String,
    pub workload: String,
    pub node: String,
    pub labels: BTreeMap<String, String>,
    pub container_name: String,
    pub container_id: String,

    // Set when JSON message promotion applies to this workload's logs
    pub decode_field: Option<String>,
}

impl Identity {
    pub fn for_cluster(cluster_name: &str) -> Identity {
        Identity { cluster: cluster_name.into(), ..Default::default() }
    }

    pub fn with_workload(
        &self,
        namespace: &str,
        workload: &str,
        node: &str,
        labels: BTreeMap<String, String>,
        decode_field: Option<String>,
    ) -> Identity {
        Identity {
            cluster: self.cluster.clone(),
            namespace: namespace.into(),
            workload: workload.into(),
            node: node.into(),
            labels,
            decode_field,
            ..Default::default()
        }
    }

    pub fn with_container(&self, name: &str, id: &str) -> Identity {
        let mut next = self.clone();
        next.container_name = name.into();
        next.container_id = id.into();
        next
    }
}
