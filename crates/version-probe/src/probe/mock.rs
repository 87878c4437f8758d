//! In-memory cluster for exercising the reconciliation cycle.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use error_stack::Report;

use super::traits::ContainerResolver;
use super::traits::PodResolver;
use super::traits::RemoteExecutor;
use super::types::PodRef;
use crate::k8s::ClusterError;

/// What a fake pod does when a command is run in it.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FakeExec {
    Output(&'static str),
    Fail,
    Hang,
    Panic,
}

#[derive(Debug, Clone)]
struct FakePod {
    name: String,
    containers: Vec<String>,
    exec: FakeExec,
}

#[derive(Default)]
pub(crate) struct FakeCluster {
    pods: Mutex<Vec<FakePod>>,
    failing_lists: Mutex<HashSet<String>>,
    failing_reads: Mutex<HashSet<String>>,
    exec_calls: Mutex<Vec<(String, String, String)>>,
}

impl FakeCluster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_pod(self, name: &str, containers: &[&str], exec: FakeExec) -> Self {
        self.add_pod(name, containers, exec);
        self
    }

    /// Listing pods fails whenever `component` is looked up.
    pub(crate) fn failing_list(self, component: &str) -> Self {
        self.failing_lists
            .lock()
            .expect("poisoned")
            .insert(component.to_string());
        self
    }

    /// Reading the spec of `pod_name` fails.
    pub(crate) fn failing_read(self, pod_name: &str) -> Self {
        self.failing_reads
            .lock()
            .expect("poisoned")
            .insert(pod_name.to_string());
        self
    }

    pub(crate) fn add_pod(&self, name: &str, containers: &[&str], exec: FakeExec) {
        self.pods.lock().expect("poisoned").push(FakePod {
            name: name.to_string(),
            containers: containers.iter().map(|c| c.to_string()).collect(),
            exec,
        });
    }

    pub(crate) fn remove_pod(&self, name: &str) {
        self.pods.lock().expect("poisoned").retain(|pod| pod.name != name);
    }

    /// `(pod, container, command)` for every exec issued so far.
    pub(crate) fn exec_calls(&self) -> Vec<(String, String, String)> {
        self.exec_calls.lock().expect("poisoned").clone()
    }

    fn pod(&self, name: &str) -> Option<FakePod> {
        self.pods
            .lock()
            .expect("poisoned")
            .iter()
            .find(|pod| pod.name == name)
            .cloned()
    }
}

#[async_trait]
impl PodResolver for FakeCluster {
    async fn resolve_pod(
        &self,
        namespace: &str,
        component: &str,
    ) -> Result<Option<PodRef>, Report<ClusterError>> {
        if self.failing_lists.lock().expect("poisoned").contains(component) {
            return Err(Report::new(ClusterError::ListPodsFailed {
                namespace: namespace.to_string(),
            }));
        }

        let names: Vec<String> = self
            .pods
            .lock()
            .expect("poisoned")
            .iter()
            .map(|pod| pod.name.clone())
            .collect();

        Ok(
            crate::k8s::cluster::first_matching(names.iter().map(String::as_str), component)
                .map(|name| PodRef {
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                }),
        )
    }
}

#[async_trait]
impl ContainerResolver for FakeCluster {
    async fn resolve_container(
        &self,
        pod: &PodRef,
    ) -> Result<Option<String>, Report<ClusterError>> {
        if self.failing_reads.lock().expect("poisoned").contains(&pod.name) {
            return Err(Report::new(ClusterError::ReadPodFailed {
                pod_name: pod.name.clone(),
                namespace: pod.namespace.clone(),
            }));
        }

        Ok(self
            .pod(&pod.name)
            .and_then(|fake| fake.containers.first().cloned()))
    }
}

#[async_trait]
impl RemoteExecutor for FakeCluster {
    async fn exec(
        &self,
        pod: &PodRef,
        container: &str,
        command: &str,
    ) -> Result<String, Report<ClusterError>> {
        self.exec_calls.lock().expect("poisoned").push((
            pod.name.clone(),
            container.to_string(),
            command.to_string(),
        ));

        let exec = self.pod(&pod.name).map(|fake| fake.exec);
        match exec {
            Some(FakeExec::Output(output)) => Ok(output.to_string()),
            Some(FakeExec::Hang) => std::future::pending().await,
            Some(FakeExec::Panic) => panic!("exec blew up in {}", pod.name),
            Some(FakeExec::Fail) | None => Err(Report::new(ClusterError::ExecFailed {
                pod_name: pod.name.clone(),
                container: container.to_string(),
                message: "container not running".to_string(),
            })),
        }
    }
}
