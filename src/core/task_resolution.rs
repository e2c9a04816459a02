use crate::core::pool::{with_deadline, BoundedPool};
use crate::domain::ports::{ClusterClient, StageProgress};
use std::collections::HashMap;
use std::time::Duration;

/// Running task identifiers with the service each one belongs to.
#[derive(Debug, Clone, Default)]
pub struct TaskIndex {
    identifiers: Vec<String>,
    owners: HashMap<String, String>,
    pub failed_services: usize,
}

impl TaskIndex {
    fn record(&mut self, service_name: &str, identifiers: Vec<String>) {
        for identifier in identifiers {
            if self
                .owners
                .insert(identifier.clone(), service_name.to_string())
                .is_none()
            {
                self.identifiers.push(identifier);
            }
        }
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn owner_of(&self, task_identifier: &str) -> Option<&str> {
        self.owners.get(task_identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// Lists the running tasks of every service through the pool. A service
/// whose listing fails contributes no tasks.
pub async fn resolve_tasks<C: ClusterClient + ?Sized>(
    client: &C,
    cluster: &str,
    service_names: &[String],
    pool: BoundedPool,
    deadline: Duration,
    progress: &dyn StageProgress,
) -> TaskIndex {
    let mut index = TaskIndex::default();

    pool.run(
        service_names,
        progress,
        |service_name| {
            with_deadline(
                "ListTasks",
                deadline,
                client.list_tasks(cluster, service_name),
            )
        },
        |service_name, outcome| match outcome {
            Ok(identifiers) => {
                tracing::debug!("Service '{}' runs {} task(s)", service_name, identifiers.len());
                index.record(service_name, identifiers);
            }
            Err(e) => {
                tracing::warn!("Skipping service '{}': {}", service_name, e);
                index.failed_services += 1;
            }
        },
    )
    .await;

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCluster;
    use crate::domain::ports::SilentProgress;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_builds_reverse_index() {
        let cluster = InMemoryCluster::builder()
            .service("svc-a")
            .service("svc-b")
            .task("svc-a", "t-1", "def-1")
            .task("svc-a", "t-2", "def-1")
            .task("svc-b", "t-3", "def-2")
            .build();

        let index = resolve_tasks(
            &cluster,
            "prod",
            &names(&["svc-a", "svc-b"]),
            BoundedPool::default(),
            Duration::from_secs(5),
            &SilentProgress,
        )
        .await;

        assert_eq!(index.len(), 3);
        assert_eq!(index.owner_of("t-1"), Some("svc-a"));
        assert_eq!(index.owner_of("t-3"), Some("svc-b"));
        assert_eq!(index.failed_services, 0);
    }

    #[tokio::test]
    async fn test_failing_service_does_not_hide_others() {
        let cluster = InMemoryCluster::builder()
            .service("svc-a")
            .service("svc-b")
            .task("svc-a", "t-1", "def-1")
            .task("svc-b", "t-2", "def-2")
            .fail_list_tasks("svc-a")
            .build();

        let index = resolve_tasks(
            &cluster,
            "prod",
            &names(&["svc-a", "svc-b"]),
            BoundedPool::default(),
            Duration::from_secs(5),
            &SilentProgress,
        )
        .await;

        assert_eq!(index.identifiers(), ["t-2"]);
        assert_eq!(index.owner_of("t-1"), None);
        assert_eq!(index.failed_services, 1);
    }

    #[tokio::test]
    async fn test_slow_listing_is_skipped_after_deadline() {
        let cluster = InMemoryCluster::builder()
            .service("svc-a")
            .task("svc-a", "t-1", "def-1")
            .latency(Duration::from_millis(200))
            .build();

        let index = resolve_tasks(
            &cluster,
            "prod",
            &names(&["svc-a"]),
            BoundedPool::default(),
            Duration::from_millis(10),
            &SilentProgress,
        )
        .await;

        assert!(index.is_empty());
        assert_eq!(index.failed_services, 1);
    }
}
