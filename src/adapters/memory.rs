use crate::domain::model::{short_name, ServicePage, TaskDescription};
use crate::domain::ports::{ClusterClient, DESCRIBE_TASKS_LIMIT};
use crate::utils::error::{CensusError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// ECS lists 10 services per page unless told otherwise.
const DEFAULT_PAGE_SIZE: usize = 10;

/// A cluster captured as JSON, replayed by [`InMemoryCluster`] for offline
/// runs.
///
/// ```json
/// {
///   "services": ["arn:aws:ecs:us-east-1:1:service/prod/web"],
///   "tasks": { "web": [{ "identifier": "t-1", "definition": "web:3" }] },
///   "task_definitions": { "web:3": ["repo/web:1.4", "repo/envoy:1.27"] }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterSnapshot {
    pub services: Vec<String>,
    #[serde(default)]
    pub tasks: BTreeMap<String, Vec<SnapshotTask>>,
    #[serde(default)]
    pub task_definitions: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotTask {
    pub identifier: String,
    pub definition: Option<String>,
}

/// How often each operation was called, plus the highest number of calls
/// that were in flight at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_services_pages: usize,
    pub list_tasks: usize,
    pub describe_tasks: usize,
    pub describe_task_definition: usize,
    pub max_in_flight: usize,
}

#[derive(Debug, Default)]
struct Counters {
    list_services_pages: AtomicUsize,
    list_tasks: AtomicUsize,
    describe_tasks: AtomicUsize,
    describe_task_definition: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlightGuard<'a>(&'a Counters);

impl<'a> InFlightGuard<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory [`ClusterClient`]. Backs `--snapshot` runs and lets failures
/// and latency be injected per call.
#[derive(Debug, Default)]
pub struct InMemoryCluster {
    page_size: usize,
    services: Vec<String>,
    tasks_by_service: HashMap<String, Vec<String>>,
    definition_by_task: HashMap<String, Option<String>>,
    images_by_definition: HashMap<String, Vec<String>>,
    failing_pages: HashSet<usize>,
    failing_services: HashSet<String>,
    failing_tasks: HashSet<String>,
    failing_definitions: HashSet<String>,
    latency: Option<Duration>,
    counters: Counters,
}

impl InMemoryCluster {
    pub fn builder() -> InMemoryClusterBuilder {
        InMemoryClusterBuilder::default()
    }

    pub fn from_snapshot(snapshot: ClusterSnapshot) -> Self {
        let mut builder = Self::builder();
        if let Some(page_size) = snapshot.page_size {
            builder = builder.page_size(page_size);
        }
        for service in snapshot.services {
            builder = builder.service(service);
        }
        for (service_name, tasks) in snapshot.tasks {
            for task in tasks {
                builder = builder.task_with(&service_name, task.identifier, task.definition);
            }
        }
        for (definition, images) in snapshot.task_definitions {
            builder = builder.definition(definition, images);
        }
        builder.build()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: ClusterSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Any read or parse failure is reported as a configuration error
    /// naming the file.
    pub fn from_snapshot_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::read_to_string(path)
            .map_err(CensusError::from)
            .and_then(|json| Self::from_json(&json))
            .map_err(|e| CensusError::ConfigError {
                message: format!("failed to load snapshot {}: {}", path.display(), e),
            })
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            list_services_pages: c.list_services_pages.load(Ordering::SeqCst),
            list_tasks: c.list_tasks.load(Ordering::SeqCst),
            describe_tasks: c.describe_tasks.load(Ordering::SeqCst),
            describe_task_definition: c.describe_task_definition.load(Ordering::SeqCst),
            max_in_flight: c.max_in_flight.load(Ordering::SeqCst),
        }
    }

    async fn simulate_latency(&self) {
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
    }
}

#[async_trait]
impl ClusterClient for InMemoryCluster {
    async fn list_services_page(
        &self,
        _cluster: &str,
        next_token: Option<String>,
    ) -> Result<ServicePage> {
        let page = self.counters.list_services_pages.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard::enter(&self.counters);
        self.simulate_latency().await;

        if self.failing_pages.contains(&page) {
            return Err(CensusError::api("ListServices", "injected page failure"));
        }

        let start = match next_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| CensusError::api("ListServices", "invalid next token"))?,
            None => 0,
        };
        let end = (start + self.page_size.max(1)).min(self.services.len());

        Ok(ServicePage {
            identifiers: self.services.get(start..end).unwrap_or_default().to_vec(),
            next_token: (end < self.services.len()).then(|| end.to_string()),
        })
    }

    async fn list_tasks(&self, _cluster: &str, service_name: &str) -> Result<Vec<String>> {
        self.counters.list_tasks.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard::enter(&self.counters);
        self.simulate_latency().await;

        if self.failing_services.contains(service_name) {
            return Err(CensusError::api("ListTasks", "injected failure"));
        }
        if !self.services.iter().any(|s| short_name(s) == service_name) {
            return Err(CensusError::api(
                "ListTasks",
                format!("ServiceNotFoundException: {}", service_name),
            ));
        }

        Ok(self
            .tasks_by_service
            .get(service_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn describe_tasks(
        &self,
        _cluster: &str,
        task_identifiers: &[String],
    ) -> Result<Vec<TaskDescription>> {
        self.counters.describe_tasks.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard::enter(&self.counters);
        self.simulate_latency().await;

        if task_identifiers.len() > DESCRIBE_TASKS_LIMIT {
            return Err(CensusError::api(
                "DescribeTasks",
                format!(
                    "InvalidParameterException: {} tasks exceeds the limit of {}",
                    task_identifiers.len(),
                    DESCRIBE_TASKS_LIMIT
                ),
            ));
        }
        if task_identifiers.iter().any(|t| self.failing_tasks.contains(t)) {
            return Err(CensusError::api("DescribeTasks", "injected batch failure"));
        }

        // Unknown identifiers are dropped, as the real API reports them
        // under `failures` instead of `tasks`.
        Ok(task_identifiers
            .iter()
            .filter_map(|identifier| {
                self.definition_by_task
                    .get(identifier)
                    .map(|definition| TaskDescription {
                        identifier: identifier.clone(),
                        definition_identifier: definition.clone(),
                    })
            })
            .collect())
    }

    async fn describe_task_definition(&self, definition_identifier: &str) -> Result<Vec<String>> {
        self.counters
            .describe_task_definition
            .fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard::enter(&self.counters);
        self.simulate_latency().await;

        if self.failing_definitions.contains(definition_identifier) {
            return Err(CensusError::api("DescribeTaskDefinition", "injected failure"));
        }

        self.images_by_definition
            .get(definition_identifier)
            .cloned()
            .ok_or_else(|| {
                CensusError::api(
                    "DescribeTaskDefinition",
                    format!("ClientException: unable to describe {}", definition_identifier),
                )
            })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryClusterBuilder {
    cluster: InMemoryCluster,
}

impl InMemoryClusterBuilder {
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.cluster.page_size = page_size.max(1);
        self
    }

    pub fn service(mut self, identifier: impl Into<String>) -> Self {
        self.cluster.services.push(identifier.into());
        self
    }

    /// Adds a running task to the service with short name `service_name`.
    pub fn task(
        self,
        service_name: &str,
        identifier: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        self.task_with(service_name, identifier, Some(definition.into()))
    }

    pub fn task_with(
        mut self,
        service_name: &str,
        identifier: impl Into<String>,
        definition: Option<String>,
    ) -> Self {
        let identifier = identifier.into();
        self.cluster
            .tasks_by_service
            .entry(service_name.to_string())
            .or_default()
            .push(identifier.clone());
        self.cluster.definition_by_task.insert(identifier, definition);
        self
    }

    pub fn definition<I, S>(mut self, identifier: impl Into<String>, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cluster.images_by_definition.insert(
            identifier.into(),
            images.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Fails the `page`-th (zero-based) call to the service listing.
    pub fn fail_service_page(mut self, page: usize) -> Self {
        self.cluster.failing_pages.insert(page);
        self
    }

    pub fn fail_list_tasks(mut self, service_name: &str) -> Self {
        self.cluster.failing_services.insert(service_name.to_string());
        self
    }

    /// Fails every bulk description whose batch contains `task_identifier`.
    pub fn fail_describe_tasks_with(mut self, task_identifier: &str) -> Self {
        self.cluster.failing_tasks.insert(task_identifier.to_string());
        self
    }

    pub fn fail_definition(mut self, definition: &str) -> Self {
        self.cluster.failing_definitions.insert(definition.to_string());
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.cluster.latency = Some(latency);
        self
    }

    pub fn build(mut self) -> InMemoryCluster {
        if self.cluster.page_size == 0 {
            self.cluster.page_size = DEFAULT_PAGE_SIZE;
        }
        self.cluster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_round_trips_through_client() {
        let cluster = InMemoryCluster::from_json(
            r#"{
                "services": ["arn:aws:ecs:us-east-1:1:service/prod/web"],
                "tasks": { "web": [{ "identifier": "t-1", "definition": "web:3" }] },
                "task_definitions": { "web:3": ["repo/web:1.4", "repo/envoy:1.27"] }
            }"#,
        )
        .unwrap();

        let page = cluster.list_services_page("prod", None).await.unwrap();
        assert_eq!(page.identifiers.len(), 1);
        assert!(page.next_token.is_none());

        let tasks = cluster.list_tasks("prod", "web").await.unwrap();
        assert_eq!(tasks, vec!["t-1".to_string()]);

        let described = cluster.describe_tasks("prod", &tasks).await.unwrap();
        assert_eq!(described[0].definition_identifier.as_deref(), Some("web:3"));

        let images = cluster.describe_task_definition("web:3").await.unwrap();
        assert_eq!(images, vec!["repo/web:1.4", "repo/envoy:1.27"]);
    }

    #[tokio::test]
    async fn test_describe_tasks_rejects_oversized_batches() {
        let cluster = InMemoryCluster::builder().build();
        let ids: Vec<String> = (0..=DESCRIBE_TASKS_LIMIT).map(|i| format!("t-{}", i)).collect();

        let err = cluster.describe_tasks("prod", &ids).await.unwrap_err();
        assert!(err.to_string().contains("InvalidParameterException"));
    }

    #[tokio::test]
    async fn test_unknown_service_is_an_error() {
        let cluster = InMemoryCluster::builder().service("svc-a").build();
        assert!(cluster.list_tasks("prod", "svc-a").await.unwrap().is_empty());
        assert!(cluster.list_tasks("prod", "svc-z").await.is_err());
    }

    #[test]
    fn test_unreadable_snapshot_file_is_a_config_error() {
        let err = InMemoryCluster::from_snapshot_file("/nonexistent/cluster-snapshot.json").unwrap_err();

        assert!(matches!(err, CensusError::ConfigError { .. }));
        assert!(err.to_string().contains("/nonexistent/cluster-snapshot.json"));
        assert!(err.is_fatal());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_malformed_snapshot_is_rejected() {
        let err = InMemoryCluster::from_json(r#"{ "tasks": {} }"#).unwrap_err();
        assert!(matches!(err, CensusError::SerializationError(_)));
    }
}
