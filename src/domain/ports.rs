use crate::domain::model::{ServicePage, TaskDescription};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Most task identifiers a single bulk description may carry.
pub const DESCRIBE_TASKS_LIMIT: usize = 100;

/// Read-only query surface of the cluster API.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn list_services_page(
        &self,
        cluster: &str,
        next_token: Option<String>,
    ) -> Result<ServicePage>;

    /// Identifiers of the running tasks of one service.
    async fn list_tasks(&self, cluster: &str, service_name: &str) -> Result<Vec<String>>;

    /// Describes at most [`DESCRIBE_TASKS_LIMIT`] tasks.
    async fn describe_tasks(
        &self,
        cluster: &str,
        task_identifiers: &[String],
    ) -> Result<Vec<TaskDescription>>;

    /// Image URIs of every container the definition declares.
    async fn describe_task_definition(&self, definition_identifier: &str) -> Result<Vec<String>>;
}

pub trait SettingsProvider: Send + Sync {
    fn cluster(&self) -> &str;
    fn concurrency(&self) -> usize;
    fn batch_size(&self) -> usize;
    fn call_timeout(&self) -> Duration;
}

/// Hands out one progress tracker per stage.
pub trait ProgressReporter: Send + Sync {
    fn stage(&self, label: &str, total: usize) -> Box<dyn StageProgress>;
}

pub trait StageProgress: Send + Sync {
    fn advance(&self);
    fn finish(&self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _label: &str, _total: usize) -> Box<dyn StageProgress> {
        Box::new(SilentProgress)
    }
}

impl StageProgress for SilentProgress {
    fn advance(&self) {}

    fn finish(&self) {}
}
