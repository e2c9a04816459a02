use crate::core::definition_resolution::{batch_count, resolve_task_definitions};
use crate::core::discovery::discover_services;
use crate::core::image_resolution::resolve_images;
use crate::core::pool::BoundedPool;
use crate::core::task_resolution::resolve_tasks;
use crate::domain::model::{CensusOutcome, CensusStats, ImageInventory};
use crate::domain::ports::{ClusterClient, ProgressReporter, SettingsProvider, SilentProgress};
use crate::utils::error::Result;

/// Runs the census stages in order. Each stage drains completely before the
/// next one starts; concurrency only exists inside a stage.
pub struct CensusEngine<C: ClusterClient, S: SettingsProvider> {
    client: C,
    settings: S,
    progress: Box<dyn ProgressReporter>,
}

impl<C: ClusterClient, S: SettingsProvider> CensusEngine<C, S> {
    pub fn new(client: C, settings: S) -> Self {
        Self {
            client,
            settings,
            progress: Box::new(SilentProgress),
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn run(&self) -> Result<CensusOutcome> {
        let cluster = self.settings.cluster();
        let deadline = self.settings.call_timeout();
        let batch_size = self.settings.batch_size();
        let mut stats = CensusStats::default();

        tracing::info!("Fetching services in cluster '{}'...", cluster);
        let catalog = discover_services(&self.client, cluster, deadline).await?;
        if catalog.is_empty() {
            return Ok(CensusOutcome::NoServices);
        }
        stats.services = catalog.len();

        tracing::info!("Fetching task ARNs for {} service(s)...", catalog.len());
        let bar = self.progress.stage("Listing tasks", catalog.len());
        let tasks = resolve_tasks(
            &self.client,
            cluster,
            catalog.names(),
            self.pool(),
            deadline,
            bar.as_ref(),
        )
        .await;
        bar.finish();
        stats.failed_services = tasks.failed_services;
        if tasks.is_empty() {
            return Ok(CensusOutcome::NoTasks);
        }

        tracing::info!("Describing {} task(s) to get task definitions...", tasks.len());
        let bar = self
            .progress
            .stage("Describing tasks", batch_count(tasks.len(), batch_size));
        let definitions = resolve_task_definitions(
            &self.client,
            cluster,
            &tasks,
            batch_size,
            self.pool(),
            deadline,
            bar.as_ref(),
        )
        .await;
        bar.finish();
        stats.tasks = definitions.tasks.len();
        stats.task_definitions = definitions.ownership.len();
        stats.failed_batches = definitions.failed_batches;

        tracing::info!(
            "Describing {} task definition(s) to get container images...",
            definitions.ownership.len()
        );
        let bar = self
            .progress
            .stage("Describing task defs", definitions.ownership.len());
        let resolution = resolve_images(
            &self.client,
            &definitions.ownership,
            self.pool(),
            deadline,
            bar.as_ref(),
        )
        .await;
        bar.finish();
        stats.images = resolution.images.len();
        stats.failed_definitions = resolution.failed_definitions;

        if stats.is_partial() {
            tracing::warn!(
                "Census is partial: {} service(s), {} batch(es) and {} task definition(s) failed",
                stats.failed_services,
                stats.failed_batches,
                stats.failed_definitions
            );
        }

        Ok(CensusOutcome::Inventory(ImageInventory {
            cluster: cluster.to_string(),
            images: resolution.images,
            stats,
        }))
    }

    /// A fresh pool per stage.
    fn pool(&self) -> BoundedPool {
        BoundedPool::new(self.settings.concurrency())
    }
}
