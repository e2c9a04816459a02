use crate::core::pool::{with_deadline, BoundedPool};
use crate::core::task_resolution::TaskIndex;
use crate::domain::model::{Ownership, Task};
use crate::domain::ports::{ClusterClient, StageProgress, DESCRIBE_TASKS_LIMIT};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct DefinitionIndex {
    /// Task definition -> services running at least one task of it.
    pub ownership: Ownership,
    pub tasks: Vec<Task>,
    pub failed_batches: usize,
}

/// Clamps a requested batch size to what one bulk description accepts.
pub fn effective_batch_size(requested: usize) -> usize {
    requested.clamp(1, DESCRIBE_TASKS_LIMIT)
}

/// Number of bulk descriptions needed for `task_count` tasks.
pub fn batch_count(task_count: usize, batch_size: usize) -> usize {
    task_count.div_ceil(effective_batch_size(batch_size))
}

/// Describes tasks in batches and records which services own each task
/// definition. A failed batch drops all of its tasks.
pub async fn resolve_task_definitions<C: ClusterClient + ?Sized>(
    client: &C,
    cluster: &str,
    task_index: &TaskIndex,
    batch_size: usize,
    pool: BoundedPool,
    deadline: Duration,
    progress: &dyn StageProgress,
) -> DefinitionIndex {
    let mut resolved = DefinitionIndex::default();
    let batches = task_index
        .identifiers()
        .chunks(effective_batch_size(batch_size));

    pool.run(
        batches,
        progress,
        |batch| with_deadline("DescribeTasks", deadline, client.describe_tasks(cluster, batch)),
        |batch, outcome| {
            let descriptions = match outcome {
                Ok(descriptions) => descriptions,
                Err(e) => {
                    tracing::warn!("Skipping batch of {} task(s): {}", batch.len(), e);
                    resolved.failed_batches += 1;
                    return;
                }
            };

            for description in descriptions {
                let Some(definition) = description.definition_identifier else {
                    tracing::debug!("Task '{}' has no task definition", description.identifier);
                    continue;
                };
                let Some(owner) = task_index.owner_of(&description.identifier) else {
                    tracing::debug!("Task '{}' was not requested; ignoring", description.identifier);
                    continue;
                };

                resolved.ownership.add(&definition, owner);
                resolved.tasks.push(Task {
                    identifier: description.identifier,
                    definition_identifier: definition,
                    owning_service: owner.to_string(),
                });
            }
        },
    )
    .await;

    resolved
}
