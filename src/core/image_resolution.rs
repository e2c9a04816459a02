use crate::core::pool::{with_deadline, BoundedPool};
use crate::domain::model::Ownership;
use crate::domain::ports::{ClusterClient, StageProgress};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ImageResolution {
    /// Image URI -> services whose tasks run a definition declaring it.
    pub images: Ownership,
    pub failed_definitions: usize,
}

/// Describes every task definition through the pool and fans each
/// definition's owners out to all of its container images.
pub async fn resolve_images<C: ClusterClient + ?Sized>(
    client: &C,
    definitions: &Ownership,
    pool: BoundedPool,
    deadline: Duration,
    progress: &dyn StageProgress,
) -> ImageResolution {
    let mut resolution = ImageResolution::default();

    pool.run(
        definitions.iter(),
        progress,
        |(definition, _)| {
            with_deadline(
                "DescribeTaskDefinition",
                deadline,
                client.describe_task_definition(definition),
            )
        },
        |(definition, owners), outcome| match outcome {
            Ok(images) => {
                let uris = images.iter().map(|image| image.trim());
                for image in uris.filter(|image| !image.is_empty()) {
                    resolution.images.extend(image, owners);
                }
            }
            Err(e) => {
                tracing::warn!("Skipping task definition '{}': {}", definition, e);
                resolution.failed_definitions += 1;
            }
        },
    )
    .await;

    resolution
}
