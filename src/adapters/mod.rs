// Adapters layer: concrete ClusterClient and progress implementations.

#[cfg(feature = "aws")]
pub mod ecs;
pub mod memory;
#[cfg(feature = "cli")]
pub mod progress;
