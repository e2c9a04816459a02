pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "aws")]
pub use adapters::ecs::EcsClusterClient;

pub use adapters::memory::InMemoryCluster;
pub use config::CensusSettings;
pub use core::{census::CensusEngine, report::ReportFormat};
pub use domain::model::{CensusOutcome, CensusStats, ImageInventory, Ownership};
pub use utils::error::{CensusError, Result};
