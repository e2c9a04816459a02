pub mod census;
pub mod definition_resolution;
pub mod discovery;
pub mod image_resolution;
pub mod pool;
pub mod report;
pub mod task_resolution;

pub use crate::domain::model::{CensusOutcome, ImageInventory, Ownership};
pub use crate::domain::ports::{ClusterClient, ProgressReporter, SettingsProvider, StageProgress};
pub use crate::utils::error::Result;
