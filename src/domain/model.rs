use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A service as returned by enumeration. `name` is what every later stage
/// keys on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub identifier: String,
}

impl Service {
    pub fn from_identifier(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            name: short_name(&identifier).to_string(),
            identifier,
        }
    }
}

/// Last non-empty `/`-separated segment, e.g.
/// `arn:aws:ecs:us-east-1:1234:service/prod/web` -> `web`.
pub fn short_name(identifier: &str) -> &str {
    identifier
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(identifier)
}

/// A running task after its definition has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub identifier: String,
    pub definition_identifier: String,
    pub owning_service: String,
}

/// One page of the service listing.
#[derive(Debug, Clone, Default)]
pub struct ServicePage {
    pub identifiers: Vec<String>,
    pub next_token: Option<String>,
}

/// What a bulk task description yields per task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescription {
    pub identifier: String,
    pub definition_identifier: Option<String>,
}

/// Many-to-many ownership: key (task definition or image URI) -> service
/// names. Set semantics on both levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Ownership(BTreeMap<String, BTreeSet<String>>);

impl Ownership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when `owner` was already recorded for `key`.
    pub fn add(&mut self, key: &str, owner: &str) -> bool {
        self.entry(key).insert(owner.to_string())
    }

    /// Unions `owners` into `key`'s set, creating the entry even when
    /// `owners` is empty.
    pub fn extend<'a>(&mut self, key: &str, owners: impl IntoIterator<Item = &'a String>) {
        self.entry(key).extend(owners.into_iter().cloned());
    }

    pub fn owners(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn entry(&mut self, key: &str) -> &mut BTreeSet<String> {
        self.0.entry(key.to_string()).or_default()
    }
}

/// Counters for a finished census. The `failed_*` fields count work that was
/// skipped under the best-effort policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CensusStats {
    pub services: usize,
    pub tasks: usize,
    pub task_definitions: usize,
    pub images: usize,
    pub failed_services: usize,
    pub failed_batches: usize,
    pub failed_definitions: usize,
}

impl CensusStats {
    pub fn is_partial(&self) -> bool {
        self.failed_services + self.failed_batches + self.failed_definitions > 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageInventory {
    pub cluster: String,
    pub images: Ownership,
    pub stats: CensusStats,
}

impl ImageInventory {
    pub fn empty(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            images: Ownership::new(),
            stats: CensusStats::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CensusOutcome {
    NoServices,
    NoTasks,
    Inventory(ImageInventory),
}
