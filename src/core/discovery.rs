use crate::core::pool::with_deadline;
use crate::domain::model::Service;
use crate::domain::ports::ClusterClient;
use crate::utils::error::{CensusError, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Services found in a cluster, keyed by short name.
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    names: Vec<String>,
    identifiers: HashMap<String, String>,
}

impl ServiceCatalog {
    /// Short names collide when two identifiers share a final segment. The
    /// later identifier wins and the name is only listed once.
    pub fn from_services(services: impl IntoIterator<Item = Service>) -> Self {
        let mut catalog = Self::default();
        for service in services {
            match catalog.identifiers.insert(service.name.clone(), service.identifier) {
                Some(previous) => {
                    tracing::warn!(
                        "Service name '{}' is shared by several services; '{}' is shadowed",
                        service.name,
                        previous
                    );
                }
                None => catalog.names.push(service.name),
            }
        }
        catalog
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn identifier(&self, name: &str) -> Option<&str> {
        self.identifiers.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Walks every page of the service listing. Any failed page aborts the
/// census: later stages need the complete set.
pub async fn discover_services<C: ClusterClient + ?Sized>(
    client: &C,
    cluster: &str,
    deadline: Duration,
) -> Result<ServiceCatalog> {
    let mut identifiers = Vec::new();
    let mut next_token = None;
    let mut pages = 0usize;

    loop {
        let page = with_deadline(
            "ListServices",
            deadline,
            client.list_services_page(cluster, next_token.take()),
        )
        .await
        .map_err(|e| CensusError::ServiceEnumerationError {
            cluster: cluster.to_string(),
            message: e.to_string(),
        })?;

        pages += 1;
        identifiers.extend(page.identifiers);

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    tracing::debug!(
        "Listed {} service identifiers over {} page(s)",
        identifiers.len(),
        pages
    );

    Ok(ServiceCatalog::from_services(
        identifiers.into_iter().map(Service::from_identifier),
    ))
}
