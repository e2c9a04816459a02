use crate::domain::model::{ServicePage, TaskDescription};
use crate::domain::ports::ClusterClient;
use crate::utils::error::{CensusError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ecs::config::Region;
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::Client as EcsClient;

/// [`ClusterClient`] backed by the ECS API.
#[derive(Debug, Clone)]
pub struct EcsClusterClient {
    client: EcsClient,
}

impl EcsClusterClient {
    pub fn new(client: EcsClient) -> Self {
        Self { client }
    }

    /// Credentials come from the default provider chain; only the region is
    /// pinned.
    pub async fn from_region(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self::new(EcsClient::new(&config))
    }
}

fn api_error<E: std::error::Error>(operation: &str, err: E) -> CensusError {
    CensusError::api(operation, DisplayErrorContext(err))
}

#[async_trait]
impl ClusterClient for EcsClusterClient {
    async fn list_services_page(
        &self,
        cluster: &str,
        next_token: Option<String>,
    ) -> Result<ServicePage> {
        let resp = self
            .client
            .list_services()
            .cluster(cluster)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| api_error("ListServices", e))?;

        Ok(ServicePage {
            identifiers: resp.service_arns().to_vec(),
            next_token: resp.next_token().map(str::to_string),
        })
    }

    async fn list_tasks(&self, cluster: &str, service_name: &str) -> Result<Vec<String>> {
        let mut identifiers = Vec::new();
        let mut next_token = None;

        loop {
            let resp = self
                .client
                .list_tasks()
                .cluster(cluster)
                .service_name(service_name)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error("ListTasks", e))?;

            identifiers.extend_from_slice(resp.task_arns());
            match resp.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(identifiers)
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_identifiers: &[String],
    ) -> Result<Vec<TaskDescription>> {
        let resp = self
            .client
            .describe_tasks()
            .cluster(cluster)
            .set_tasks(Some(task_identifiers.to_vec()))
            .send()
            .await
            .map_err(|e| api_error("DescribeTasks", e))?;

        for failure in resp.failures() {
            tracing::debug!(
                "DescribeTasks could not describe {}: {}",
                failure.arn().unwrap_or("<unknown>"),
                failure.reason().unwrap_or("no reason given")
            );
        }

        Ok(resp
            .tasks()
            .iter()
            .filter_map(|task| {
                task.task_arn().map(|arn| TaskDescription {
                    identifier: arn.to_string(),
                    definition_identifier: task.task_definition_arn().map(str::to_string),
                })
            })
            .collect())
    }

    async fn describe_task_definition(&self, definition_identifier: &str) -> Result<Vec<String>> {
        let resp = self
            .client
            .describe_task_definition()
            .task_definition(definition_identifier)
            .send()
            .await
            .map_err(|e| api_error("DescribeTaskDefinition", e))?;

        Ok(resp
            .task_definition()
            .map(|definition| {
                definition
                    .container_definitions()
                    .iter()
                    .filter_map(|container| container.image().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }
}
