use crate::core::pool::DEFAULT_CONCURRENCY;
use crate::core::SettingsProvider;
use crate::domain::ports::DESCRIBE_TASKS_LIMIT;
use crate::utils::error::Result;
use crate::utils::validation::{validate_cluster_name, validate_range, Validate};
use std::time::Duration;

#[cfg(feature = "cli")]
use crate::core::report::ReportFormat;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;
pub const MAX_CONCURRENCY: usize = 64;
pub const MAX_CALL_TIMEOUT_SECS: u64 = 600;

/// Census settings for library callers that do not go through the CLI.
#[derive(Debug, Clone)]
pub struct CensusSettings {
    pub cluster: String,
    pub concurrency: usize,
    pub batch_size: usize,
    pub call_timeout: Duration,
}

impl CensusSettings {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            concurrency: DEFAULT_CONCURRENCY,
            batch_size: DESCRIBE_TASKS_LIMIT,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }
}

impl SettingsProvider for CensusSettings {
    fn cluster(&self) -> &str {
        &self.cluster
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn call_timeout(&self) -> Duration {
        self.call_timeout
    }
}

impl Validate for CensusSettings {
    fn validate(&self) -> Result<()> {
        validate_cluster_name("cluster", &self.cluster)?;
        validate_range("concurrency", self.concurrency, 1, MAX_CONCURRENCY)?;
        validate_range("batch_size", self.batch_size, 1, DESCRIBE_TASKS_LIMIT)?;
        validate_range(
            "call_timeout_secs",
            self.call_timeout.as_secs(),
            1,
            MAX_CALL_TIMEOUT_SECS,
        )?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "ecs-image-census")]
#[command(about = "List the container images running in an ECS cluster and the services using them")]
pub struct CliConfig {
    #[arg(long, env = "ECS_CLUSTER", help = "ECS cluster name or ARN")]
    pub cluster: String,

    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, help = "Maximum in-flight API calls per stage")]
    pub concurrency: usize,

    #[arg(long, default_value_t = DESCRIBE_TASKS_LIMIT, help = "Tasks per DescribeTasks call")]
    pub batch_size: usize,

    #[arg(long, default_value_t = DEFAULT_CALL_TIMEOUT_SECS, help = "Deadline for each API call")]
    pub call_timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    #[arg(long, help = "Read the cluster from a JSON snapshot instead of the ECS API")]
    pub snapshot: Option<PathBuf>,

    #[arg(long, help = "Hide progress bars")]
    pub no_progress: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn settings(&self) -> CensusSettings {
        CensusSettings {
            cluster: self.cluster.clone(),
            concurrency: self.concurrency,
            batch_size: self.batch_size,
            call_timeout: Duration::from_secs(self.call_timeout_secs),
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.snapshot.is_none() {
            crate::utils::validation::validate_aws_region("region", &self.region)?;
        }
        self.settings().validate()?;

        tracing::debug!("✅ CLI configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = CensusSettings::new("prod");
        assert!(settings.validate().is_ok());
        assert_eq!(settings.concurrency(), 5);
        assert_eq!(settings.batch_size(), 100);
    }

    #[test]
    fn test_out_of_range_settings_are_rejected() {
        let mut settings = CensusSettings::new("prod");
        settings.batch_size = 101;
        assert!(settings.validate().is_err());

        let mut settings = CensusSettings::new("prod");
        settings.concurrency = 0;
        assert!(settings.validate().is_err());

        let settings = CensusSettings::new("");
        assert!(settings.validate().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_parses_defaults() {
        let config = CliConfig::try_parse_from(["ecs-image-census", "--cluster", "prod"]).unwrap();

        assert_eq!(config.cluster, "prod");
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.format, ReportFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_requires_cluster() {
        if std::env::var_os("ECS_CLUSTER").is_some() {
            return;
        }
        assert!(CliConfig::try_parse_from(["ecs-image-census"]).is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_json_format() {
        let config = CliConfig::try_parse_from([
            "ecs-image-census",
            "--cluster",
            "prod",
            "--format",
            "json",
            "--concurrency",
            "8",
        ])
        .unwrap();

        assert_eq!(config.format, ReportFormat::Json);
        assert_eq!(config.settings().concurrency, 8);
    }
}
