use clap::Parser;
use ecs_image_census::adapters::progress::ConsoleProgress;
use ecs_image_census::core::report;
use ecs_image_census::core::{ClusterClient, ProgressReporter};
use ecs_image_census::domain::ports::SilentProgress;
use ecs_image_census::utils::{logger, validation::Validate};
use ecs_image_census::{
    CensusEngine, CensusError, CensusOutcome, CliConfig, EcsClusterClient, InMemoryCluster,
};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        fail(&e);
    }

    let outcome = match &config.snapshot {
        Some(path) => match InMemoryCluster::from_snapshot_file(path) {
            Ok(cluster) => run_census(cluster, &config).await,
            Err(e) => fail(&e),
        },
        None => {
            let client = EcsClusterClient::from_region(&config.region).await;
            run_census(client, &config).await
        }
    };

    let outcome = outcome.unwrap_or_else(|e| fail(&e));

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = report::write_outcome(&mut stdout, &config.cluster, &outcome, config.format) {
        fail(&e);
    }
}

async fn run_census<C: ClusterClient>(
    client: C,
    config: &CliConfig,
) -> ecs_image_census::Result<CensusOutcome> {
    let progress: Box<dyn ProgressReporter> = if config.no_progress {
        Box::new(SilentProgress)
    } else {
        Box::new(ConsoleProgress)
    };

    CensusEngine::new(client, config.settings())
        .with_progress(progress)
        .run()
        .await
}

fn fail(e: &CensusError) -> ! {
    tracing::error!(
        "❌ Census failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}
