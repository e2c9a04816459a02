use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE_TARGET: &str = "ecs_image_census";

/// `RUST_LOG` wins; otherwise the crate logs at info (debug when verbose)
/// and dependencies such as the AWS SDK only at warn.
fn census_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("{}={},warn", CRATE_TARGET, level)
}

/// Compact human-oriented lines on stderr; stdout carries only the report.
pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(census_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .init();
}

/// One JSON object per event for log shippers. Event fields are flattened
/// to the top level and the target is kept so SDK warnings can be told
/// apart from census ones.
pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(census_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_keep_dependencies_at_warn() {
        assert_eq!(default_directives(false), "ecs_image_census=info,warn");
        assert_eq!(default_directives(true), "ecs_image_census=debug,warn");
    }
}
