use ecs_image_census::core::report::render_text;
use ecs_image_census::{
    CensusEngine, CensusOutcome, CensusSettings, ImageInventory, InMemoryCluster,
};
use std::collections::BTreeSet;
use tokio_test::assert_ok;

const ARN_PREFIX: &str = "arn:aws:ecs:us-east-1:123456789012:service/prod";

fn service_arn(name: &str) -> String {
    format!("{}/{}", ARN_PREFIX, name)
}

async fn inventory_of(cluster: InMemoryCluster) -> ImageInventory {
    let engine = CensusEngine::new(cluster, CensusSettings::new("prod"));
    match assert_ok!(engine.run().await) {
        CensusOutcome::Inventory(inventory) => inventory,
        other => panic!("expected an inventory, got {:?}", other),
    }
}

fn owners(inventory: &ImageInventory, image: &str) -> Vec<String> {
    inventory
        .images
        .owners(image)
        .map(|owners| owners.iter().cloned().collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_shared_definition_with_two_containers() {
    let cluster = InMemoryCluster::builder()
        .service(service_arn("svc-a"))
        .service(service_arn("svc-b"))
        .task("svc-a", "task-a", "def-1")
        .task("svc-b", "task-b", "def-1")
        .definition("def-1", ["repo/app:1", "repo/sidecar:1"])
        .build();

    let inventory = inventory_of(cluster).await;

    assert_eq!(inventory.images.len(), 2);
    assert_eq!(owners(&inventory, "repo/app:1"), ["svc-a", "svc-b"]);
    assert_eq!(owners(&inventory, "repo/sidecar:1"), ["svc-a", "svc-b"]);
    assert!(!inventory.stats.is_partial());

    let text = render_text(&inventory);
    assert!(text.contains("repo/app:1\n  Services:\n    - svc-a\n    - svc-b\n"));
}

#[tokio::test]
async fn test_every_service_with_images_is_an_owner() {
    let mut builder = InMemoryCluster::builder().page_size(7);
    for i in 0..40 {
        let name = format!("svc-{:02}", i);
        builder = builder.service(service_arn(&name));
        // Every fifth service runs nothing.
        if i % 5 != 0 {
            for t in 0..3 {
                builder = builder.task(&name, format!("{}-task-{}", name, t), format!("def-{}", i % 6));
            }
        }
    }
    for d in 0..6 {
        builder = builder.definition(format!("def-{}", d), [format!("repo/app-{}:1", d), "repo/envoy:1.27".to_string()]);
    }

    let inventory = inventory_of(builder.build()).await;

    let all_owners: BTreeSet<String> = inventory
        .images
        .iter()
        .flat_map(|(_, owners)| owners.iter().cloned())
        .collect();
    let expected: BTreeSet<String> = (0..40)
        .filter(|i| i % 5 != 0)
        .map(|i| format!("svc-{:02}", i))
        .collect();

    assert_eq!(all_owners, expected);
    assert_eq!(owners(&inventory, "repo/envoy:1.27").len(), expected.len());
    assert_eq!(inventory.stats.services, 40);
    assert_eq!(inventory.stats.tasks, 96);
    assert_eq!(inventory.stats.task_definitions, 6);
}

#[tokio::test]
async fn test_failing_service_listing_is_isolated() {
    let cluster = InMemoryCluster::builder()
        .service(service_arn("broken"))
        .service(service_arn("healthy"))
        .task("broken", "t-1", "def-broken")
        .task("healthy", "t-2", "def-healthy")
        .definition("def-broken", ["repo/broken:1"])
        .definition("def-healthy", ["repo/healthy:1"])
        .fail_list_tasks("broken")
        .build();

    let inventory = inventory_of(cluster).await;

    assert_eq!(owners(&inventory, "repo/healthy:1"), ["healthy"]);
    assert!(inventory.images.owners("repo/broken:1").is_none());
    assert_eq!(inventory.stats.failed_services, 1);
}

#[tokio::test]
async fn test_large_cluster_respects_batch_and_concurrency_limits() {
    let mut builder = InMemoryCluster::builder()
        .service(service_arn("web"))
        .latency(std::time::Duration::from_millis(1));
    for t in 0..1001 {
        builder = builder.task("web", format!("t-{}", t), "web:42");
    }
    let cluster = builder.definition("web:42", ["repo/web:42"]).build();

    let engine = CensusEngine::new(cluster, CensusSettings::new("prod"));
    let outcome = assert_ok!(engine.run().await);

    let calls = engine.client().calls();
    assert_eq!(calls.describe_tasks, 11);
    assert!(calls.max_in_flight <= 5);
    match outcome {
        CensusOutcome::Inventory(inventory) => {
            assert_eq!(inventory.stats.tasks, 1001);
            assert_eq!(owners(&inventory, "repo/web:42"), ["web"]);
        }
        other => panic!("expected an inventory, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_cluster_reports_no_services() {
    let engine = CensusEngine::new(InMemoryCluster::builder().build(), CensusSettings::new("prod"));
    let outcome = assert_ok!(engine.run().await);
    assert!(matches!(outcome, CensusOutcome::NoServices));
}

#[tokio::test]
async fn test_snapshot_drives_full_census() {
    let cluster = InMemoryCluster::from_json(
        r#"{
            "page_size": 1,
            "services": [
                "arn:aws:ecs:us-east-1:1:service/prod/api",
                "arn:aws:ecs:us-east-1:1:service/prod/worker"
            ],
            "tasks": {
                "api": [{ "identifier": "t-1", "definition": "api:7" }],
                "worker": [{ "identifier": "t-2", "definition": "worker:3" }]
            },
            "task_definitions": {
                "api:7": ["repo/api:7", "repo/otel:0.98"],
                "worker:3": ["repo/worker:3", "repo/otel:0.98"]
            }
        }"#,
    )
    .unwrap();

    let inventory = inventory_of(cluster).await;

    assert_eq!(owners(&inventory, "repo/otel:0.98"), ["api", "worker"]);
    assert_eq!(owners(&inventory, "repo/api:7"), ["api"]);
    assert_eq!(inventory.stats.images, 3);
}
