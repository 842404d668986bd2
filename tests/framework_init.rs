use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use titanoboa::core::telemetry::init_tracing;
use titanoboa::exchange::DeliveryState;
use titanoboa::{ExecutionContext, Framework, FrameworkConfig, FrameworkError, UnitName};

static AUDITS: AtomicUsize = AtomicUsize::new(0);

#[titanoboa::unit(category = "controllers", description = "Counts runs")]
async fn orchestrate_audit(ctx: &ExecutionContext, _args: &[Value]) -> anyhow::Result<()> {
    anyhow::ensure!(!ctx.run_id().is_empty(), "missing run id");
    AUDITS.fetch_add(1, Ordering::SeqCst);
    Ok(())
}

#[titanoboa::unit(category = "utils", description = "Always fails")]
async fn orchestrate_broken(_ctx: &ExecutionContext, _args: &[Value]) -> anyhow::Result<()> {
    anyhow::bail!("broken on purpose")
}

fn names(names: &[UnitName]) -> Vec<&str> {
    names.iter().map(UnitName::as_str).collect()
}

#[tokio::test]
async fn test_init_runs_full_startup() {
    init_tracing("titanoboa=debug");
    let config = FrameworkConfig::builder()
        .message_count(3)
        .reply_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let before = AUDITS.load(Ordering::SeqCst);
    let report = Framework::init("demo", config).await.unwrap();
    assert_eq!(report.project, "demo");
    assert!(!report.run_id.is_empty());

    // categories in configured order, names sorted within each
    assert_eq!(
        names(&report.discovery.registered),
        vec![
            "models.orchestrate_schema",
            "controllers.orchestrate_audit",
            "services.orchestrate_status",
            "utils.orchestrate_broken",
            "utils.orchestrate_echo",
        ]
    );
    assert!(report.discovery.load_failures.is_empty());

    // one failing unit does not stop the others
    let failed: Vec<&str> = report.run.failed.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(failed, vec!["utils.orchestrate_broken"]);
    assert_eq!(report.run.succeeded.len(), 4);
    assert!(AUDITS.load(Ordering::SeqCst) > before);

    assert_eq!(report.exchange.consumer.delivered(), vec![0, 1, 2]);
    assert_eq!(
        report.exchange.producer.outcomes,
        vec![
            (0, DeliveryState::Received),
            (1, DeliveryState::Received),
            (2, DeliveryState::Received),
        ]
    );
}

#[tokio::test]
async fn test_init_with_empty_units_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = FrameworkConfig::builder()
        .root(dir.path())
        .message_count(1)
        .build()
        .unwrap();

    let report = Framework::init("empty", config).await.unwrap();
    assert!(report.discovery.registered.is_empty());
    assert!(report.run.succeeded.is_empty() && report.run.failed.is_empty());
    assert_eq!(report.exchange.consumer.delivered(), vec![0]);
}

#[tokio::test]
async fn test_init_from_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("titanoboa.yaml");
    std::fs::write(
        &path,
        "discovery:\n  categories: [controllers]\nexchange:\n  message_count: 2\n",
    )
    .unwrap();

    let config = FrameworkConfig::from_yaml_file(&path).unwrap();
    let report = Framework::init("yaml", config).await.unwrap();
    assert_eq!(
        names(&report.discovery.registered),
        vec!["controllers.orchestrate_audit"]
    );
    assert_eq!(report.exchange.producer.received(), 2);
}

#[tokio::test]
async fn test_init_rejects_invalid_config() {
    let mut config = FrameworkConfig::default();
    config.exchange.capacity = Some(0);
    let err = Framework::init("bad", config).await.unwrap_err();
    assert!(matches!(err, FrameworkError::Configuration { .. }));
    assert_eq!(err.stage(), "startup");
}
