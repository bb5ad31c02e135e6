//! Integration tests for the toolgate broker
//!
//! Exercises the public API end to end with stub executables, no real
//! security tools required.

use std::sync::Arc;
use std::time::{Duration, Instant};
use toolgate::tools::audit::AuditLogger;
use toolgate::tools::registry::RegistryFilter;
use toolgate::{Broker, BrokerConfig, ErrorKind, ToolDescriptor, ToolRegistry, ToolRequest};

fn stub_registry() -> ToolRegistry {
    let descriptors = vec![
        ToolDescriptor::new("echo", "echo").with_allowed_flags(["-n"]),
        ToolDescriptor::new("napper", "sh")
            .with_mandatory_prefix(["-c", "sleep 0.3"])
            .with_concurrency_limit(2),
        ToolDescriptor::new("slow", "sh").with_mandatory_prefix(["-c", "sleep 30"]),
    ];
    ToolRegistry::from_descriptors(descriptors, &RegistryFilter::default())
}

fn broker_with(config: &BrokerConfig) -> Broker {
    Broker::new(
        stub_registry(),
        config,
        AuditLogger::from_writer(Box::new(std::io::sink())),
    )
}

#[tokio::test]
async fn full_round_trip_produces_audited_result() {
    let broker = broker_with(&BrokerConfig::default());

    let result = broker
        .dispatch("echo", &ToolRequest::new("10.0.0.5"))
        .await;

    assert_eq!(result.return_code, 0);
    assert!(result.stdout.contains("10.0.0.5"));
    assert!(!result.audit_id.is_empty());
    assert!(!result.timed_out);
    assert!(result.error_kind.is_none());
}

#[tokio::test]
async fn every_failure_mode_yields_a_result() {
    let broker = broker_with(&BrokerConfig::default());

    // Unknown tool, unauthorized target, disallowed flag, injection:
    // all must come back as results with audit ids, never panics
    let cases = [
        ("ghost", ToolRequest::new("10.0.0.5")),
        ("echo", ToolRequest::new("8.8.8.8")),
        ("echo", ToolRequest::new("10.0.0.5").with_arguments("-x")),
        (
            "echo",
            ToolRequest::new("10.0.0.5").with_arguments("a; rm -rf /"),
        ),
    ];

    for (tool, request) in cases {
        let result = broker.dispatch(tool, &request).await;
        assert_eq!(result.return_code, 64, "tool={} should be rejected", tool);
        assert!(result.error_kind.is_some());
        assert!(!result.audit_id.is_empty());
    }
}

#[tokio::test]
async fn boundary_target_is_rejected() {
    let broker = broker_with(&BrokerConfig::default());

    let result = broker
        .dispatch("echo", &ToolRequest::new("172.32.0.1"))
        .await;
    assert_eq!(result.error_kind, Some(ErrorKind::UnauthorizedTarget));

    let result = broker
        .dispatch("echo", &ToolRequest::new("172.31.255.255"))
        .await;
    assert!(result.error_kind.is_none());
}

#[tokio::test]
async fn timeout_is_bounded_and_flagged() {
    let broker = broker_with(&BrokerConfig::default());
    let request = ToolRequest::new("10.0.0.5").with_timeout(Duration::from_secs(1));

    let start = Instant::now();
    let result = broker.dispatch("slow", &request).await;

    assert!(result.timed_out);
    assert_eq!(result.return_code, 124);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn five_requests_two_slots_all_complete() {
    let broker = Arc::new(broker_with(&BrokerConfig::default()));

    let start = Instant::now();
    let mut handles = vec![];
    for _ in 0..5 {
        let broker = broker.clone();
        handles.push(tokio::spawn(async move {
            broker
                .dispatch("napper", &ToolRequest::new("10.0.0.5"))
                .await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().return_code, 0);
    }

    // 5 sleeps of ~0.3s through 2 slots cannot finish in under ~0.9s
    assert!(start.elapsed() >= Duration::from_millis(800));
    assert_eq!(broker.in_flight(), 0);
}

#[tokio::test]
async fn audit_log_captures_the_whole_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let broker = Broker::new(
        stub_registry(),
        &BrokerConfig::default(),
        AuditLogger::to_file(&path).unwrap(),
    );

    broker.dispatch("echo", &ToolRequest::new("10.0.0.5")).await;
    broker.dispatch("echo", &ToolRequest::new("8.8.8.8")).await;
    broker
        .dispatch("echo", &ToolRequest::new("10.0.0.5").dry_run())
        .await;

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 3);

    let outcomes: Vec<String> = lines
        .iter()
        .map(|line| {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            v["outcome"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(outcomes, vec!["completed", "rejected", "dry_run"]);
}

#[tokio::test]
async fn shutdown_drains_then_rejects() {
    let broker = Arc::new(broker_with(&BrokerConfig::default()));

    let inner = broker.clone();
    let in_flight = tokio::spawn(async move {
        inner
            .dispatch("napper", &ToolRequest::new("10.0.0.5"))
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    broker.shutdown(Duration::from_secs(5)).await;

    // The in-flight request finished normally within the grace period
    assert_eq!(in_flight.await.unwrap().return_code, 0);

    // New work is refused
    let result = broker.dispatch("echo", &ToolRequest::new("10.0.0.5")).await;
    assert_eq!(result.return_code, 64);
}
