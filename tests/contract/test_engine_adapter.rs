//! Contract Tests for the Engine Adapter
//!
//! Every adapter shape must satisfy the same observable contract: FIFO
//! consumption of queued input, events delivered in production order, a
//! terminal `Closed` event, and `EngineClosed` on every read past it. The
//! same assertions run against both the embedded and the isolated adapter.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use std::sync::Arc;

use replbridge::engine::EngineAdapter;
use replbridge::{Config, EngineKind, Error, OutputEvent};
use test_utils::{ScriptStep, ScriptedRuntime};

fn build(kind: EngineKind, runtime: ScriptedRuntime) -> Arc<dyn EngineAdapter> {
    let mut config = Config::default();
    config.engine.kind = kind;
    replbridge::engine::build_engine(&config.engine, runtime)
}

fn echo_runtime() -> ScriptedRuntime {
    ScriptedRuntime::new().with_script("q()", vec![ScriptStep::Close])
}

/// Collect stdout payloads until `count` of them have been seen
async fn collect_stdout(engine: &Arc<dyn EngineAdapter>, count: usize) -> Vec<String> {
    let mut seen = Vec::new();
    while seen.len() < count {
        match engine.next_event().await.unwrap() {
            OutputEvent::Stdout(text) => seen.push(text),
            OutputEvent::Closed => panic!("stream closed before {} lines", count),
            _ => {}
        }
    }
    seen
}

async fn assert_fifo_consumption(kind: EngineKind) {
    let engine = build(kind, echo_runtime());
    engine.init().await.unwrap();

    // Queue three lines before consuming anything; the echo runtime prints
    // each line back, so stdout order proves consumption order
    engine.write_console("first").unwrap();
    engine.write_console("second").unwrap();
    engine.write_console("third").unwrap();

    let seen = collect_stdout(&engine, 3).await;
    assert_eq!(seen, vec!["first", "second", "third"]);
    engine.shutdown();
}

async fn assert_closed_is_terminal(kind: EngineKind) {
    let engine = build(kind, echo_runtime());
    engine.init().await.unwrap();
    engine.write_console("q()").unwrap();

    loop {
        match engine.next_event().await.unwrap() {
            OutputEvent::Closed => break,
            _ => {}
        }
    }
    for _ in 0..3 {
        assert!(matches!(
            engine.next_event().await,
            Err(Error::EngineClosed)
        ));
    }
}

async fn assert_install_stops_at_first_failure(kind: EngineKind) {
    let runtime = ScriptedRuntime::new().with_failing_package("broken");
    let install_log = runtime.install_log();
    let engine = build(kind, runtime);
    engine.init().await.unwrap();

    let packages = vec![
        "fine".to_string(),
        "broken".to_string(),
        "unreached".to_string(),
    ];
    let err = engine.install_packages(&packages).await.unwrap_err();
    assert!(matches!(err, Error::PackageInstall { .. }));

    let attempted = install_log.lock().unwrap().clone();
    assert_eq!(attempted, vec!["fine", "broken"]);
    engine.shutdown();
}

async fn assert_interrupt_is_safe(kind: EngineKind) {
    let engine = build(kind, echo_runtime());
    engine.init().await.unwrap();
    // Fire-and-forget with nothing in flight must not disturb the stream
    engine.interrupt();
    engine.write_console("still alive").unwrap();
    let seen = collect_stdout(&engine, 1).await;
    assert_eq!(seen, vec!["still alive"]);
    engine.shutdown();
}

#[tokio::test]
async fn test_embedded_fifo_consumption() {
    test_utils::init_tracing();
    assert_fifo_consumption(EngineKind::Embedded).await;
}

#[tokio::test]
async fn test_isolated_fifo_consumption() {
    assert_fifo_consumption(EngineKind::Isolated).await;
}

#[tokio::test]
async fn test_embedded_closed_is_terminal() {
    assert_closed_is_terminal(EngineKind::Embedded).await;
}

#[tokio::test]
async fn test_isolated_closed_is_terminal() {
    assert_closed_is_terminal(EngineKind::Isolated).await;
}

#[tokio::test]
async fn test_embedded_install_stops_at_first_failure() {
    assert_install_stops_at_first_failure(EngineKind::Embedded).await;
}

#[tokio::test]
async fn test_isolated_install_stops_at_first_failure() {
    assert_install_stops_at_first_failure(EngineKind::Isolated).await;
}

#[tokio::test]
async fn test_embedded_interrupt_is_safe() {
    assert_interrupt_is_safe(EngineKind::Embedded).await;
}

#[tokio::test]
async fn test_isolated_interrupt_is_safe() {
    assert_interrupt_is_safe(EngineKind::Isolated).await;
}

#[tokio::test]
async fn test_adapter_reports_its_kind() {
    let embedded = build(EngineKind::Embedded, echo_runtime());
    assert_eq!(embedded.kind(), EngineKind::Embedded);

    let isolated = build(EngineKind::Isolated, echo_runtime());
    assert_eq!(isolated.kind(), EngineKind::Isolated);
    isolated.shutdown();
}
