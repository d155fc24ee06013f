//! Unit Tests for the Completion Bridge
//!
//! Covers the quiet-typing rule (empty spans only query on explicit
//! triggers), anchor placement, paren trimming and named-argument ranking.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use replbridge::CompletionBridge;
use test_utils::SpyEngine;

#[tokio::test]
async fn test_empty_span_stays_quiet_without_explicit_trigger() {
    let engine = SpyEngine::new(&["mean"]);
    let bridge = CompletionBridge::new(engine.clone());

    // Cursor right after an open paren: no token under it
    let reply = bridge.complete("plot(", 5, false).await;
    assert!(reply.is_empty());
    assert_eq!(engine.complete_calls(), 0, "engine must not be queried");
}

#[tokio::test]
async fn test_empty_span_queries_on_explicit_trigger() {
    let engine = SpyEngine::new(&["mean", "median"]);
    let bridge = CompletionBridge::new(engine.clone());

    let reply = bridge.complete("plot(", 5, true).await;
    assert_eq!(engine.complete_calls(), 1);
    assert_eq!(reply.items.len(), 2);
    assert_eq!(reply.anchor, 5);
}

#[tokio::test]
async fn test_anchor_is_the_token_start() {
    let engine = SpyEngine::new(&["median"]);
    let bridge = CompletionBridge::new(engine.clone());

    let line = "x <- med";
    let reply = bridge.complete(line, line.len(), false).await;
    assert_eq!(reply.anchor, 5);

    let request = engine.last_request().unwrap();
    assert_eq!(request.token_text, "med");
    assert_eq!(request.token_start, 5);
    assert_eq!(request.token_end, line.len());
}

#[tokio::test]
async fn test_trailing_parens_are_trimmed_from_the_line() {
    let engine = SpyEngine::new(&[]);
    let bridge = CompletionBridge::new(engine.clone());

    let line = "head(mtcars))";
    // Cursor inside the token so the span is non-empty
    bridge.complete(line, 11, false).await;

    let request = engine.last_request().unwrap();
    assert_eq!(request.line_text, "head(mtcars");
}

#[tokio::test]
async fn test_named_argument_labels_are_boosted() {
    let engine = SpyEngine::new(&["main=", "matrix", "max"]);
    let bridge = CompletionBridge::new(engine.clone());

    let reply = bridge.complete("ma", 2, false).await;
    let boosts: Vec<i32> = reply.items.iter().map(|i| i.rank_boost).collect();
    assert_eq!(boosts, vec![10, 0, 0]);
    assert_eq!(reply.items[0].label, "main=");
}

#[tokio::test]
async fn test_multibyte_cursor_is_snapped_to_a_boundary() {
    let engine = SpyEngine::new(&["head"]);
    let bridge = CompletionBridge::new(engine.clone());

    // Byte offset 2 lands inside the two-byte 'é'; the bridge must answer
    // instead of panicking
    let reply = bridge.complete("héllo", 2, false).await;
    assert_eq!(reply.anchor, 0);

    let request = engine.last_request().unwrap();
    assert_eq!(request.token_text, "h");
    assert_eq!(request.token_end, 1);
}

#[tokio::test]
async fn test_namespace_tokens_are_kept_whole() {
    let engine = SpyEngine::new(&[]);
    let bridge = CompletionBridge::new(engine.clone());

    let line = "utils::head";
    bridge.complete(line, line.len(), false).await;

    let request = engine.last_request().unwrap();
    assert_eq!(request.token_text, "utils::head");
    assert_eq!(request.token_start, 0);
}
