//! Integration tests for session startup, reset, and shutdown.
//!
//! Covers:
//! - handshake order and buffer state afterwards
//! - handshake failures: silence, hang-up
//! - `reset_for_new_game` command sequence
//! - `stop` idempotence and calls after stop
//! - engine exit while a wait is outstanding

use std::sync::Arc;
use std::time::Duration;

use chesscli_engine::AppError;

use super::test_helpers::{
    commands, connect_stub, default_response, ready_stub, test_config, wait_for_command,
    StubAction,
};

#[tokio::test]
async fn handshake_sends_uci_then_isready() {
    let (session, received) = ready_stub().await;

    assert_eq!(commands(&received), vec!["uci", "isready"]);
    assert!(session.buffered_lines().await.expect("live").is_empty());
    assert!(!session.is_stopped());

    session.stop().await;
}

#[tokio::test]
async fn handshake_output_does_not_leak_into_first_search() {
    let (session, _received) = connect_stub(test_config(), |cmd| match cmd {
        "uci" => StubAction::Reply(
            "id name Noisy\noption name Hash type spin default 16\nuciok\ninfo string loaded\n"
                .into(),
        ),
        other => default_response(other),
    })
    .await;
    let session = session.expect("handshake succeeds");

    let lines = session.evaluate("startpos", 1).await.expect("search");
    assert_eq!(
        lines,
        vec!["info depth 1 score cp 20", "bestmove e2e4 ponder e7e5"]
    );

    session.stop().await;
}

#[tokio::test]
async fn silent_engine_fails_handshake() {
    let mut config = test_config();
    config.handshake_timeout = Duration::from_millis(100);

    let (session, received) = connect_stub(config, |cmd| match cmd {
        "isready" => StubAction::Silent,
        other => default_response(other),
    })
    .await;

    match session {
        Err(AppError::HandshakeFailed(msg)) => assert!(msg.contains("readyok"), "got: {msg}"),
        other => panic!("expected HandshakeFailed, got: {other:?}"),
    }
    assert_eq!(commands(&received)[..2], ["uci", "isready"]);
}

#[tokio::test]
async fn engine_exit_during_handshake_is_termination() {
    let (session, _received) = connect_stub(test_config(), |cmd| match cmd {
        "uci" => StubAction::Hangup,
        other => default_response(other),
    })
    .await;

    match session {
        Err(err @ AppError::EngineTerminated(_)) => assert!(err.is_terminal()),
        other => panic!("expected EngineTerminated, got: {other:?}"),
    }
}

#[tokio::test]
async fn reset_sends_ucinewgame_and_waits_for_readyok() {
    let (session, received) = ready_stub().await;

    session.reset_for_new_game().await.expect("reset");

    assert_eq!(
        commands(&received),
        vec!["uci", "isready", "ucinewgame", "isready"]
    );
    assert!(session.buffered_lines().await.expect("live").is_empty());

    session.stop().await;
}

#[tokio::test]
async fn stop_is_idempotent_and_ends_the_session() {
    let (session, received) = ready_stub().await;

    session.stop().await;
    session.stop().await;

    assert!(session.is_stopped());
    wait_for_command(&received, "quit").await;
    assert_eq!(
        commands(&received).iter().filter(|c| *c == "quit").count(),
        1,
        "quit sent once"
    );

    match session.evaluate("startpos", 1).await {
        Err(AppError::EngineTerminated(_)) => {}
        other => panic!("expected EngineTerminated, got: {other:?}"),
    }
    assert!(matches!(
        session.reset_for_new_game().await,
        Err(AppError::EngineTerminated(_))
    ));
}

#[tokio::test]
async fn stop_releases_outstanding_search() {
    let (session, _received) = connect_stub(test_config(), |cmd| {
        if cmd.starts_with("go") {
            StubAction::Silent
        } else {
            default_response(cmd)
        }
    })
    .await;
    let session = Arc::new(session.expect("handshake succeeds"));

    let searching = Arc::clone(&session);
    let search = tokio::spawn(async move { searching.evaluate("startpos", 30).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    tokio::time::timeout(Duration::from_secs(2), session.stop())
        .await
        .expect("stop completes promptly");

    match search.await.expect("search task") {
        Err(AppError::EngineTerminated(_)) => {}
        other => panic!("expected EngineTerminated, got: {other:?}"),
    }
}

#[tokio::test]
async fn engine_exit_fails_current_and_later_calls() {
    let (session, _received) = connect_stub(test_config(), |cmd| {
        if cmd.starts_with("go") {
            StubAction::Hangup
        } else {
            default_response(cmd)
        }
    })
    .await;
    let session = session.expect("handshake succeeds");

    match session.evaluate("startpos", 5).await {
        Err(AppError::EngineTerminated(_)) => {}
        other => panic!("expected EngineTerminated, got: {other:?}"),
    }
    match session.evaluate("startpos", 5).await {
        Err(AppError::EngineTerminated(_)) => {}
        other => panic!("expected EngineTerminated on later call, got: {other:?}"),
    }

    session.stop().await;
}
