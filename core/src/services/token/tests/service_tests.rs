//! Unit tests for the token manager service facade.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tlc_shared::TokenConfig;

use crate::services::token::TokenManagerService;

#[tokio::test]
async fn test_lifecycle_counters() {
    let service = TokenManagerService::new(TokenConfig::from_millis(
        60_000, 60_000, 10_000, 60_000,
    ));

    let first = service.generate_token("foo", "foo").await.unwrap();
    let second = service.generate_token("bar", "bar").await.unwrap();
    assert_eq!(service.tokens_generated(), 2);

    service.renew_token(&first, "foo").await.unwrap();
    assert_eq!(service.tokens_renewed(), 1);

    service.cancel_token(&second, "bar").await.unwrap();
    assert_eq!(service.tokens_cancelled(), 1);
    assert_eq!(service.tokens_expired(), 0);
}

#[tokio::test]
async fn test_failed_cancel_does_not_count() {
    let service = TokenManagerService::new(TokenConfig::from_millis(
        60_000, 60_000, 10_000, 60_000,
    ));
    let foreign = TokenManagerService::new(TokenConfig::from_millis(
        60_000, 60_000, 10_000, 60_000,
    ));

    let token = foreign.generate_token("foo", "foo").await.unwrap();
    assert!(service.cancel_token(&token, "foo").await.is_err());
    assert_eq!(service.tokens_cancelled(), 0);
}

#[tokio::test]
async fn test_verify_password_roundtrip() {
    let service = TokenManagerService::new(TokenConfig::from_millis(
        60_000, 60_000, 10_000, 60_000,
    ));
    let token = service.generate_token("foo", "foo").await.unwrap();

    let identifier = service.verify_password(&token.password).await.unwrap();
    assert_eq!(identifier, token.identifier);
}

#[tokio::test]
async fn test_background_scan_expires_tokens() {
    // Max lifetime 200ms, scan every 100ms: the started service drops the
    // token on its own and reports it through counter and hook.
    let fired = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&fired);
    let service = TokenManagerService::with_expire_hook(
        TokenConfig::from_millis(60_000, 200, 60_000, 100),
        Arc::new(move |_| {
            observed.fetch_add(1, Ordering::SeqCst);
        }),
    );
    service.start();

    let token = service.generate_token("foo", "foo").await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(service.tokens_expired(), 1);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(service
        .verify_token(&token)
        .await
        .unwrap_err()
        .is_invalid_token());

    service.stop();
}

#[tokio::test]
async fn test_start_is_idempotent_and_stop_is_safe() {
    let service = TokenManagerService::new(TokenConfig::from_millis(
        60_000, 60_000, 10_000, 60_000,
    ));
    service.start();
    service.start();
    service.stop();
    service.stop();
}
