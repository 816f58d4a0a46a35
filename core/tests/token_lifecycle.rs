//! End-to-end delegation token lifecycle against a live collector manager.
//!
//! Mirrors the production timing profile scaled down: renewal every 100ms,
//! a 4 second max lifetime and a 2 second removal scan. The token must be
//! renewed transparently while the application lives, regenerated once the
//! lifetime passes, and cancelled when the application is removed.

use std::sync::Arc;
use std::time::Duration;

use tlc_core::services::collector::{CollectorManager, StaticContextResolver};
use tlc_shared::{ApplicationId, CollectorContext, TokenConfig};
use tokio::time::sleep;

#[tokio::test(flavor = "multi_thread")]
async fn test_token_lifecycle_end_to_end() {
    let config = TokenConfig::from_millis(60_000, 4_000, 100, 2_000);
    let manager = CollectorManager::new(
        config,
        Arc::new(StaticContextResolver::new(CollectorContext::new(
            "foo",
            "test_flow_name",
            "test_flow_version",
            1,
        ))),
    );
    let token_service = Arc::clone(manager.token_service());

    // Register the application; its collector obtains the first token.
    let app_id = ApplicationId::new(0, 1);
    let collector = manager.add_application_if_absent(app_id, "foo").await.unwrap();
    let original = collector.get_delegation_token_for_app().await.unwrap();
    token_service.verify_token(&original).await.unwrap();
    assert_eq!(token_service.tokens_generated(), 1);

    // After a second the token has been renewed repeatedly and still
    // verifies, under its original identity.
    sleep(Duration::from_millis(1_000)).await;
    token_service.verify_token(&original).await.unwrap();
    assert!(token_service.tokens_renewed() >= 5);
    assert_eq!(
        collector
            .get_delegation_token_for_app()
            .await
            .unwrap()
            .identifier,
        original.identifier
    );

    // Once the max lifetime passes the collector regenerates; wait for the
    // replacement to appear.
    let mut regenerated = None;
    for _ in 0..120 {
        sleep(Duration::from_millis(50)).await;
        let current = collector.get_delegation_token_for_app().await.unwrap();
        if current.identifier != original.identifier {
            regenerated = Some(current);
            break;
        }
    }
    let regenerated = regenerated.expect("token should have been regenerated");

    // Publishing with the stale token now fails verification; the
    // regenerated token is accepted.
    assert!(token_service
        .verify_token(&original)
        .await
        .unwrap_err()
        .is_invalid_token());
    token_service.verify_token(&regenerated).await.unwrap();

    // The removal scan reports the expired original exactly once.
    let mut expired = token_service.tokens_expired();
    for _ in 0..80 {
        if expired == 1 {
            break;
        }
        sleep(Duration::from_millis(100)).await;
        expired = token_service.tokens_expired();
    }
    assert_eq!(expired, 1);

    // Exactly two generations so far: the initial token and one
    // regeneration.
    assert_eq!(token_service.tokens_generated(), 2);

    // Removing the application cancels the current token.
    assert!(manager.remove_application(&app_id).await.unwrap());
    assert_eq!(token_service.tokens_cancelled(), 1);
    assert!(token_service
        .verify_token(&regenerated)
        .await
        .unwrap_err()
        .is_invalid_token());
    assert!(collector.get_delegation_token_for_app().await.is_err());

    manager.stop().await;
}
