// Integration tests for the timeline application endpoints

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web};
use serde_json::json;

use tlc_api::app::{create_app, AppState};
use tlc_api::dto::{PublishResponse, RegisterResponse, RemoveResponse, TokenResponse};
use tlc_api::middleware::PRINCIPAL_HEADER;
use tlc_core::repositories::{EntityWriter, MemoryEntityWriter};
use tlc_core::services::{CollectorManager, StaticContextResolver};
use tlc_shared::{ApplicationId, CollectorContext, TokenConfig};

const APP_ID: &str = "application_1000_1";

fn test_state() -> (web::Data<AppState>, Arc<MemoryEntityWriter>, Arc<CollectorManager>) {
    let resolver = Arc::new(StaticContextResolver::new(CollectorContext::new(
        "foo",
        "test_flow_name",
        "test_flow_version",
        1,
    )));
    let manager = Arc::new(CollectorManager::new(TokenConfig::default(), resolver));
    let writer = Arc::new(MemoryEntityWriter::new());
    let state = web::Data::new(AppState {
        manager: Arc::clone(&manager),
        writer: Arc::clone(&writer) as Arc<dyn EntityWriter>,
    });
    (state, writer, manager)
}

fn register_request(user: &str) -> actix_http::Request {
    test::TestRequest::put()
        .uri(&format!("/v2/timeline/apps/{}", APP_ID))
        .set_json(json!({ "user": user }))
        .to_request()
}

fn publish_request() -> test::TestRequest {
    test::TestRequest::post()
        .uri(&format!("/v2/timeline/apps/{}/entities", APP_ID))
        .set_json(json!({ "entities": [{ "id": "entity1", "type": "dummy_type" }] }))
}

#[actix_web::test]
async fn test_health_check() {
    let (state, _, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    manager.stop().await;
}

#[actix_web::test]
async fn test_register_returns_token_material() {
    let (state, _, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    let resp = test::call_service(&app, register_request("foo")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let registered: RegisterResponse = test::read_body_json(resp).await;
    assert_eq!(registered.app_id, APP_ID);
    assert_eq!(registered.token.owner, "foo");
    assert!(!registered.token.token.is_empty());

    manager.stop().await;
}

#[actix_web::test]
async fn test_register_is_idempotent() {
    let (state, _, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    let resp = test::call_service(&app, register_request("foo")).await;
    let first: RegisterResponse = test::read_body_json(resp).await;
    let resp = test::call_service(&app, register_request("foo")).await;
    let second: RegisterResponse = test::read_body_json(resp).await;

    assert_eq!(first.token.sequence_number, second.token.sequence_number);
    assert_eq!(manager.token_service().tokens_generated(), 1);

    manager.stop().await;
}

#[actix_web::test]
async fn test_register_rejects_malformed_app_id() {
    let (state, _, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::put()
        .uri("/v2/timeline/apps/not-an-app-id")
        .set_json(json!({ "user": "foo" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    manager.stop().await;
}

#[actix_web::test]
async fn test_token_endpoint_requires_registration() {
    let (state, _, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/v2/timeline/apps/{}/token", APP_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    manager.stop().await;
}

#[actix_web::test]
async fn test_token_endpoint_returns_current_token() {
    let (state, _, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    let resp = test::call_service(&app, register_request("foo")).await;
    let registered: RegisterResponse = test::read_body_json(resp).await;

    let req = test::TestRequest::get()
        .uri(&format!("/v2/timeline/apps/{}/token", APP_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token: TokenResponse = test::read_body_json(resp).await;
    assert_eq!(token.sequence_number, registered.token.sequence_number);

    manager.stop().await;
}

#[actix_web::test]
async fn test_publish_without_credentials_is_unauthorized() {
    let (state, _, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    test::call_service(&app, register_request("foo")).await;

    let result = test::try_call_service(&app, publish_request().to_request()).await;
    let err = result.expect_err("request without credentials must be rejected");
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );

    manager.stop().await;
}

#[actix_web::test]
async fn test_publish_with_garbage_token_is_unauthorized() {
    let (state, _, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    test::call_service(&app, register_request("foo")).await;

    let req = publish_request()
        .insert_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let result = test::try_call_service(&app, req).await;
    let err = result.expect_err("garbage token must be rejected");
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );

    manager.stop().await;
}

#[actix_web::test]
async fn test_publish_with_token_writes_entities() {
    let (state, writer, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    let resp = test::call_service(&app, register_request("foo")).await;
    let registered: RegisterResponse = test::read_body_json(resp).await;

    let req = test::TestRequest::post()
        .uri(&format!("/v2/timeline/apps/{}/entities", APP_ID))
        .insert_header((
            "Authorization",
            format!("Bearer {}", registered.token.token),
        ))
        .set_json(json!({ "entities": [
            { "id": "entity1", "type": "dummy_type" },
            { "id": "entity2", "type": "dummy_type" }
        ]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let published: PublishResponse = test::read_body_json(resp).await;
    assert_eq!(published.written, 2);

    let app_id: ApplicationId = APP_ID.parse().unwrap();
    assert_eq!(writer.written_for(&app_id).await.len(), 2);

    manager.stop().await;
}

#[actix_web::test]
async fn test_publish_as_foreign_principal_is_forbidden() {
    let (state, writer, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    test::call_service(&app, register_request("foo")).await;

    let req = publish_request()
        .insert_header((PRINCIPAL_HEADER, "mallory"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let app_id: ApplicationId = APP_ID.parse().unwrap();
    assert!(writer.written_for(&app_id).await.is_empty());

    manager.stop().await;
}

#[actix_web::test]
async fn test_publish_as_owning_principal_succeeds() {
    let (state, _, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    test::call_service(&app, register_request("foo")).await;

    let req = publish_request()
        .insert_header((PRINCIPAL_HEADER, "foo"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    manager.stop().await;
}

#[actix_web::test]
async fn test_remove_cancels_token_and_forgets_app() {
    let (state, _, manager) = test_state();
    let app = test::init_service(create_app(state)).await;

    let resp = test::call_service(&app, register_request("foo")).await;
    let registered: RegisterResponse = test::read_body_json(resp).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/v2/timeline/apps/{}", APP_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let removed: RemoveResponse = test::read_body_json(resp).await;
    assert!(removed.removed);

    // The cancelled token no longer authenticates a publish
    let req = publish_request()
        .insert_header((
            "Authorization",
            format!("Bearer {}", registered.token.token),
        ))
        .to_request();
    let result = test::try_call_service(&app, req).await;
    let err = result.expect_err("cancelled token must be rejected");
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );

    // Removing again reports that nothing was registered
    let req = test::TestRequest::delete()
        .uri(&format!("/v2/timeline/apps/{}", APP_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let removed: RemoveResponse = test::read_body_json(resp).await;
    assert!(!removed.removed);

    manager.stop().await;
}
