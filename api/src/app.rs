//! Application state and factory
//!
//! Builds the Actix-web application around a collector manager and an
//! entity writer, wiring the token authentication gate in front of the
//! publish endpoint.

use actix_web::{middleware::Logger, web, App, HttpResponse};
use std::sync::Arc;

use crate::middleware::{TokenAuth, TokenVerifier};
use crate::routes::timeline::{get_token, publish_entities, register_app, remove_app};

pub use crate::routes::timeline::AppState;

/// Create and configure the application with all dependencies
pub fn create_app(
    app_state: web::Data<AppState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<
            impl actix_web::body::MessageBody<Error: Into<actix_web::Error>>,
        >,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let verifier: Arc<dyn TokenVerifier> = Arc::clone(app_state.manager.token_service()) as _;

    App::new()
        .app_data(app_state)
        .wrap(Logger::default())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/v2/timeline").service(
                web::scope("/apps")
                    .route("/{app_id}", web::put().to(register_app))
                    .route("/{app_id}", web::delete().to(remove_app))
                    .route("/{app_id}/token", web::get().to(get_token))
                    .route(
                        "/{app_id}/entities",
                        web::post()
                            .to(publish_entities)
                            .wrap(TokenAuth::new(verifier)),
                    ),
            ),
        )
        .default_service(web::route().to(not_found))
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "timeline-collector",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "NOT_FOUND",
        "message": "The requested resource does not exist",
    }))
}
