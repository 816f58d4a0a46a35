//! Handlers for the timeline application lifecycle and publish endpoints.
//!
//! Registration and removal model the control channel the node manager
//! drives and are not token-gated. Publishing is gated by the token
//! authentication middleware and additionally checked against the
//! collector context here.

use actix_web::{http::StatusCode, web, HttpResponse};
use log::{info, warn};
use std::sync::Arc;

use crate::dto::error::{core_error_response, ErrorResponse};
use crate::dto::{
    PublishRequest, PublishResponse, RegisterRequest, RegisterResponse, RemoveResponse,
    TokenResponse,
};
use crate::middleware::AuthContext;

use tlc_core::repositories::EntityWriter;
use tlc_core::services::{AppLevelCollector, CollectorManager};
use tlc_shared::ApplicationId;

/// Shared services every handler needs
pub struct AppState {
    pub manager: Arc<CollectorManager>,
    pub writer: Arc<dyn EntityWriter>,
}

fn parse_app_id(raw: &str) -> Result<ApplicationId, HttpResponse> {
    raw.parse::<ApplicationId>().map_err(|e| {
        ErrorResponse::new("INVALID_APP_ID", e.to_string()).to_response(StatusCode::BAD_REQUEST)
    })
}

async fn lookup_collector(
    state: &AppState,
    app_id: &ApplicationId,
) -> Result<Arc<AppLevelCollector>, HttpResponse> {
    match state.manager.get(app_id).await {
        Some(collector) => Ok(collector),
        None => Err(ErrorResponse::new(
            "COLLECTOR_NOT_FOUND",
            format!("no collector registered for {}", app_id),
        )
        .to_response(StatusCode::NOT_FOUND)),
    }
}

/// Handler for PUT /v2/timeline/apps/{app_id}
///
/// Registers an application with the collector manager and returns the
/// delegation token material the publishing client should use. Repeating
/// the call for a known application returns its current token.
pub async fn register_app(
    path: web::Path<String>,
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse {
    let app_id = match parse_app_id(&path) {
        Ok(app_id) => app_id,
        Err(response) => return response,
    };

    let collector = match state
        .manager
        .add_application_if_absent(app_id, &request.user)
        .await
    {
        Ok(collector) => collector,
        Err(e) => {
            warn!("registration failed for {}: {}", app_id, e);
            return core_error_response(&e);
        }
    };

    match collector.get_delegation_token_for_app().await {
        Ok(token) => {
            info!("application {} registered, token issued", app_id);
            HttpResponse::Ok().json(RegisterResponse {
                app_id: app_id.to_string(),
                token: TokenResponse::from(&token),
            })
        }
        Err(e) => core_error_response(&e),
    }
}

/// Handler for GET /v2/timeline/apps/{app_id}/token
///
/// Out-of-band refresh channel: returns the collector's current token,
/// which may differ from the one originally handed out if the collector
/// regenerated after expiry.
pub async fn get_token(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    let app_id = match parse_app_id(&path) {
        Ok(app_id) => app_id,
        Err(response) => return response,
    };
    let collector = match lookup_collector(&state, &app_id).await {
        Ok(collector) => collector,
        Err(response) => return response,
    };

    match collector.get_delegation_token_for_app().await {
        Ok(token) => HttpResponse::Ok().json(TokenResponse::from(&token)),
        Err(e) => core_error_response(&e),
    }
}

/// Handler for POST /v2/timeline/apps/{app_id}/entities
///
/// Authenticated publish. The gate has already resolved the caller's
/// identity; here it must also match the user the collector was
/// registered for, otherwise the publish is refused outright.
pub async fn publish_entities(
    path: web::Path<String>,
    state: web::Data<AppState>,
    auth: AuthContext,
    request: web::Json<PublishRequest>,
) -> HttpResponse {
    let app_id = match parse_app_id(&path) {
        Ok(app_id) => app_id,
        Err(response) => return response,
    };
    let collector = match lookup_collector(&state, &app_id).await {
        Ok(collector) => collector,
        Err(response) => return response,
    };

    if auth.principal != collector.context().user {
        warn!(
            "publish to {} refused: principal {} does not own the collector",
            app_id, auth.principal
        );
        return ErrorResponse::new(
            "PUBLISH_FORBIDDEN",
            format!("principal {} may not publish to {}", auth.principal, app_id),
        )
        .to_response(StatusCode::FORBIDDEN);
    }

    match state
        .writer
        .write_entities(&app_id, collector.context(), &request.entities)
        .await
    {
        Ok(written) => HttpResponse::Ok().json(PublishResponse { written }),
        Err(e) => {
            warn!("publish to {} failed: {}", app_id, e);
            core_error_response(&e)
        }
    }
}

/// Handler for DELETE /v2/timeline/apps/{app_id}
///
/// Removes the application's collector and cancels its token. Removing
/// an unknown application reports `removed: false` rather than failing.
pub async fn remove_app(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    let app_id = match parse_app_id(&path) {
        Ok(app_id) => app_id,
        Err(response) => return response,
    };

    match state.manager.remove_application(&app_id).await {
        Ok(removed) => {
            info!("application {} removal requested, removed={}", app_id, removed);
            HttpResponse::Ok().json(RemoveResponse { removed })
        }
        Err(e) => core_error_response(&e),
    }
}
