//! Route definitions for the API server
//!
//! Routes are organized by functionality:
//! - Health and OpenAPI document (no identity required)
//! - Vault item CRUD
//! - Audit log listing
//! - Session event hooks

use crate::{handlers, middleware, state::AppState};
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vaultkeeper API",
        version = "1.0.0",
        description = "Encrypted credential vault with an append-only audit trail"
    ),
    paths(
        handlers::health_check,
        handlers::list_vault_items,
        handlers::create_vault_item,
        handlers::update_vault_item,
        handlers::delete_vault_item,
        handlers::list_audit_logs,
        handlers::session_login,
        handlers::session_logout,
        handlers::session_registered,
    ),
    components(
        schemas(
            crate::models::VaultItemRequest,
            crate::models::VaultItemResponse,
            crate::models::AuditLogResponse,
            crate::models::RegisteredRequest,
            crate::models::MessageResponse,
            crate::models::HealthResponse,
            crate::models::ErrorResponse,
            crate::models::ValidationErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health endpoint"),
        (name = "vault", description = "Vault item endpoints"),
        (name = "audit", description = "Audit trail endpoints"),
        (name = "session", description = "Sign-in, sign-out and registration events"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Vault endpoints
        .route(
            "/vault",
            get(handlers::list_vault_items).post(handlers::create_vault_item),
        )
        .route(
            "/vault/:id",
            put(handlers::update_vault_item).delete(handlers::delete_vault_item),
        )
        // Audit endpoints
        .route("/audit-logs", get(handlers::list_audit_logs))
        // Session hooks
        .route("/session/login", post(handlers::session_login))
        .route("/session/logout", post(handlers::session_logout))
        .route("/session/registered", post(handlers::session_registered))
        .route_layer(axum_middleware::from_fn(middleware::identity_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1", api_routes)
        .with_state(state)
        // Executed bottom to top
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use vaultkeeper_vault::VaultKey;

    fn create_test_state() -> Arc<AppState> {
        Arc::new(AppState::in_memory(&VaultKey::generate()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_openapi_json() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/api/v1/vault"].is_object());
        assert!(doc["paths"]["/api/v1/vault/{id}"].is_object());
    }

    #[tokio::test]
    async fn test_identity_required_for_api_routes() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/vault")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/nope")
                    .header(middleware::X_USER_ID, "1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
