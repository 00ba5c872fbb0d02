use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;
use vaultkeeper_audit::AuditAction;

use crate::{
    error::{ApiError, Result},
    extract::{ClientContext, JsonBody, Owner, VaultItemId},
    models::*,
    state::AppState,
};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// List the caller's vault items, newest first
#[utoipa::path(
    get,
    path = "/api/v1/vault",
    responses(
        (status = 200, description = "Vault items with secrets decrypted", body = Vec<VaultItemResponse>),
        (status = 401, description = "Missing or invalid identity", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "vault"
)]
pub async fn list_vault_items(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    ClientContext(ctx): ClientContext,
) -> Result<Json<Vec<VaultItemResponse>>> {
    let items = state
        .vault
        .list(owner)
        .await
        .map_err(|e| ApiError::from_vault(e, "Failed to retrieve vault items"))?;

    state
        .audit(Some(owner), AuditAction::ViewedVault, "Viewed vault items", &ctx)
        .await;

    Ok(Json(items.into_iter().map(VaultItemResponse::from).collect()))
}

/// Create a vault item
#[utoipa::path(
    post,
    path = "/api/v1/vault",
    request_body = VaultItemRequest,
    responses(
        (status = 201, description = "Vault item created", body = VaultItemResponse),
        (status = 401, description = "Missing or invalid identity", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ValidationErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "vault"
)]
pub async fn create_vault_item(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    ClientContext(ctx): ClientContext,
    JsonBody(req): JsonBody<VaultItemRequest>,
) -> Result<(StatusCode, Json<VaultItemResponse>)> {
    let item = state
        .vault
        .create(owner, req.into())
        .await
        .map_err(|e| ApiError::from_vault(e, "Failed to create vault item"))?;

    state
        .audit(
            Some(owner),
            AuditAction::CreatedVaultItem,
            format!("Created vault item: {}", item.title),
            &ctx,
        )
        .await;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// Replace every field of a vault item
#[utoipa::path(
    put,
    path = "/api/v1/vault/{id}",
    params(
        ("id" = i64, Path, description = "Vault item id")
    ),
    request_body = VaultItemRequest,
    responses(
        (status = 200, description = "Vault item updated", body = VaultItemResponse),
        (status = 401, description = "Missing or invalid identity", body = ErrorResponse),
        (status = 404, description = "Vault item not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ValidationErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "vault"
)]
pub async fn update_vault_item(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    ClientContext(ctx): ClientContext,
    VaultItemId(id): VaultItemId,
    JsonBody(req): JsonBody<VaultItemRequest>,
) -> Result<Json<VaultItemResponse>> {
    let item = state
        .vault
        .update(owner, id, req.into())
        .await
        .map_err(|e| ApiError::from_vault(e, "Failed to update vault item"))?;

    state
        .audit(
            Some(owner),
            AuditAction::UpdatedVaultItem,
            format!("Updated vault item: {}", item.title),
            &ctx,
        )
        .await;

    Ok(Json(item.into()))
}

/// Hard delete a vault item
#[utoipa::path(
    delete,
    path = "/api/v1/vault/{id}",
    params(
        ("id" = i64, Path, description = "Vault item id")
    ),
    responses(
        (status = 200, description = "Vault item deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid identity", body = ErrorResponse),
        (status = 404, description = "Vault item not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "vault"
)]
pub async fn delete_vault_item(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    ClientContext(ctx): ClientContext,
    VaultItemId(id): VaultItemId,
) -> Result<Json<MessageResponse>> {
    let deleted = state
        .vault
        .delete(owner, id)
        .await
        .map_err(|e| ApiError::from_vault(e, "Failed to delete vault item"))?;

    state
        .audit(
            Some(owner),
            AuditAction::DeletedVaultItem,
            format!("Deleted vault item: {}", deleted.title),
            &ctx,
        )
        .await;

    Ok(Json(MessageResponse::new("Vault item deleted successfully")))
}

/// The caller's audit trail, most recent first
#[utoipa::path(
    get,
    path = "/api/v1/audit-logs",
    responses(
        (status = 200, description = "Audit log rows", body = Vec<AuditLogResponse>),
        (status = 401, description = "Missing or invalid identity", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "audit"
)]
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
) -> Result<Json<Vec<AuditLogResponse>>> {
    let logs = state
        .audit
        .list(owner)
        .await
        .map_err(|e| ApiError::from_audit(e, "Failed to retrieve audit logs"))?;

    Ok(Json(logs.into_iter().map(AuditLogResponse::from).collect()))
}

/// Record a sign-in reported by the identity provider
#[utoipa::path(
    post,
    path = "/api/v1/session/login",
    responses(
        (status = 204, description = "Event recorded"),
        (status = 401, description = "Missing or invalid identity", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn session_login(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    ClientContext(ctx): ClientContext,
) -> StatusCode {
    state
        .audit(Some(owner), AuditAction::UserLogin, "User logged in", &ctx)
        .await;
    StatusCode::NO_CONTENT
}

/// Record a sign-out reported by the identity provider
#[utoipa::path(
    post,
    path = "/api/v1/session/logout",
    responses(
        (status = 204, description = "Event recorded"),
        (status = 401, description = "Missing or invalid identity", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn session_logout(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    ClientContext(ctx): ClientContext,
) -> StatusCode {
    state
        .audit(Some(owner), AuditAction::UserLogout, "User logged out", &ctx)
        .await;
    StatusCode::NO_CONTENT
}

/// Record a new registration reported by the identity provider
#[utoipa::path(
    post,
    path = "/api/v1/session/registered",
    request_body = RegisteredRequest,
    responses(
        (status = 204, description = "Event recorded"),
        (status = 401, description = "Missing or invalid identity", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ValidationErrorResponse)
    ),
    tag = "session"
)]
pub async fn session_registered(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    ClientContext(ctx): ClientContext,
    JsonBody(req): JsonBody<RegisteredRequest>,
) -> Result<StatusCode> {
    let req = req.normalized();
    req.validate()?;

    state
        .audit(
            Some(owner),
            AuditAction::UserRegistered,
            format!("New user registered: {}", req.name),
            &ctx,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
