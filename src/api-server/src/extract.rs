//! Request extractors for identity, client metadata, path ids and JSON bodies

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Path, Request},
    http::{header, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::debug;
use vaultkeeper_audit::RequestContext;
use vaultkeeper_vault::{FieldErrors, ItemId, UserId};

/// Forwarded-for header set by reverse proxies
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Authenticated user, placed in request extensions by `identity_middleware`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub UserId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Owner>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized("Missing user identity".to_string()))
    }
}

/// Client ip and user agent for the audit trail
#[derive(Debug, Clone, Default)]
pub struct ClientContext(pub RequestContext);

impl ClientContext {
    /// Read request metadata
    ///
    /// `x-forwarded-for` is only consulted when `trust_forwarded_for` is set,
    /// and only a first hop that parses as an IP address is kept. Otherwise
    /// the socket peer address is used.
    pub fn from_parts(parts: &Parts, trust_forwarded_for: bool) -> Self {
        let forwarded = if trust_forwarded_for {
            parts
                .headers
                .get(X_FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|hop| hop.trim().parse::<IpAddr>().ok())
        } else {
            None
        };

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        ClientContext(RequestContext::new(
            forwarded.or(peer).map(|ip| ip.to_string()),
            user_agent,
        ))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ClientContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts, state.trust_forwarded_for))
    }
}

/// Vault item id from the path; anything unparsable is reported as not found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultItemId(pub ItemId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for VaultItemId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<ItemId>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection.body_text(), "Unparsable vault item id");
                ApiError::NotFound
            })?;
        Ok(VaultItemId(id))
    }
}

/// JSON body whose fields are all strings
///
/// Decode failures become field-keyed validation errors instead of the
/// plain-text framework rejection.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection.body_text(), "Rejected request body");
                body_error()
            })?;

        match serde_json::from_value::<T>(value.clone()) {
            Ok(body) => Ok(JsonBody(body)),
            Err(e) => {
                debug!(error = %e, "Request body does not match the expected shape");
                Err(ApiError::Validation(type_errors(&value)))
            }
        }
    }
}

fn body_error() -> ApiError {
    let mut errors = FieldErrors::new();
    errors.add("body", "The request body must be a valid JSON object.");
    ApiError::Validation(errors)
}

fn type_errors(value: &Value) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Value::Object(fields) = value {
        for (field, v) in fields {
            if !(v.is_string() || v.is_null()) {
                errors.add(field.as_str(), format!("The {} field must be a string.", field));
            }
        }
    }

    if errors.is_empty() {
        errors.add("body", "The request body must be a valid JSON object.");
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use serde::Deserialize;

    fn context_of(request: HttpRequest<()>, trust_forwarded_for: bool) -> RequestContext {
        let (parts, _) = request.into_parts();
        ClientContext::from_parts(&parts, trust_forwarded_for).0
    }

    fn with_peer(mut request: HttpRequest<()>) -> HttpRequest<()> {
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 20], 51000))));
        request
    }

    #[test]
    fn test_first_forwarded_hop_wins_behind_trusted_proxy() {
        let request = HttpRequest::builder()
            .header(X_FORWARDED_FOR, "203.0.113.7, 10.0.0.1")
            .header(header::USER_AGENT, "curl/8.0")
            .body(())
            .unwrap();

        let ctx = context_of(request, true);
        assert_eq!(ctx.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn test_forwarded_header_ignored_without_trusted_proxy() {
        let request = with_peer(
            HttpRequest::builder()
                .header(X_FORWARDED_FOR, "203.0.113.7")
                .body(())
                .unwrap(),
        );

        let ctx = context_of(request, false);
        assert_eq!(ctx.ip_address.as_deref(), Some("192.168.1.20"));
    }

    #[test]
    fn test_oversized_forwarded_value_falls_back_to_peer() {
        let spoofed = "x".repeat(300);
        let request = with_peer(
            HttpRequest::builder()
                .header(X_FORWARDED_FOR, spoofed.as_str())
                .body(())
                .unwrap(),
        );

        let ctx = context_of(request, true);
        assert_eq!(ctx.ip_address.as_deref(), Some("192.168.1.20"));
    }

    #[test]
    fn test_ipv6_forwarded_hop_accepted() {
        let request = HttpRequest::builder()
            .header(X_FORWARDED_FOR, "2001:db8::1")
            .body(())
            .unwrap();

        let ctx = context_of(request, true);
        assert_eq!(ctx.ip_address.as_deref(), Some("2001:db8::1"));
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let ctx = context_of(with_peer(HttpRequest::builder().body(()).unwrap()), true);
        assert_eq!(ctx.ip_address.as_deref(), Some("192.168.1.20"));
        assert_eq!(ctx.user_agent, None);
    }

    #[tokio::test]
    async fn test_owner_missing_is_unauthorized() {
        let (mut parts, _) = HttpRequest::builder().body(()).unwrap().into_parts();
        let err = Owner::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[derive(Debug, Deserialize)]
    struct Named {
        #[serde(default)]
        name: Option<String>,
    }

    fn json_request(body: &str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_body_accepts_strings() {
        let JsonBody(named) = JsonBody::<Named>::from_request(json_request(r#"{"name":"Alice"}"#), &())
            .await
            .unwrap();
        assert_eq!(named.name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_json_body_wrong_type_is_field_error() {
        let err = JsonBody::<Named>::from_request(json_request(r#"{"name":5}"#), &())
            .await
            .unwrap_err();

        match err {
            ApiError::Validation(fields) => assert_eq!(
                fields.get("name"),
                Some(&["The name field must be a string.".to_string()][..])
            ),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_json_body_malformed_is_validation_error() {
        let err = JsonBody::<Named>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();

        match err {
            ApiError::Validation(fields) => assert!(fields.get("body").is_some()),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparsable_item_id_is_not_found() {
        let (mut parts, _) = HttpRequest::builder()
            .uri("/vault/abc")
            .body(())
            .unwrap()
            .into_parts();

        // Without a matched route there are no path params; still not found
        let err = VaultItemId::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
