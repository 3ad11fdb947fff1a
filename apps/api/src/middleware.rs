use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use wereport_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Address used to key limits for unauthenticated callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddress(pub String);

/// Shared bucket for callers whose address cannot be determined.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let access_token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let principal = state
        .principal_repository
        .find_by_access_token(access_token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid or expired access token".to_owned()))?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

pub async fn resolve_client_address(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| *address);
    let address = client_address(request.headers(), peer, state.trust_proxy_headers);

    request.extensions_mut().insert(ClientAddress(address));
    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the TCP peer, then
/// [`ANONYMOUS_CLIENT`]. Proxy headers are ignored unless trusted.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let forwarded = || {
        headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let from_headers = if trust_proxy {
        forwarded().or_else(real_ip)
    } else {
        None
    };

    from_headers
        .map(ToOwned::to_owned)
        .or_else(|| peer.map(|address| address.ip().to_string()))
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_owned())
}
