use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use iterra_core::rate_limit::UNKNOWN_ADDRESS;

/// The caller's network address, used as the secondary rate-limit key.
///
/// Resolution order: the first entry of `X-Forwarded-For`, the socket peer
/// (when the server runs with connect info), then `"unknown"`. Never
/// rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = forwarded_for(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string());
        Ok(ClientIp(ip))
    }
}
