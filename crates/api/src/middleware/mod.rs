//! Request extractors shared by handlers.
//!
//! - [`auth::AuthUser`] -- the caller's identity from a JWT Bearer token.
//! - [`client_ip::ClientIp`] -- the caller's network address.

pub mod auth;
pub mod client_ip;
