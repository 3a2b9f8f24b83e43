//! Request metadata carried into the access log.

use std::net::SocketAddr;

/// Facts about the inbound request the service needs but cannot see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Address recorded in the access log.
    pub client_ip: String,
    /// Request path recorded in the access log.
    pub path: String,
    /// Raw `Accept-Language` header, used when a request names no language.
    pub accept_language: Option<String>,
}

impl RequestContext {
    pub fn new(client_ip: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            path: path.into(),
            accept_language: None,
        }
    }

    pub fn with_accept_language(mut self, header: impl Into<String>) -> Self {
        self.accept_language = Some(header.into());
        self
    }
}

/// Pick the client address from proxy headers or the peer address.
///
/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the host part of
/// `remote_addr`, then `remote_addr` as given.
pub fn client_ip(forwarded_for: Option<&str>, real_ip: Option<&str>, remote_addr: &str) -> String {
    if let Some(first) = forwarded_for
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.split(',').next())
    {
        return first.trim().to_string();
    }

    if let Some(real) = real_ip.map(str::trim).filter(|v| !v.is_empty()) {
        return real.to_string();
    }

    if let Ok(addr) = remote_addr.parse::<SocketAddr>() {
        return addr.ip().to_string();
    }

    match remote_addr.rsplit_once(':') {
        Some((host, _)) if !host.is_empty() && !host.contains(':') => host.to_string(),
        _ => remote_addr.to_string(),
    }
}
