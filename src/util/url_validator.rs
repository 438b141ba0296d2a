use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during feed URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// The URL points to a private/internal IP address.
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    /// The URL points to localhost.
    #[error("Localhost not allowed")]
    Localhost,
}

/// Host policy applied to feed URLs before any request is made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostPolicy {
    /// Reject localhost, loopback and private ranges.
    #[default]
    PublicOnly,
    /// Accept any host. Used for local development and tests.
    AllowPrivate,
}

/// Validates a feed URL.
///
/// Always requires an `http` or `https` scheme and a host. Under
/// [`HostPolicy::PublicOnly`] it also rejects localhost, loopback and
/// private/link-local ranges so a configured feed cannot be pointed at
/// internal services.
///
/// ```
/// use marketfeed::util::{validate_url, HostPolicy};
///
/// assert!(validate_url("https://example.com/feed", HostPolicy::PublicOnly).is_ok());
/// assert!(validate_url("http://127.0.0.1/feed", HostPolicy::PublicOnly).is_err());
/// assert!(validate_url("http://127.0.0.1/feed", HostPolicy::AllowPrivate).is_ok());
/// assert!(validate_url("file:///etc/passwd", HostPolicy::AllowPrivate).is_err());
/// ```
pub fn validate_url(url_str: &str, policy: HostPolicy) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    let host = url.host_str().ok_or(UrlValidationError::MissingHost)?;

    if policy == HostPolicy::AllowPrivate {
        return Ok(url);
    }

    if host == "localhost" {
        return Err(UrlValidationError::Localhost);
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    if let Ok(ip) = host_for_parse.parse::<IpAddr>() {
        if ip.is_loopback() {
            return Err(UrlValidationError::Localhost);
        }
        if is_private_ip(&ip) {
            return Err(UrlValidationError::PrivateIp(ip.to_string()));
        }
    }

    Ok(url)
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return true;
            }
            let segments = ipv6.segments();
            // Unique Local (fc00::/7)
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // Link-Local (fe80::/10)
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}
