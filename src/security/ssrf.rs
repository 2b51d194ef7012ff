// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Guard for user-supplied endpoint URLs that the server may later fetch.
//!
//! The check is purely lexical: it parses the URL and matches the host
//! string against a blocklist. It does not resolve DNS, so a public name
//! that resolves to a private address (DNS rebinding) is not caught.

use url::{Host, Url};

use crate::error::AppError;

/// Hosts (exact, prefix, or dot-suffix match) the server must never target.
pub const BLOCKED_HOSTS: &[&str] = &[
    "localhost",
    "127.0.0.1",
    "0.0.0.0",
    "::1",
    "169.254.",
    "10.",
    "172.16.",
    "192.168.",
    "metadata.google.internal",
];

/// Validate that `url` is an HTTPS URL outside internal networks.
pub fn ensure_safe_endpoint(url: &str) -> Result<(), AppError> {
    let parsed =
        Url::parse(url).map_err(|_| AppError::validation("IoT endpoint URL is invalid"))?;

    if parsed.scheme() != "https" {
        return Err(AppError::validation("IoT endpoint must use HTTPS"));
    }

    let host = match parsed.host() {
        Some(Host::Domain(domain)) => domain.to_ascii_lowercase(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        None => return Err(AppError::validation("IoT endpoint URL is invalid")),
    };

    if is_blocked_host(&host) {
        tracing::warn!(host = %host, "Rejected endpoint targeting internal network");
        return Err(AppError::validation(
            "IoT endpoint cannot target internal networks",
        ));
    }

    Ok(())
}

/// Whether `host` equals, starts with, or is a subdomain of a blocked entry.
pub fn is_blocked_host(host: &str) -> bool {
    BLOCKED_HOSTS.iter().any(|blocked| {
        host == *blocked
            || host.starts_with(blocked)
            || host.ends_with(&format!(".{blocked}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(url: &str) -> String {
        ensure_safe_endpoint(url).unwrap_err().to_string()
    }

    #[test]
    fn accepts_public_https_endpoint() {
        assert!(ensure_safe_endpoint("https://api.example.com/emissions").is_ok());
    }

    #[test]
    fn rejects_plain_http() {
        assert_eq!(
            rejected("http://api.example.com/emissions"),
            "IoT endpoint must use HTTPS"
        );
    }

    #[test]
    fn rejects_unparseable_url() {
        assert_eq!(rejected("not a url"), "IoT endpoint URL is invalid");
    }

    #[test]
    fn rejects_internal_hosts() {
        for url in [
            "https://localhost/x",
            "https://LOCALHOST:8443/x",
            "https://127.0.0.1/x",
            "https://0.0.0.0/",
            "https://[::1]/x",
            "https://169.254.169.254/latest/meta-data",
            "https://10.1.2.3/",
            "https://172.16.0.1/",
            "https://192.168.1.10/",
            "https://metadata.google.internal/computeMetadata/v1/",
            "https://svc.localhost/",
        ] {
            assert_eq!(
                rejected(url),
                "IoT endpoint cannot target internal networks",
                "{url} should be blocked"
            );
        }
    }

    #[test]
    fn rejects_hosts_embedding_link_local_address() {
        // A numeric last label makes the host an IPv4 candidate; either the
        // parser or the blocklist must reject it.
        assert!(ensure_safe_endpoint("https://internal.169.254.0.5").is_err());
        assert!(is_blocked_host("internal.169.254."));
    }

    #[test]
    fn blocklist_matching_rules() {
        assert!(is_blocked_host("localhost"));
        assert!(is_blocked_host("10.0.0.1"));
        assert!(is_blocked_host("a.b.metadata.google.internal"));
        assert!(!is_blocked_host("example.com"));
        assert!(!is_blocked_host("110.0.0.1"));
    }
}
