//! Target URL validation, safety heuristics, and normalization.
//!
//! Every check is a pure function of its input, except the private-address
//! check which performs a point-in-time name resolution. A resolution
//! failure means "cannot confirm private" and never fails validation.

use regex::Regex;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::LazyLock;
use url::{Host, Url};

/// Schemes a target URL may use.
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Schemes rejected outright, checked before the allow-list so the reason
/// stays explicit even if the allow-list grows.
const BLOCKED_SCHEMES: &[&str] = &["javascript", "data", "vbscript", "file", "ftp"];

/// Static host block-list.
const BLOCKED_HOSTS: &[&str] = &["malicious-site.com", "phishing-example.com"];

/// Top-level domains that correlate with throwaway/abuse registrations.
const RISKY_TLDS: &[&str] = &["tk", "ml", "ga", "cf"];

/// Syntactic shape of a valid DNS name (per-label length and charset).
static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("domain regex must compile")
});

/// Path fragments that indicate traversal or script injection attempts.
static SUSPICIOUS_PATH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\.\./", r"<script", r"javascript:", r"data:"]
        .iter()
        .map(|p| Regex::new(p).expect("path pattern must compile"))
        .collect()
});

/// Gatekeeper for target URLs before they are ever persisted.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    max_length: usize,
}

impl UrlValidator {
    /// Creates a validator with the given target URL length ceiling.
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    /// The configured target URL length ceiling.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Validates a target URL.
    ///
    /// Rejects empty or over-length input, non-http(s) or deny-listed
    /// schemes, syntactically malformed hosts, hosts on the static
    /// block-list, and hosts that are (or resolve to) private, loopback,
    /// or link-local addresses.
    pub fn is_valid(&self, url: &str) -> bool {
        if url.is_empty() || url.len() > self.max_length {
            return false;
        }

        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        let scheme = parsed.scheme();
        if BLOCKED_SCHEMES.contains(&scheme) || !ALLOWED_SCHEMES.contains(&scheme) {
            return false;
        }

        match parsed.host() {
            None => false,
            Some(Host::Ipv4(ip)) => !is_private_ip(IpAddr::V4(ip)),
            Some(Host::Ipv6(ip)) => !is_private_ip(IpAddr::V6(ip)),
            Some(Host::Domain(domain)) => {
                if !DOMAIN_REGEX.is_match(domain) {
                    return false;
                }
                if BLOCKED_HOSTS.contains(&domain) {
                    return false;
                }
                !resolves_to_private_ip(domain)
            }
        }
    }

    /// Stricter check than [`Self::is_valid`]: also applies heuristics for
    /// suspicious hosts (risky TLDs, excessive length or hyphenation) and
    /// suspicious paths (traversal, script injection).
    pub fn is_safe(&self, url: &str) -> bool {
        if !self.is_valid(url) {
            return false;
        }

        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        if let Some(host) = parsed.host_str()
            && is_suspicious_host(host)
        {
            return false;
        }

        // Heuristics run on the raw text: the parsed form percent-encodes
        // angle brackets and collapses `..` segments, masking the very
        // patterns being looked for. The scheme gate in `is_valid` already
        // passed, so any `javascript:`/`data:` match here sits in the path
        // or query.
        !has_suspicious_path(url)
    }

    /// Normalizes a URL to a canonical form.
    ///
    /// Trims whitespace, defaults a missing scheme to `https`, lower-cases
    /// the host, and strips the scheme's default port. A bare host keeps no
    /// trailing slash. Idempotent: `normalize(normalize(x)) == normalize(x)`.
    ///
    /// Unparseable input is returned trimmed (with the scheme default
    /// applied); [`Self::is_valid`] is the gate that rejects it.
    pub fn normalize(&self, url: &str) -> String {
        let trimmed = url.trim();

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let Ok(parsed) = Url::parse(&candidate) else {
            return candidate;
        };

        // `Url` already lower-cases the scheme and host and drops default
        // ports during parsing.
        let mut normalized = parsed.to_string();

        if parsed.path() == "/"
            && parsed.query().is_none()
            && parsed.fragment().is_none()
            && normalized.ends_with('/')
        {
            normalized.truncate(normalized.len() - 1);
        }

        normalized
    }
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new(2048)
    }
}

/// Private, loopback, and link-local ranges that a short link must never
/// point into.
fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unique_local() || v6.is_unicast_link_local(),
    }
}

/// Point-in-time resolution of `domain`. Returns true only when resolution
/// succeeds and yields a private address; a resolution failure cannot
/// confirm anything and therefore returns false.
fn resolves_to_private_ip(domain: &str) -> bool {
    match (domain, 80u16).to_socket_addrs() {
        Ok(addrs) => addrs.into_iter().any(|addr| is_private_ip(addr.ip())),
        Err(_) => false,
    }
}

fn is_suspicious_host(host: &str) -> bool {
    if let Some(tld) = host.rsplit('.').next()
        && host.contains('.')
        && RISKY_TLDS.contains(&tld)
    {
        return true;
    }

    if host.len() > 100 {
        return true;
    }

    host.matches('-').count() > 5
}

fn has_suspicious_path(path: &str) -> bool {
    let path_lower = path.to_ascii_lowercase();

    SUSPICIOUS_PATH_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(&path_lower))
}
