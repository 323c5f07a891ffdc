//! URL classification and site extraction.
//!
//! Both helpers fail closed: anything that cannot be parsed is never tracked
//! and never matches another site.

use url::{Host, Url};

/// Schemes that belong to the browser itself or to the local machine.
const IGNORED_SCHEMES: &[&str] = &[
    "about",
    "blob",
    "brave",
    "chrome",
    "chrome-extension",
    "chrome-search",
    "chrome-untrusted",
    "data",
    "devtools",
    "edge",
    "file",
    "javascript",
    "moz-extension",
    "view-source",
];

/// Returns true if visits to `url` must never be tracked.
///
/// Covers unparseable input, browser-internal and local-file schemes, and
/// loopback hosts.
pub fn is_ignored(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        tracing::trace!(url, "unparseable url treated as ignored");
        return true;
    };

    if IGNORED_SCHEMES.contains(&parsed.scheme()) {
        return true;
    }

    match parsed.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Returns the lowercase hostname of `url`, or `None` if it has none.
pub fn site_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// Returns true if both sites were extracted and are equal.
///
/// Two failed extractions never match each other.
pub fn same_site(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}
