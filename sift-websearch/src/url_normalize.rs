//! URL normalisation for cross-provider deduplication.
//!
//! Two providers frequently return the same page with cosmetic URL
//! differences: scheme casing, trailing slashes, tracking parameters.
//! Normalisation maps those variants to one canonical key.

use url::Url;

/// Query parameters that identify campaigns, not pages.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
];

/// Normalise a URL into a deduplication key.
///
/// - Lowercases the scheme and host
/// - Drops the fragment and any default port
/// - Strips known tracking query parameters
/// - Removes a trailing slash from the path
///
/// Unparseable URLs fall back to the trimmed, lowercased input so they
/// still deduplicate against byte-identical copies of themselves.
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw.trim()) else {
        return raw.trim().to_lowercase();
    };

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query: String = kept
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }

    let host = url.host_str().unwrap_or_default().to_lowercase();
    let path = url.path().trim_end_matches('/');
    let scheme = url.scheme().to_lowercase();

    match (url.port(), url.query()) {
        (Some(port), Some(q)) => format!("{scheme}://{host}:{port}{path}?{q}"),
        (Some(port), None) => format!("{scheme}://{host}:{port}{path}"),
        (None, Some(q)) => format!("{scheme}://{host}{path}?{q}"),
        (None, None) => format!("{scheme}://{host}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_case_and_trailing_slash_ignored() {
        assert_eq!(
            normalize_url("https://Example.COM/path/"),
            normalize_url("https://example.com/path")
        );
    }

    #[test]
    fn tracking_params_stripped() {
        assert_eq!(
            normalize_url("https://example.com/page?q=rust&utm_source=x&fbclid=abc"),
            normalize_url("https://example.com/page?q=rust")
        );
    }

    #[test]
    fn meaningful_params_kept() {
        assert_ne!(
            normalize_url("https://example.com/page?q=rust"),
            normalize_url("https://example.com/page?q=python")
        );
    }

    #[test]
    fn fragment_dropped() {
        assert_eq!(
            normalize_url("https://example.com/page#section"),
            normalize_url("https://example.com/page")
        );
    }

    #[test]
    fn default_port_dropped() {
        assert_eq!(
            normalize_url("https://example.com:443/page"),
            normalize_url("https://example.com/page")
        );
    }

    #[test]
    fn custom_port_kept() {
        assert_ne!(
            normalize_url("http://example.com:8080/page"),
            normalize_url("http://example.com/page")
        );
    }

    #[test]
    fn unparseable_url_lowercased_passthrough() {
        assert_eq!(normalize_url("  Not A Url  "), "not a url");
    }

    #[test]
    fn all_tracking_params_stripped_leaves_no_query() {
        assert_eq!(
            normalize_url("https://example.com/p?utm_campaign=a&gclid=b"),
            "https://example.com/p"
        );
    }
}
