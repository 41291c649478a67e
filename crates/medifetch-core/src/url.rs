//! URL normalizer and platform detector (C3).
//!
//! Pure string/URL-parsing logic. No I/O.

use crate::domain::{MediaKind, Provider};
use crate::errors::AppError;

/// Host suffix used by Platform-A's track/album pages, e.g.
/// `hosta.tld/track/<id>` or `hosta.tld/album/<id>`.
const PROVIDER_A_HOST_SUFFIX: &str = "hosta.tld";
/// Host suffix used by Platform-M's watch/playlist pages, always behind
/// an `m.` subdomain, e.g. `m.hostm.tld/watch?v=<id>`.
const PROVIDER_M_HOST_SUFFIX: &str = "hostm.tld";

/// Canonicalize a URL for duplicate detection.
///
/// Trims surrounding whitespace, lowercases the scheme and host, and
/// preserves path + query + fragment exactly. Falls back to the trimmed,
/// lowercased input if the URL fails to parse — `normalize` never fails.
#[must_use]
pub fn normalize(u: &str) -> String {
    let trimmed = u.trim();
    match url::Url::parse(trimmed) {
        Ok(parsed) => {
            let scheme = parsed.scheme().to_ascii_lowercase();
            let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
            let port = parsed.port().map_or_else(String::new, |p| format!(":{p}"));
            let path = parsed.path();
            let query = parsed.query().map_or_else(String::new, |q| format!("?{q}"));
            let fragment = parsed
                .fragment()
                .map_or_else(String::new, |f| format!("#{f}"));
            format!("{scheme}://{host}{port}{path}{query}{fragment}")
        }
        Err(_) => trimmed.to_ascii_lowercase(),
    }
}

/// Classification result of [`detect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Detection {
    pub provider: Provider,
    pub kind: MediaKind,
}

/// Classify a URL's provider and media kind from its host and path.
///
/// - `hostA.tld/(track|album)/...` -> `{A, track|album}`.
/// - `m.hostM.tld/(watch|playlist)...` -> `{M, track|album}` (watch maps
///   to track, playlist maps to album).
/// - Anything else -> `None`.
#[must_use]
pub fn detect(u: &str) -> Option<Detection> {
    let parsed = url::Url::parse(u.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let mut segments = parsed.path_segments()?;
    let first = segments.next().unwrap_or_default();

    if host.ends_with(PROVIDER_A_HOST_SUFFIX) {
        let kind = match first {
            "track" => MediaKind::Track,
            "album" => MediaKind::Album,
            _ => return None,
        };
        return Some(Detection {
            provider: Provider::A,
            kind,
        });
    }

    if host.starts_with("m.") && host.ends_with(PROVIDER_M_HOST_SUFFIX) {
        let kind = match first {
            "watch" => MediaKind::Track,
            "playlist" => MediaKind::Album,
            _ => return None,
        };
        return Some(Detection {
            provider: Provider::M,
            kind,
        });
    }

    None
}

/// Classify a URL's provider, failing with `invalid_url` if unrecognized.
pub fn validate_or_fail(u: &str) -> Result<Provider, AppError> {
    detect(u)
        .map(|d| d.provider)
        .ok_or_else(|| AppError::invalid_url(format!("unrecognized provider for url: {u}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_scheme_and_host_only() {
        let got = normalize("HTTPS://Host.TLD/Track/X?Foo=Bar#Frag");
        assert_eq!(got, "https://host.tld/Track/X?Foo=Bar#Frag");
    }

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(
            normalize("  https://host.tld/track/x  "),
            normalize("https://host.tld/track/x")
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let u = "HTTPS://Host.TLD/a/b?c=d#e";
        assert_eq!(normalize(&normalize(u)), normalize(u));
    }

    #[test]
    fn normalize_falls_back_on_parse_failure() {
        assert_eq!(normalize("  Not A URL  "), "not a url");
    }

    #[test]
    fn detect_provider_a_track() {
        let d = detect("https://hosta.tld/track/abc123").unwrap();
        assert_eq!(d.provider, Provider::A);
        assert_eq!(d.kind, MediaKind::Track);
    }

    #[test]
    fn detect_provider_a_album() {
        let d = detect("https://hosta.tld/album/abc123").unwrap();
        assert_eq!(d.provider, Provider::A);
        assert_eq!(d.kind, MediaKind::Album);
    }

    #[test]
    fn detect_provider_m_watch_maps_to_track() {
        let d = detect("https://m.hostm.tld/watch?v=abc").unwrap();
        assert_eq!(d.provider, Provider::M);
        assert_eq!(d.kind, MediaKind::Track);
    }

    #[test]
    fn detect_provider_m_playlist_maps_to_album() {
        let d = detect("https://m.hostm.tld/playlist?list=abc").unwrap();
        assert_eq!(d.provider, Provider::M);
        assert_eq!(d.kind, MediaKind::Album);
    }

    #[test]
    fn detect_rejects_unrecognized_host() {
        assert!(detect("https://example.com/track/x").is_none());
    }

    #[test]
    fn detect_rejects_m_host_without_subdomain() {
        assert!(detect("https://hostm.tld/watch?v=abc").is_none());
    }

    #[test]
    fn validate_or_fail_surfaces_invalid_url_kind() {
        let err = validate_or_fail("https://example.com/nope").unwrap_err();
        assert_eq!(err.kind(), "invalid_url");
    }
}
