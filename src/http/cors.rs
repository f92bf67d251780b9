//! Cross-origin resource sharing
//!
//! Origin-checked CORS: an exact allow-list plus a suffix rule for preview
//! deployments (e.g. `https://<hash>.blog-frontend.pages.dev`).

use std::collections::HashSet;

use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};

use crate::config::CorsConfig;

pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Immutable origin policy built once at startup
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: HashSet<String>,
    allowed_suffix: Option<String>,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        let suffix = config.allowed_origin_suffix.trim();
        Self {
            allowed_origins: config.allowed_origins.iter().cloned().collect(),
            allowed_suffix: (!suffix.is_empty()).then(|| suffix.to_string()),
        }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.contains(origin)
            || self
                .allowed_suffix
                .as_deref()
                .is_some_and(|suffix| origin.ends_with(suffix))
    }

    /// Value for `Access-Control-Allow-Origin`: the request origin when allowed, else empty
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> HeaderValue {
        origin
            .filter(|value| value.to_str().is_ok_and(|o| self.is_allowed(o)))
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(""))
    }

    /// Resolve the full set of CORS headers for a request
    pub fn headers_for(&self, origin: Option<&HeaderValue>) -> CorsHeaders {
        CorsHeaders {
            allow_origin: self.allow_origin(origin),
        }
    }
}

/// CORS headers resolved for one request, merged into every response
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    allow_origin: HeaderValue,
}

impl CorsHeaders {
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CorsPolicy {
        CorsPolicy::from_config(&CorsConfig {
            allowed_origins: vec![
                "https://blog-frontend-5dr.pages.dev".to_string(),
                "http://localhost:5173".to_string(),
            ],
            allowed_origin_suffix: ".pages.dev".to_string(),
        })
    }

    fn origin(s: &'static str) -> HeaderValue {
        HeaderValue::from_static(s)
    }

    #[test]
    fn test_exact_origin_is_echoed() {
        let p = policy();
        assert_eq!(
            p.allow_origin(Some(&origin("https://blog-frontend-5dr.pages.dev"))),
            "https://blog-frontend-5dr.pages.dev"
        );
        assert_eq!(
            p.allow_origin(Some(&origin("http://localhost:5173"))),
            "http://localhost:5173"
        );
    }

    #[test]
    fn test_suffix_origin_is_echoed() {
        let p = policy();
        assert_eq!(
            p.allow_origin(Some(&origin("https://random123.pages.dev"))),
            "https://random123.pages.dev"
        );
    }

    #[test]
    fn test_foreign_origin_is_empty() {
        let p = policy();
        assert_eq!(p.allow_origin(Some(&origin("https://evil.example.com"))), "");
        assert_eq!(
            p.allow_origin(Some(&origin("https://evil.pages.dev.example.com"))),
            ""
        );
        assert_eq!(p.allow_origin(Some(&origin("https://evilpages.dev"))), "");
        assert_eq!(p.allow_origin(None), "");
    }

    #[test]
    fn test_empty_suffix_disables_rule() {
        let p = CorsPolicy::from_config(&CorsConfig {
            allowed_origins: vec![],
            allowed_origin_suffix: String::new(),
        });
        assert!(!p.is_allowed("https://random123.pages.dev"));
        assert!(!p.is_allowed(""));
    }

    #[test]
    fn test_apply_sets_all_headers() {
        let mut headers = HeaderMap::new();
        policy()
            .headers_for(Some(&origin("https://random123.pages.dev")))
            .apply(&mut headers);
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://random123.pages.dev"
        );
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
    }
}
