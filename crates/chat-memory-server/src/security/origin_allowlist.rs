use axum::http::{header, request::Parts as RequestParts, HeaderName, HeaderValue, Method};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};

use crate::config::CorsConfig;

#[derive(Debug, Clone, PartialEq)]
enum OriginPattern {
    Any,
    Exact(String),
    /// `https://*.vercel.app` -> prefix `https://`, suffix `.vercel.app`
    Wildcard { prefix: String, suffix: String },
}

impl OriginPattern {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().trim_end_matches('/');
        if raw.is_empty() {
            return None;
        }
        if raw == "*" {
            return Some(Self::Any);
        }
        match raw.split_once('*') {
            Some((prefix, suffix)) if !suffix.contains('*') => Some(Self::Wildcard {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            }),
            Some(_) => {
                warn!("Ignoring origin pattern with more than one wildcard: {}", raw);
                None
            }
            None => Some(Self::Exact(raw.to_string())),
        }
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(exact) => exact == origin,
            Self::Wildcard { prefix, suffix } => {
                origin.len() > prefix.len() + suffix.len()
                    && origin.starts_with(prefix.as_str())
                    && origin.ends_with(suffix.as_str())
            }
        }
    }
}

/// Browser origins allowed to call the API
#[derive(Debug, Clone)]
pub struct OriginAllowlist {
    patterns: Arc<Vec<OriginPattern>>,
}

impl OriginAllowlist {
    pub fn new(origins: &[String]) -> Self {
        let patterns: Vec<OriginPattern> = origins
            .iter()
            .filter_map(|o| OriginPattern::parse(o))
            .collect();
        debug!("Loaded {} allowed origin patterns", patterns.len());
        Self {
            patterns: Arc::new(patterns),
        }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(origin))
    }

    pub fn cors_layer(&self, config: &CorsConfig) -> CorsLayer {
        let allowlist = self.clone();
        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &RequestParts| {
                origin
                    .to_str()
                    .map(|o| allowlist.is_allowed(o))
                    .unwrap_or(false)
            }))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-requested-with"),
            ])
            .allow_credentials(config.allow_credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowlist(origins: &[&str]) -> OriginAllowlist {
        let owned: Vec<String> = origins.iter().map(|s| s.to_string()).collect();
        OriginAllowlist::new(&owned)
    }

    #[test]
    fn test_exact_and_wildcard_origins() {
        let list = allowlist(&["http://localhost:8080", "https://*.vercel.app"]);

        assert!(list.is_allowed("http://localhost:8080"));
        assert!(list.is_allowed("https://chatbot-one.vercel.app"));
        assert!(!list.is_allowed("https://.vercel.app"));
        assert!(!list.is_allowed("http://chatbot.vercel.app"));
        assert!(!list.is_allowed("https://evil.example.com"));
        assert!(!list.is_allowed("http://localhost:3001"));
    }

    #[test]
    fn test_star_allows_everything_and_bad_patterns_are_skipped() {
        assert!(allowlist(&["*"]).is_allowed("https://anything.example"));

        let list = allowlist(&["https://*.*.app", "", "https://ok.app/"]);
        assert!(!list.is_allowed("https://a.b.app"));
        assert!(list.is_allowed("https://ok.app"));
    }
}
