use crate::EndpointResolver;
use http::Method;

/// Registered route patterns, resolved the way a path mux does it.
///
/// A pattern ending in `/` matches every path below it; any other pattern
/// matches only itself. The longest matching pattern wins. Unmatched paths
/// resolve to the empty endpoint label.
#[derive(Debug, Clone, Default)]
pub struct RoutePatterns {
    patterns: Vec<String>,
}

impl RoutePatterns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern.
    pub fn route(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// The pattern that `path` is routed to, if any.
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .filter(|p| if p.ends_with('/') { path.starts_with(p.as_str()) } else { path == p.as_str() })
            .max_by_key(|p| p.len())
            .map(String::as_str)
    }
}

impl EndpointResolver for RoutePatterns {
    fn endpoint(&self, _method: &Method, path: &str) -> String {
        self.resolve(path).unwrap_or_default().to_owned()
    }
}
