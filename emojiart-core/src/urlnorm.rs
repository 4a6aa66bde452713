//! Background URL normalization policy.
//!
//! Some image hosts and share sheets hand out redirector URLs that wrap
//! the direct image URL in a query parameter. The rule table here unwraps
//! those as a pure string transform. The table is data, not code: callers
//! needing a different host's scheme construct their own policy.

use url::Url;

/// Rule table for turning a dropped/shared URL into a direct-image URL.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    /// Query parameter keys whose value is the wrapped direct-image URL.
    redirect_params: Vec<String>,
}

impl Default for UrlPolicy {
    /// The image-search redirector rule: `...?imgurl=<direct-url>&...`.
    fn default() -> Self {
        Self::new(["imgurl"])
    }
}

impl UrlPolicy {
    /// Create a policy from a set of redirector query-parameter keys.
    pub fn new<I, S>(redirect_params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            redirect_params: redirect_params.into_iter().map(Into::into).collect(),
        }
    }

    /// Normalize a URL-shaped string.
    ///
    /// If the string parses as a URL and carries a redirector query
    /// parameter, the (percent-decoded) wrapped URL is returned.
    /// Everything else passes through unchanged - this transform never
    /// rejects input.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let Ok(url) = Url::parse(raw) else {
            return raw.to_string();
        };
        for (key, value) in url.query_pairs() {
            if self.redirect_params.iter().any(|p| p == key.as_ref()) {
                if let Ok(inner) = Url::parse(&value) {
                    return inner.to_string();
                }
            }
        }
        raw.to_string()
    }
}
