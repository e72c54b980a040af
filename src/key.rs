//! Request path to object key mapping
//!
//! Every request, whatever its method, goes through the same derivation:
//! strip the runtime path prefix, trim one leading slash, default to
//! `index.html`, then either drop a `<bucket>/` qualifier or prepend the
//! default prefix.

use mime::Mime;

/// Fallback page served for the root path
pub const INDEX_DOCUMENT: &str = "index.html";

/// Immutable key mapping shared by all request handlers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Prepended to keys that are not bucket-qualified
    pub default_prefix: String,
    /// Bucket name; a leading `<bucket_name>/` bypasses the default prefix
    pub bucket_name: String,
    /// Literal prefix removed from the raw request path
    pub strip_path_prefix: String,
}

/// Result of mapping a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKey {
    /// Path after prefix stripping and slash trimming; drives the content type
    pub stripped: String,
    /// Name of the object in the bucket
    pub object: String,
}

impl ProxyConfig {
    pub fn new(
        default_prefix: impl Into<String>,
        bucket_name: impl Into<String>,
        strip_path_prefix: impl Into<String>,
    ) -> Self {
        Self {
            default_prefix: default_prefix.into(),
            bucket_name: bucket_name.into(),
            strip_path_prefix: strip_path_prefix.into(),
        }
    }

    /// Map a raw (decoded) request path to its stripped key and object key
    pub fn derive_key(&self, raw_path: &str) -> DerivedKey {
        let stripped = self.strip_key(raw_path);
        let object = self.object_name(&stripped);
        DerivedKey { stripped, object }
    }

    /// Remove the runtime prefix and the leading slash
    pub fn strip_key(&self, raw_path: &str) -> String {
        let mut key = raw_path;

        if !self.strip_path_prefix.is_empty() {
            match key.strip_prefix(self.strip_path_prefix.as_str()) {
                Some(rest) => key = rest,
                None => tracing::warn!(
                    "Request path {:?} did not have expected strip prefix {:?}, serving relative to root",
                    raw_path,
                    self.strip_path_prefix
                ),
            }
        }

        if key.is_empty() {
            key = INDEX_DOCUMENT;
        }

        let key = key.strip_prefix('/').unwrap_or(key);

        if key.is_empty() {
            INDEX_DOCUMENT.to_string()
        } else {
            key.to_string()
        }
    }

    /// Object name in the bucket for a stripped key
    pub fn object_name(&self, stripped: &str) -> String {
        let qualifier = format!("{}/", self.bucket_name);
        match stripped.strip_prefix(qualifier.as_str()) {
            Some(rest) => rest.to_string(),
            None => format!("{}{}", self.default_prefix, stripped),
        }
    }
}

/// Content type for a stripped key, by file extension
pub fn content_type(stripped: &str) -> Mime {
    mime_guess::from_path(stripped).first_or_octet_stream()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProxyConfig {
        ProxyConfig::new("v1/", "b", "/app/")
    }

    #[test]
    fn test_strip_prefix_and_default_prefix() {
        let key = config().derive_key("/app/css/a.css");
        assert_eq!(key.stripped, "css/a.css");
        assert_eq!(key.object, "v1/css/a.css");
    }

    #[test]
    fn test_root_maps_to_index() {
        let proxy = ProxyConfig::new("", "b", "");
        assert_eq!(proxy.derive_key("/").stripped, "index.html");
        assert_eq!(proxy.derive_key("").stripped, "index.html");
    }

    #[test]
    fn test_strip_prefix_consumes_whole_path() {
        assert_eq!(config().derive_key("/app/").stripped, "index.html");

        let exact = ProxyConfig::new("v1/", "b", "/app");
        let key = exact.derive_key("/app");
        assert_eq!(key.stripped, "index.html");
        assert_eq!(key.object, "v1/index.html");

        // "/app" + "/" leaves a single slash which is trimmed away
        assert_eq!(exact.derive_key("/app/").stripped, "index.html");
    }

    #[test]
    fn test_soft_mismatch_serves_from_root() {
        let key = config().derive_key("/other/x.js");
        assert_eq!(key.stripped, "other/x.js");
        assert_eq!(key.object, "v1/other/x.js");
    }

    #[test]
    fn test_only_one_leading_slash_removed() {
        let proxy = ProxyConfig::new("", "b", "");
        assert_eq!(proxy.derive_key("//a.txt").stripped, "/a.txt");
    }

    #[test]
    fn test_bucket_qualified_key_bypasses_default_prefix() {
        let key = config().derive_key("/app/b/objects/x.json");
        assert_eq!(key.stripped, "b/objects/x.json");
        assert_eq!(key.object, "objects/x.json");

        let other_prefix = ProxyConfig::new("release-7/", "b", "");
        assert_eq!(other_prefix.object_name("b/objects/x.json"), "objects/x.json");
    }

    #[test]
    fn test_bucket_name_needs_trailing_slash() {
        // "bx/..." is not qualified by bucket "b"
        assert_eq!(config().object_name("bx/y"), "v1/bx/y");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let proxy = config();
        for path in ["/app/a/b.png", "/", "", "/b/c", "/app/b/c", "weird//path"] {
            assert_eq!(proxy.derive_key(path), proxy.derive_key(path));
        }
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("a.png"), mime::IMAGE_PNG);
        assert_eq!(content_type("css/site.css").essence_str(), "text/css");
        assert_eq!(content_type("index.html").essence_str(), "text/html");
        assert_eq!(content_type("LICENSE"), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(content_type("blob.unknownext"), mime::APPLICATION_OCTET_STREAM);
    }
}
