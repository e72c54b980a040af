//! Storage Proxy - HTTP front end for bucket object storage
//!
//! Serves objects from a bucket-style blob store (Google Cloud Storage, S3,
//! local filesystem) over plain HTTP, keyed by request path.
//!
//! # Request mapping
//!
//! The request path is turned into an object key: an optional runtime
//! prefix is stripped, the leading slash removed, `/` maps to `index.html`,
//! and the configured default prefix is prepended unless the path already
//! names the bucket. The method then picks the operation:
//!
//! - `GET` streams the object back (404 if it cannot be read)
//! - `HEAD` reports whether the object exists (200 / 404)
//! - `POST` / `PUT` stream the request body into the object (201)
//! - anything else is rejected with 405

pub mod config;
pub mod error;
pub mod key;
pub mod proxy;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use key::ProxyConfig;
pub use proxy::StorageProxy;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::key::{content_type, DerivedKey, ProxyConfig};
    pub use crate::proxy::StorageProxy;
    pub use crate::store::{BlobStore, BlobWriter, ObjectAttributes, ObjectStoreBlobStore};
}
