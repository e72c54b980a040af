//! Blob Store
//!
//! The proxy only needs three primitives from a bucket: open a reader, open a
//! writer, and fetch attributes. Backends implement [`BlobStore`]; the
//! default one is built on the `object_store` crate.

mod object;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

pub use object::{ObjectStoreBlobStore, DEFAULT_PART_SIZE};

/// Byte stream over an object's contents. Dropping it releases the read.
pub type BlobReader = Box<dyn AsyncRead + Unpin + Send>;

/// Byte sink for a new object.
///
/// Nothing is visible in the bucket until `shutdown()` succeeds; a failed
/// shutdown means the object was not committed. Call [`BlobWriter::abort`]
/// instead of `shutdown()` to throw away a partial upload.
#[async_trait]
pub trait BlobWriter: AsyncWrite + Unpin + Send {
    /// Discard everything written so far without committing the object
    async fn abort(&mut self) -> Result<()>;
}

/// Object metadata returned by [`BlobStore::attributes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAttributes {
    /// Object size in bytes
    pub size: u64,
    /// Last modification time reported by the backend
    pub last_modified: DateTime<Utc>,
    /// Entity tag, if the backend provides one
    pub e_tag: Option<String>,
}

/// Handle to a remote bucket, shared by all concurrent requests
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Open a read stream for the named object
    async fn open_reader(&self, name: &str) -> Result<BlobReader>;

    /// Open a write stream that creates or replaces the named object
    async fn open_writer(&self, name: &str) -> Result<Box<dyn BlobWriter>>;

    /// Fetch the object's attributes; `None` when it does not exist
    async fn attributes(&self, name: &str) -> Result<Option<ObjectAttributes>>;
}
