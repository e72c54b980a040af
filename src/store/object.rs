//! `object_store` backed blob store
//!
//! Works with any backend `object_store` can open from a URL: `gs://`,
//! `s3://`, `file://` and `memory://`. Credentials are picked up from the
//! usual `GOOGLE_*`, `AWS_*` and `AZURE_*` environment variables.

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::{
    buffered::BufWriter,
    path::{Path, DELIMITER},
    ObjectStore,
};
use tokio_util::io::StreamReader;
use url::Url;

use super::{BlobReader, BlobStore, BlobWriter, ObjectAttributes};
use crate::error::{Error, Result};

/// Environment variable prefixes forwarded to the object store builders
const CREDENTIAL_ENV_PREFIXES: [&str; 3] = ["GOOGLE_", "AWS_", "AZURE_"];

/// In-memory part size before a write switches to a multipart upload (10MB)
pub const DEFAULT_PART_SIZE: usize = 10 * 1024 * 1024;

/// Blob store over an `object_store` bucket
#[derive(Clone)]
pub struct ObjectStoreBlobStore {
    store: Arc<dyn ObjectStore>,
    root: Path,
    part_size: usize,
}

impl ObjectStoreBlobStore {
    /// Wrap an existing object store rooted at the bucket
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            root: Path::default(),
            part_size: DEFAULT_PART_SIZE,
        }
    }

    /// Open the bucket at `url`; a path component in the URL becomes the root
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed: Url = url.parse()?;
        let (store, root) = object_store::parse_url_opts(&parsed, credential_options())?;
        tracing::info!("Using blob store {} (root \"{}\")", store, root);

        Ok(Self {
            store: Arc::from(store),
            root,
            part_size: DEFAULT_PART_SIZE,
        })
    }

    /// Place all object names under `root`
    pub fn with_root(mut self, root: impl Into<Path>) -> Self {
        self.root = root.into();
        self
    }

    /// Set the buffered part size used by writers
    pub fn with_part_size(mut self, part_size: usize) -> Self {
        self.part_size = part_size;
        self
    }

    /// Get the underlying object store
    pub fn object_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    /// Resolve an object name to its location under the root.
    ///
    /// The name is taken verbatim: names that `object_store` cannot hold
    /// unchanged (empty, empty segments, leading or trailing `/`, `.` or `..`
    /// segments, control characters) are rejected instead of rewritten.
    fn location(&self, name: &str) -> Result<Path> {
        let invalid = |reason: String| Error::InvalidObjectName {
            name: name.to_string(),
            reason,
        };

        if name.is_empty() {
            return Err(invalid("object name is empty".into()));
        }
        if name.starts_with(DELIMITER) || name.ends_with(DELIMITER) {
            return Err(invalid(format!("leading or trailing {:?} is not supported", DELIMITER)));
        }

        let name = Path::parse(name).map_err(|e| invalid(e.to_string()))?;
        Ok(self.root.parts().chain(name.parts()).collect())
    }
}

/// Collect backend settings from the environment, lower-cased the way the
/// `object_store` config keys expect them
fn credential_options() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(os_key, os_value)| {
            let (key, value) = (os_key.to_str()?, os_value.to_str()?);
            CREDENTIAL_ENV_PREFIXES
                .iter()
                .any(|prefix| key.starts_with(prefix))
                .then(|| (key.to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

#[async_trait]
impl BlobWriter for BufWriter {
    async fn abort(&mut self) -> Result<()> {
        BufWriter::abort(self).await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBlobStore {
    async fn open_reader(&self, name: &str) -> Result<BlobReader> {
        let location = self.location(name)?;
        let result = self.store.get(&location).await?;
        let stream = result.into_stream().map_err(std::io::Error::from);
        Ok(Box::new(StreamReader::new(stream)))
    }

    async fn open_writer(&self, name: &str) -> Result<Box<dyn BlobWriter>> {
        let location = self.location(name)?;
        Ok(Box::new(BufWriter::with_capacity(
            Arc::clone(&self.store),
            location,
            self.part_size,
        )))
    }

    async fn attributes(&self, name: &str) -> Result<Option<ObjectAttributes>> {
        let location = self.location(name)?;
        match self.store.head(&location).await {
            Ok(meta) => Ok(Some(ObjectAttributes {
                size: meta.size as u64,
                last_modified: meta.last_modified,
                e_tag: meta.e_tag,
            })),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
