//! Request dispatch and the per-verb handlers
//!
//! Every request maps to exactly one blob store call. Store failures are
//! turned into a status code here and never propagate to the server loop:
//! - GET: missing or unreadable object → 404
//! - HEAD: attribute lookup failed or empty → 404
//! - POST/PUT: invalid object name or body transfer failed → 400,
//!   writer could not be opened or commit failed → 500
//! - anything else → 405

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use futures::{StreamExt, TryStreamExt};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

use super::StorageProxy;
use crate::key::content_type;
use crate::store::BlobWriter;

/// Buffer size for streaming copies in both directions (64KB)
pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Failure while moving the request body into the object writer
#[derive(Debug, Error)]
enum TransferError {
    #[error("reading request body: {0}")]
    Body(axum::Error),

    #[error("writing object data: {0}")]
    Write(std::io::Error),

    #[error("flushing object data: {0}")]
    Flush(std::io::Error),
}

/// Single entry point for all paths and methods
pub(crate) async fn handle_request(
    State(proxy): State<StorageProxy>,
    method: Method,
    uri: Uri,
    body: Body,
) -> Response {
    let raw_path = decode_path(uri.path());
    let key = proxy.config().derive_key(&raw_path);
    let mime = content_type(&key.stripped);

    let mut response = match method {
        Method::GET => download_blob(&proxy, &key.object).await,
        Method::HEAD => check_blob_exists(&proxy, &key.object).await,
        Method::POST | Method::PUT => upload_blob(&proxy, &key.object, body).await,
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

/// Percent-decode the request path, keeping it raw if it is not valid UTF-8
fn decode_path(path: &str) -> String {
    match urlencoding::decode(path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => path.to_string(),
    }
}

// ─── GET ─────────────────────────────────────────────────────────────────────

async fn download_blob(proxy: &StorageProxy, object_name: &str) -> Response {
    let reader = match proxy.store().open_reader(object_name).await {
        Ok(reader) => reader,
        Err(e) => {
            warn!(
                "Error creating reader for object {:?} (it may not exist or there are permission issues): {}",
                object_name, e
            );
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    debug!("Serving object {:?}", object_name);

    // The reader lives inside the body stream and is dropped when the
    // response finishes, fails, or is abandoned by the client.
    let name = object_name.to_string();
    let stream = ReaderStream::with_capacity(reader, COPY_BUFFER_SIZE).inspect_err(move |e| {
        error!("Failed to write object {:?} to HTTP response: {}", name, e);
    });

    Body::from_stream(stream).into_response()
}

// ─── HEAD ────────────────────────────────────────────────────────────────────

async fn check_blob_exists(proxy: &StorageProxy, object_name: &str) -> Response {
    match proxy.store().attributes(object_name).await {
        Ok(Some(attrs)) => {
            debug!("Object {:?} exists ({} bytes)", object_name, attrs.size);
            StatusCode::OK.into_response()
        }
        Ok(None) => {
            debug!("Object {:?} not found", object_name);
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            warn!("Error fetching attributes for object {:?}: {}", object_name, e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

// ─── POST / PUT ──────────────────────────────────────────────────────────────

async fn upload_blob(proxy: &StorageProxy, object_name: &str, body: Body) -> Response {
    let writer = match proxy.store().open_writer(object_name).await {
        Ok(writer) => writer,
        Err(e) if e.is_invalid_object_name() => {
            warn!("Rejected upload to {:?}: {}", object_name, e);
            return (StatusCode::BAD_REQUEST, format!("Blob upload failed: {}", e)).into_response();
        }
        Err(e) => {
            error!("Failed to open writer for object {:?}: {}", object_name, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Blob upload could not be started: {}", e),
            )
                .into_response();
        }
    };
    let mut writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, writer);

    let copied = match copy_body(body, &mut writer).await {
        Ok(copied) => copied,
        Err(e) => {
            warn!("Upload of object {:?} failed: {}", object_name, e);
            // Release without committing; the 400 below is the only response
            if let Err(abort_err) = writer.get_mut().abort().await {
                error!("Failed to abort writer for object {:?}: {}", object_name, abort_err);
            }
            return upload_failed_response(&e);
        }
    };

    match writer.shutdown().await {
        Ok(()) => {
            info!(
                "Successfully uploaded and finalized object {:?} ({} bytes)",
                object_name, copied
            );
            StatusCode::CREATED.into_response()
        }
        Err(e) => {
            error!("Failed to finalize object {:?}: {}", object_name, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Blob upload could not be finalized: {}", e),
            )
                .into_response()
        }
    }
}

/// Stream the request body into `writer` and flush it, without committing
async fn copy_body<W>(body: Body, writer: &mut W) -> Result<u64, TransferError>
where
    W: AsyncWrite + Unpin,
{
    let mut stream = body.into_data_stream();
    let mut copied = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(TransferError::Body)?;
        writer.write_all(&chunk).await.map_err(TransferError::Write)?;
        copied += chunk.len() as u64;
    }

    writer.flush().await.map_err(TransferError::Flush)?;
    Ok(copied)
}

fn upload_failed_response(err: &TransferError) -> Response {
    (StatusCode::BAD_REQUEST, format!("Blob upload failed: {}", err)).into_response()
}
