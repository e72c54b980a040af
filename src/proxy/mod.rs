//! HTTP Storage Proxy
//!
//! Translates GET/HEAD/POST/PUT requests on path-based keys into reads,
//! existence checks and writes against a blob store.

mod handler;
mod server;

pub use handler::COPY_BUFFER_SIZE;
pub use server::StorageProxy;
