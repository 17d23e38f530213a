//! Client side of the upload/keyword backend

mod client;
mod error;
mod service;
mod types;

pub use client::{
    Backend, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, HttpBackend, parse_search_response,
    parse_upload_response,
};
pub use error::BackendError;
pub use service::{BackendResponse, BackendService, DEFAULT_BACKEND_WORKERS, RequestSeq};
pub use types::{BoundingBox, DocumentRef, SearchResult};
