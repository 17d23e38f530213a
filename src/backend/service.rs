//! Backend service - runs uploads and searches off the UI thread

use std::path::PathBuf;
use std::sync::Arc;

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::client::Backend;
use super::error::BackendError;
use super::types::SearchResult;

pub const DEFAULT_BACKEND_WORKERS: usize = 2;

/// Identifies one dispatched backend request; ids increase monotonically
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestSeq(pub u64);

#[derive(Debug)]
enum BackendRequest {
    Upload {
        seq: RequestSeq,
        local_path: PathBuf,
        file_name: String,
    },
    Search {
        seq: RequestSeq,
        pdf_path: String,
        keyword: String,
    },
    Shutdown,
}

/// Completed backend request
#[derive(Debug)]
pub enum BackendResponse {
    Uploaded {
        seq: RequestSeq,
        result: Result<String, BackendError>,
    },
    Searched {
        seq: RequestSeq,
        result: Result<Vec<SearchResult>, BackendError>,
    },
}

impl BackendResponse {
    #[must_use]
    pub fn seq(&self) -> RequestSeq {
        match self {
            Self::Uploaded { seq, .. } | Self::Searched { seq, .. } => *seq,
        }
    }
}

/// Owns the worker threads that call into a [`Backend`].
///
/// Uploads run on their own worker so a new document is never queued
/// behind searches whose results are about to be discarded.
pub struct BackendService {
    search_tx: Sender<BackendRequest>,
    upload_tx: Sender<BackendRequest>,
    response_rx: Receiver<BackendResponse>,
    next_seq: u64,
    num_workers: usize,
}

impl BackendService {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_workers(backend, DEFAULT_BACKEND_WORKERS)
    }

    /// Search workers pull from one shared queue, so searches may complete
    /// out of order
    #[must_use]
    pub fn with_workers(backend: Arc<dyn Backend>, num_workers: usize) -> Self {
        let num_workers = num_workers.max(1);
        let (search_tx, search_rx) = flume::unbounded();
        let (upload_tx, upload_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        for _ in 0..num_workers {
            spawn_worker(&backend, search_rx.clone(), response_tx.clone());
        }
        spawn_worker(&backend, upload_rx, response_tx);

        Self {
            search_tx,
            upload_tx,
            response_rx,
            next_seq: 1,
            num_workers,
        }
    }

    pub fn upload(&mut self, local_path: PathBuf, file_name: String) -> RequestSeq {
        let seq = self.next_seq();
        Self::send(&self.upload_tx, BackendRequest::Upload {
            seq,
            local_path,
            file_name,
        });
        seq
    }

    pub fn search(&mut self, pdf_path: String, keyword: String) -> RequestSeq {
        let seq = self.next_seq();
        Self::send(&self.search_tx, BackendRequest::Search {
            seq,
            pdf_path,
            keyword,
        });
        seq
    }

    /// Drain completed requests without blocking
    pub fn poll_responses(&mut self) -> Vec<BackendResponse> {
        self.response_rx.try_iter().collect()
    }

    /// Get the response receiver for blocking waits
    #[must_use]
    pub fn response_receiver(&self) -> &Receiver<BackendResponse> {
        &self.response_rx
    }

    pub fn shutdown(&self) {
        for _ in 0..self.num_workers {
            let _ = self.search_tx.send(BackendRequest::Shutdown);
        }
        let _ = self.upload_tx.send(BackendRequest::Shutdown);
    }

    fn send(tx: &Sender<BackendRequest>, request: BackendRequest) {
        if tx.send(request).is_err() {
            warn!("Backend workers are gone, request dropped");
        }
    }

    fn next_seq(&mut self) -> RequestSeq {
        let seq = RequestSeq(self.next_seq);
        self.next_seq += 1;
        seq
    }
}

impl Drop for BackendService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_worker(
    backend: &Arc<dyn Backend>,
    requests: Receiver<BackendRequest>,
    responses: Sender<BackendResponse>,
) {
    let backend = Arc::clone(backend);
    std::thread::spawn(move || backend_worker(backend.as_ref(), &requests, &responses));
}

fn backend_worker(
    backend: &dyn Backend,
    requests: &Receiver<BackendRequest>,
    responses: &Sender<BackendResponse>,
) {
    for request in requests.iter() {
        let response = match request {
            BackendRequest::Upload {
                seq,
                local_path,
                file_name,
            } => BackendResponse::Uploaded {
                seq,
                result: backend.upload(&local_path, &file_name),
            },
            BackendRequest::Search {
                seq,
                pdf_path,
                keyword,
            } => BackendResponse::Searched {
                seq,
                result: backend.keyword_search(&pdf_path, &keyword),
            },
            BackendRequest::Shutdown => break,
        };

        debug!("Backend request {:?} finished", response.seq());
        if responses.send(response).is_err() {
            break;
        }
    }
}
