//! Render service - owns the render worker thread and its channels

use flume::{Receiver, Sender};
use log::warn;

use super::engine::EngineFactory;
use super::request::{RenderRequest, RenderResponse};
use super::worker::render_worker;

/// Channel pair to a single render worker.
///
/// One worker keeps page paints strictly sequential.
pub struct RenderService {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
}

impl RenderService {
    #[must_use]
    pub fn new(factory: EngineFactory) -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        std::thread::spawn(move || {
            let engine = factory();
            render_worker(engine, request_rx, response_tx);
        });

        Self {
            request_tx,
            response_rx,
        }
    }

    pub fn send(&self, request: RenderRequest) {
        if self.request_tx.send(request).is_err() {
            warn!("Render worker is gone, request dropped");
        }
    }

    /// Drain completed responses without blocking
    pub fn poll_responses(&self) -> Vec<RenderResponse> {
        self.response_rx.try_iter().collect()
    }

    /// Get the response receiver for blocking waits
    #[must_use]
    pub fn response_receiver(&self) -> &Receiver<RenderResponse> {
        &self.response_rx
    }

    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
