//! Seam between the render worker and the PDF library

use std::path::Path;
use std::sync::Arc;

use super::request::RenderFault;
use super::types::{DocumentInfo, PageData, PageRegion};

/// A PDF library able to open one document at a time.
///
/// Engines live on the render worker thread and are never shared.
pub trait RenderEngine {
    /// Open `path`, replacing any open document
    fn open(&mut self, path: &Path) -> Result<DocumentInfo, RenderFault>;

    /// Rasterize a page (0-based) of the open document
    fn render_page(&mut self, page: usize, scale: f32) -> Result<PageData, RenderFault>;

    /// Text inside `region`, given in top-left based page coordinates
    fn extract_text(&mut self, page: usize, region: PageRegion) -> Result<String, RenderFault>;
}

/// Builds an engine on the worker thread; MuPDF documents cannot cross threads
pub type EngineFactory = Arc<dyn Fn() -> Box<dyn RenderEngine> + Send + Sync>;

#[must_use]
pub fn mupdf_engine_factory() -> EngineFactory {
    Arc::new(|| Box::new(super::worker::MupdfEngine::new()))
}
