//! PDF rendering infrastructure

mod cache;
mod document;
mod engine;
mod queue;
mod request;
mod selection;
mod service;
mod types;
mod worker;

pub use cache::PageCache;
pub use document::{
    CellHit, DocumentView, LoadState, NavigationError, PAGE_GAP_ROWS, PageSlot, ViewEvent,
    VisiblePage,
};
pub use engine::{EngineFactory, RenderEngine, mupdf_engine_factory};
pub use queue::RenderQueue;
pub use request::{Generation, RenderFault, RenderRequest, RenderResponse};
pub use selection::{SelectionPoint, TextSelection};
pub use service::RenderService;
pub use types::*;
pub use worker::{MAX_RASTER_DIMENSION, MupdfEngine, render_worker};
