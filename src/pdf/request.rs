//! Render request and response types

use std::path::PathBuf;
use std::sync::Arc;

use super::types::{DocumentInfo, PageData, PageRegion};

/// Document load counter; every request and response carries the one it
/// belongs to so work for a replaced document can be recognised
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Request sent to the render worker
#[derive(Debug, Clone, PartialEq)]
pub enum RenderRequest {
    /// Open a document, replacing the current one
    Load { generation: Generation, path: PathBuf },

    /// Render one page (0-based) at the given scale
    Page {
        generation: Generation,
        page: usize,
        scale: f32,
    },

    /// Extract the text inside a page region
    ExtractText {
        generation: Generation,
        page: usize,
        region: PageRegion,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Errors from the render worker
#[derive(Debug, thiserror::Error)]
pub enum RenderFault {
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("no document is open")]
    NoDocument,

    #[error("{detail}")]
    Generic { detail: String },
}

impl RenderFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    Loaded {
        generation: Generation,
        info: DocumentInfo,
    },

    LoadFailed {
        generation: Generation,
        error: RenderFault,
    },

    Page {
        generation: Generation,
        page: usize,
        data: Arc<PageData>,
    },

    PageFailed {
        generation: Generation,
        page: usize,
        error: RenderFault,
    },

    ExtractedText {
        generation: Generation,
        page: usize,
        text: String,
    },
}

impl RenderResponse {
    #[must_use]
    pub fn generation(&self) -> Generation {
        match self {
            Self::Loaded { generation, .. }
            | Self::LoadFailed { generation, .. }
            | Self::Page { generation, .. }
            | Self::PageFailed { generation, .. }
            | Self::ExtractedText { generation, .. } => *generation,
        }
    }
}
