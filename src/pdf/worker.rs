//! PDF render worker - runs in a dedicated thread

use std::path::Path;
use std::sync::Arc;

use flume::{Receiver, Sender};
use image::RgbImage;
use log::{debug, info, warn};
use mupdf::text_page::TextBlockType;
use mupdf::{Colorspace, Document, Matrix, Pixmap, TextPageFlags};

use super::engine::RenderEngine;
use super::request::{Generation, RenderFault, RenderRequest, RenderResponse};
use super::types::{DocumentInfo, PageData, PageRegion, Viewport};

/// Largest raster edge in pixels; larger pages are rendered at a reduced scale
pub const MAX_RASTER_DIMENSION: f32 = 4000.0;

/// Main worker function.
///
/// Requests are handled strictly in arrival order. Page and text requests
/// for a generation other than the most recent load are dropped unanswered.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker(
    mut engine: Box<dyn RenderEngine>,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
) {
    let mut current = Generation::default();

    for request in requests {
        let response = match request {
            RenderRequest::Load { generation, path } => {
                current = generation;
                match engine.open(&path) {
                    Ok(info) => {
                        info!(
                            "Opened {} ({} pages) for generation {}",
                            path.display(),
                            info.page_count,
                            generation.0
                        );
                        RenderResponse::Loaded { generation, info }
                    }
                    Err(error) => RenderResponse::LoadFailed { generation, error },
                }
            }

            RenderRequest::Page {
                generation,
                page,
                scale,
            } => {
                if generation != current {
                    debug!("Skipping stale render of page {page}");
                    continue;
                }
                match engine.render_page(page, scale) {
                    Ok(data) => RenderResponse::Page {
                        generation,
                        page,
                        data: Arc::new(data),
                    },
                    Err(error) => RenderResponse::PageFailed {
                        generation,
                        page,
                        error,
                    },
                }
            }

            RenderRequest::ExtractText {
                generation,
                page,
                region,
            } => {
                if generation != current {
                    continue;
                }
                let text = engine.extract_text(page, region).unwrap_or_else(|e| {
                    warn!("Text extraction on page {page} failed: {e}");
                    String::new()
                });
                RenderResponse::ExtractedText {
                    generation,
                    page,
                    text,
                }
            }

            RenderRequest::Shutdown => break,
        };

        if responses.send(response).is_err() {
            break;
        }
    }
}

/// [`RenderEngine`] backed by MuPDF
#[derive(Default)]
pub struct MupdfEngine {
    doc: Option<Document>,
    page_count: usize,
}

impl MupdfEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn document(&self) -> Result<&Document, RenderFault> {
        self.doc.as_ref().ok_or(RenderFault::NoDocument)
    }

    fn check_page(&self, page: usize) -> Result<(), RenderFault> {
        if page < self.page_count {
            Ok(())
        } else {
            Err(RenderFault::PageOutOfRange {
                page,
                page_count: self.page_count,
            })
        }
    }
}

impl RenderEngine for MupdfEngine {
    fn open(&mut self, path: &Path) -> Result<DocumentInfo, RenderFault> {
        self.doc = None;
        self.page_count = 0;

        let doc = Document::open(path.to_string_lossy().as_ref())?;
        let page_count = usize::try_from(doc.page_count()?).unwrap_or(0);
        let title = doc
            .metadata(mupdf::MetadataName::Title)
            .ok()
            .filter(|t| !t.is_empty());

        self.doc = Some(doc);
        self.page_count = page_count;
        Ok(DocumentInfo { page_count, title })
    }

    fn render_page(&mut self, page_num: usize, scale: f32) -> Result<PageData, RenderFault> {
        self.check_page(page_num)?;
        let page = self.document()?.load_page(page_num as i32)?;

        let bounds = page.bounds()?;
        let view_box = [bounds.x0, bounds.y0, bounds.x1, bounds.y1];
        let largest_edge = (bounds.x1 - bounds.x0).max(bounds.y1 - bounds.y0) * scale;
        let scale = if largest_edge > MAX_RASTER_DIMENSION {
            scale * MAX_RASTER_DIMENSION / largest_edge
        } else {
            scale
        };

        let rgb = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&Matrix::new_scale(scale, scale), &rgb, false, false)?;
        let image = pixmap_to_image(&pixmap)?;

        Ok(PageData {
            page_num,
            image,
            viewport: Viewport::new(view_box, scale),
        })
    }

    fn extract_text(&mut self, page_num: usize, region: PageRegion) -> Result<String, RenderFault> {
        self.check_page(page_num)?;
        let page = self.document()?.load_page(page_num as i32)?;
        let text_page = page.to_text_page(TextPageFlags::empty())?;

        let mut selected_lines: Vec<(f32, String)> = Vec::new();
        for block in text_page.blocks() {
            if block.r#type() != TextBlockType::Text {
                continue;
            }
            for line in block.lines() {
                let bbox = line.bounds();
                if !region.intersects(bbox.x0, bbox.y0, bbox.x1, bbox.y1) {
                    continue;
                }

                let line_text: String = line
                    .chars()
                    .filter(|ch| {
                        let x = ch.origin().x;
                        x >= region.x0 && x <= region.x1
                    })
                    .filter_map(|ch| ch.char())
                    .collect();

                if !line_text.trim().is_empty() {
                    selected_lines.push((bbox.y0, line_text));
                }
            }
        }

        selected_lines.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let text = selected_lines
            .into_iter()
            .map(|(_, line)| line)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(text.trim().to_string())
    }
}

fn pixmap_to_image(pixmap: &Pixmap) -> Result<RgbImage, RenderFault> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(RenderFault::generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    let expected_min = stride.saturating_mul(height);
    if samples.len() < expected_min || row_bytes > stride {
        return Err(RenderFault::generic("Pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    RgbImage::from_raw(pixmap.width(), pixmap.height(), out)
        .ok_or_else(|| RenderFault::generic("Pixmap dimensions do not match its samples"))
}
