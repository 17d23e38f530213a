//! Core types for PDF rendering

use image::RgbImage;

use crate::backend::BoundingBox;

/// Which corner PDF-space coordinates from the backend are measured from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateOrigin {
    /// PDF user space: y grows upwards from the bottom edge
    #[default]
    BottomLeft,
    /// Device-style space: y grows downwards from the top edge
    TopLeft,
}

/// Page geometry at a given render scale.
///
/// `view_box` is the page rectangle in PDF points. The canvas is
/// `width` x `height` pixels with its origin at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub view_box: [f32; 4],
    pub scale: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[must_use]
    pub fn new(view_box: [f32; 4], scale: f32) -> Self {
        let [x0, y0, x1, y1] = view_box;
        Self {
            view_box,
            scale,
            width: (x1 - x0).abs() * scale,
            height: (y1 - y0).abs() * scale,
        }
    }

    /// Convert a point from PDF space to canvas pixels
    #[must_use]
    pub fn to_canvas_point(&self, x: f32, y: f32, origin: CoordinateOrigin) -> (f32, f32) {
        let [vx0, vy0, _, vy1] = self.view_box;
        let cx = (x - vx0) * self.scale;
        let cy = match origin {
            CoordinateOrigin::BottomLeft => (vy1 - y) * self.scale,
            CoordinateOrigin::TopLeft => (y - vy0) * self.scale,
        };
        (cx, cy)
    }

    /// Convert a bounding box from PDF space to a canvas rectangle
    #[must_use]
    pub fn to_canvas_rect(&self, bbox: &BoundingBox, origin: CoordinateOrigin) -> CanvasRect {
        let (ax, ay) = self.to_canvas_point(bbox.x0, bbox.y0, origin);
        let (bx, by) = self.to_canvas_point(bbox.x1, bbox.y1, origin);
        CanvasRect {
            x: ax.min(bx),
            y: ay.min(by),
            width: (bx - ax).abs(),
            height: (by - ay).abs(),
        }
    }

    /// Convert canvas pixels back to top-left based page coordinates
    #[must_use]
    pub fn to_page_point(&self, cx: f32, cy: f32) -> (f32, f32) {
        let [vx0, vy0, _, _] = self.view_box;
        (cx / self.scale + vx0, cy / self.scale + vy0)
    }

    /// Height over width; used to size pages and placeholders
    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.width > 0.0 {
            self.height / self.width
        } else {
            DEFAULT_PAGE_ASPECT
        }
    }
}

/// US Letter, used before any page geometry is known
pub const DEFAULT_PAGE_ASPECT: f32 = 11.0 / 8.5;

/// Rectangle in canvas pixel space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Region of a page in top-left based page coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageRegion {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageRegion {
    #[must_use]
    pub fn intersects(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> bool {
        x0 <= self.x1 && x1 >= self.x0 && y0 <= self.y1 && y1 >= self.y0
    }
}

/// Rendered page: RGB raster plus the geometry it was drawn with
#[derive(Clone)]
pub struct PageData {
    /// Page index (0-based)
    pub page_num: usize,
    pub image: RgbImage,
    pub viewport: Viewport,
}

impl std::fmt::Debug for PageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageData")
            .field("page_num", &self.page_num)
            .field("width_px", &self.image.width())
            .field("height_px", &self.image.height())
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

/// Document metadata reported after a load
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(scale: f32) -> Viewport {
        Viewport::new([0.0, 0.0, 612.0, 792.0], scale)
    }

    #[test]
    fn viewport_dimensions_follow_scale() {
        let vp = letter(1.5);
        assert_eq!(vp.width, 918.0);
        assert_eq!(vp.height, 1188.0);
    }

    #[test]
    fn bottom_left_boxes_are_flipped() {
        let vp = letter(2.0);
        let rect = vp.to_canvas_rect(
            &BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            CoordinateOrigin::BottomLeft,
        );
        assert_eq!(
            rect,
            CanvasRect {
                x: 0.0,
                y: (792.0 - 10.0) * 2.0,
                width: 20.0,
                height: 20.0,
            }
        );
    }

    #[test]
    fn top_left_boxes_are_only_scaled() {
        let vp = letter(2.0);
        let rect = vp.to_canvas_rect(
            &BoundingBox::new(5.0, 10.0, 15.0, 30.0),
            CoordinateOrigin::TopLeft,
        );
        assert_eq!(
            rect,
            CanvasRect {
                x: 10.0,
                y: 20.0,
                width: 20.0,
                height: 40.0,
            }
        );
    }

    #[test]
    fn view_box_offset_is_respected() {
        let vp = Viewport::new([10.0, 20.0, 110.0, 220.0], 1.0);
        let (x, y) = vp.to_canvas_point(10.0, 220.0, CoordinateOrigin::BottomLeft);
        assert_eq!((x, y), (0.0, 0.0));
        assert_eq!(vp.to_page_point(0.0, 0.0), (10.0, 20.0));
    }
}
