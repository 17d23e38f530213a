//! Wire and domain types shared with the backend service

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identifies the document currently open in the viewer.
///
/// `remote_path` is the backend-assigned path sent with every keyword search,
/// `local_path` is the file the renderer opens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRef {
    pub remote_path: String,
    pub local_path: PathBuf,
    pub file_name: String,
}

/// Rectangle in PDF page space
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

/// A keyword match: 1-based page number plus one or more boxes on that page
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub page: usize,
    pub boxes: Vec<BoundingBox>,
}

/// Body of `POST /keyword`
#[derive(Debug, Serialize)]
pub struct KeywordRequest<'a> {
    pub pdf_path: &'a str,
    pub keyword: &'a str,
}

/// Body returned by `POST /upload`
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub file_path: String,
}

/// The backend sends either a single box or a list of boxes per result
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireCoordinates {
    One(BoundingBox),
    Many(Vec<BoundingBox>),
}

#[derive(Debug, Deserialize)]
pub struct WireResult {
    pub page: usize,
    pub coordinates: WireCoordinates,
}

impl From<WireResult> for SearchResult {
    fn from(wire: WireResult) -> Self {
        let boxes = match wire.coordinates {
            WireCoordinates::One(b) => vec![b],
            WireCoordinates::Many(list) => list,
        };
        Self {
            page: wire.page,
            boxes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_box_coordinates_become_one_element_list() {
        let wire: WireResult = serde_json::from_str(
            r#"{"page": 2, "coordinates": {"x0": 0, "y0": 0, "x1": 10, "y1": 10}}"#,
        )
        .unwrap();
        let result = SearchResult::from(wire);
        assert_eq!(result.page, 2);
        assert_eq!(result.boxes, vec![BoundingBox::new(0.0, 0.0, 10.0, 10.0)]);
    }

    #[test]
    fn list_coordinates_keep_order() {
        let wire: WireResult = serde_json::from_str(
            r#"{"page": 5, "coordinates": [
                {"x0": 1, "y0": 2, "x1": 3, "y1": 4},
                {"x0": 5.5, "y0": 6, "x1": 7, "y1": 8}
            ]}"#,
        )
        .unwrap();
        let result = SearchResult::from(wire);
        assert_eq!(result.boxes.len(), 2);
        assert_eq!(result.boxes[1].x0, 5.5);
    }

    #[test]
    fn keyword_request_uses_backend_field_names() {
        let body = serde_json::to_value(KeywordRequest {
            pdf_path: "uploads/a.pdf",
            keyword: "rust",
        })
        .unwrap();
        assert_eq!(body["pdf_path"], "uploads/a.pdf");
        assert_eq!(body["keyword"], "rust");
    }
}
