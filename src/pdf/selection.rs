//! Mouse text selection within the page area

use super::document::CellHit;

/// A selection endpoint: the terminal cell and what it covers on a page
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionPoint {
    /// Column relative to the page area
    pub col: u16,
    /// Row relative to the page area
    pub row: u16,
    pub hit: CellHit,
}

#[derive(Clone, Debug, Default)]
pub struct TextSelection {
    pub start: Option<SelectionPoint>,
    pub end: Option<SelectionPoint>,
    pub is_selecting: bool,
}

impl TextSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_at(&mut self, point: SelectionPoint) {
        self.start = Some(point);
        self.end = Some(point);
        self.is_selecting = true;
    }

    /// Update the end point during a drag
    pub fn update_end(&mut self, point: SelectionPoint) {
        if self.is_selecting {
            self.end = Some(point);
        }
    }

    /// Stop dragging and hand back the endpoints, start first
    pub fn finish(&mut self) -> Option<(SelectionPoint, SelectionPoint)> {
        if !self.is_selecting {
            return None;
        }
        self.is_selecting = false;
        self.ordered_bounds()
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
        self.is_selecting = false;
    }

    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    #[must_use]
    pub fn ordered_bounds(&self) -> Option<(SelectionPoint, SelectionPoint)> {
        let (start, end) = (self.start?, self.end?);
        if (start.row, start.col) <= (end.row, end.col) {
            Some((start, end))
        } else {
            Some((end, start))
        }
    }

    /// Whether a page-area cell falls inside the selection, in reading order
    #[must_use]
    pub fn contains_cell(&self, col: u16, row: u16) -> bool {
        let Some((start, end)) = self.ordered_bounds() else {
            return false;
        };
        if row < start.row || row > end.row {
            return false;
        }
        if start.row == end.row {
            return col >= start.col && col <= end.col;
        }
        if row == start.row {
            col >= start.col
        } else if row == end.row {
            col <= end.col
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::CanvasRect;

    fn point(col: u16, row: u16) -> SelectionPoint {
        SelectionPoint {
            col,
            row,
            hit: CellHit {
                page: 0,
                canvas: CanvasRect {
                    x: f32::from(col),
                    y: f32::from(row),
                    width: 1.0,
                    height: 1.0,
                },
            },
        }
    }

    #[test]
    fn backwards_drag_is_reordered() {
        let mut selection = TextSelection::new();
        selection.start_at(point(10, 5));
        selection.update_end(point(2, 1));
        let (start, end) = selection.finish().unwrap();
        assert_eq!((start.col, start.row), (2, 1));
        assert_eq!((end.col, end.row), (10, 5));
        assert!(!selection.is_selecting);
    }

    #[test]
    fn finish_without_drag_is_none() {
        let mut selection = TextSelection::new();
        assert!(selection.finish().is_none());
    }

    #[test]
    fn cells_follow_reading_order() {
        let mut selection = TextSelection::new();
        selection.start_at(point(5, 1));
        selection.update_end(point(3, 3));

        assert!(!selection.contains_cell(4, 1));
        assert!(selection.contains_cell(5, 1));
        assert!(selection.contains_cell(0, 2));
        assert!(selection.contains_cell(3, 3));
        assert!(!selection.contains_cell(4, 3));
    }
}
