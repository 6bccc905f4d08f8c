use std::ops::Range;

use geo::Rect;

/// Affine mapping between pixel space and lon/lat for a north-up grid.
///
/// Column `c` spans `[origin_x + c * cell_width, origin_x + (c + 1) * cell_width)`
/// and row `r` spans `(origin_y - (r + 1) * cell_height, origin_y - r * cell_height]`,
/// i.e. rows advance southwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_width: f64,
    pub cell_height: f64,
}

/// A rectangular block of pixels, in the pixel space of some parent grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub fn new(col_off: usize, row_off: usize, width: usize, height: usize) -> Self {
        Self { col_off, row_off, width, height }
    }

    #[inline] pub fn is_empty(&self) -> bool { self.width == 0 || self.height == 0 }

    #[inline] pub fn rows(&self) -> Range<usize> { self.row_off..self.row_off + self.height }
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, cell_width: f64, cell_height: f64) -> Self {
        Self { origin_x, origin_y, cell_width, cell_height }
    }

    /// Longitude of the centre of column `col`.
    #[inline]
    pub fn col_center_x(&self, col: usize) -> f64 {
        self.origin_x + (col as f64 + 0.5) * self.cell_width
    }

    /// Latitude of the centre of row `row`.
    #[inline]
    pub fn row_center_y(&self, row: usize) -> f64 {
        self.origin_y - (row as f64 + 0.5) * self.cell_height
    }

    /// Fractional column position of longitude `x`, measured from cell centres
    /// (so `x` at the centre of column `c` maps to exactly `c`).
    #[inline]
    pub fn center_col(&self, x: f64) -> f64 {
        (x - self.origin_x) / self.cell_width - 0.5
    }

    /// Transform of the sub-grid that starts at the window's top-left pixel.
    pub fn offset(&self, window: &Window) -> Self {
        Self {
            origin_x: self.origin_x + window.col_off as f64 * self.cell_width,
            origin_y: self.origin_y - window.row_off as f64 * self.cell_height,
            ..*self
        }
    }

    /// Smallest pixel window covering `rect`, clamped to a `width` x `height` grid.
    /// Returns `None` when the rectangle does not overlap the grid.
    pub fn window_for(&self, rect: &Rect<f64>, width: usize, height: usize) -> Option<Window> {
        let clamp = |v: f64, max: usize| -> usize {
            if v.is_nan() || v <= 0.0 { 0 } else { (v as usize).min(max) }
        };

        let col_min = clamp(((rect.min().x - self.origin_x) / self.cell_width).floor(), width);
        let col_max = clamp(((rect.max().x - self.origin_x) / self.cell_width).ceil(), width);
        let row_min = clamp(((self.origin_y - rect.max().y) / self.cell_height).floor(), height);
        let row_max = clamp(((self.origin_y - rect.min().y) / self.cell_height).ceil(), height);

        let window = Window::new(
            col_min,
            row_min,
            col_max.saturating_sub(col_min),
            row_max.saturating_sub(row_min),
        );
        (!window.is_empty()).then_some(window)
    }
}

#[cfg(test)]
mod tests {
    use geo::Coord;

    use super::*;

    fn one_degree() -> GeoTransform { GeoTransform::new(-10.0, 10.0, 1.0, 1.0) }

    #[test]
    fn cell_centers() {
        let t = one_degree();
        assert_eq!((t.col_center_x(0), t.row_center_y(0)), (-9.5, 9.5));
        assert_eq!((t.col_center_x(3), t.row_center_y(2)), (-6.5, 7.5));
    }

    #[test]
    fn window_is_clamped_to_grid() {
        let t = one_degree();
        let rect = Rect::new(Coord { x: -20.0, y: 5.5 }, Coord { x: -7.2, y: 30.0 });
        let w = t.window_for(&rect, 20, 20).unwrap();
        assert_eq!(w, Window::new(0, 0, 3, 5));
    }

    #[test]
    fn window_outside_grid_is_none() {
        let t = one_degree();
        let rect = Rect::new(Coord { x: 50.0, y: 0.0 }, Coord { x: 60.0, y: 5.0 });
        assert!(t.window_for(&rect, 20, 20).is_none());
    }

    #[test]
    fn offset_moves_origin_by_window() {
        let t = one_degree().offset(&Window::new(2, 3, 4, 4));
        assert_eq!(t.origin_x, -8.0);
        assert_eq!(t.origin_y, 7.0);
        assert_eq!(t.cell_width, 1.0);
    }
}
