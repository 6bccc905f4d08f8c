use geo::{BoundingRect, MultiPolygon, Rect};

use crate::error::GridError;
use crate::scan::for_each_covered_cell;
use crate::transform::{GeoTransform, Window};

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// A single-band, row-major raster of `f32` cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    transform: GeoTransform,
    width: usize,
    height: usize,
    nodata: Option<f32>,
    data: Vec<f32>,
}

/// Result of summing the cells under a polygon footprint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZonalSum {
    /// Sum of all valid covered cells (0 when `cells == 0`).
    pub sum: f64,
    /// Number of valid cells whose centres fall inside the footprint.
    pub cells: usize,
}

impl Grid {
    pub fn new(transform: GeoTransform, width: usize, height: usize, nodata: Option<f32>, data: Vec<f32>) -> Result<Self, GridError> {
        if data.len() != width * height {
            return Err(GridError::Shape { len: data.len(), width, height });
        }
        Ok(Self { transform, width, height, nodata, data })
    }

    /// A grid with every cell set to `value`.
    pub fn filled(transform: GeoTransform, width: usize, height: usize, nodata: Option<f32>, value: f32) -> Self {
        Self { transform, width, height, nodata, data: vec![value; width * height] }
    }

    #[inline] pub fn transform(&self) -> &GeoTransform { &self.transform }

    #[inline] pub fn width(&self) -> usize { self.width }

    #[inline] pub fn height(&self) -> usize { self.height }

    #[inline] pub fn nodata(&self) -> Option<f32> { self.nodata }

    #[inline] pub fn data(&self) -> &[f32] { &self.data }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        (col < self.width && row < self.height).then(|| self.data[row * self.width + col])
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: f32) {
        if col < self.width && row < self.height {
            self.data[row * self.width + col] = value;
        }
    }

    /// Value written into masked-out cells: the nodata sentinel, or NaN if none is declared.
    #[inline]
    pub fn fill_value(&self) -> f32 { self.nodata.unwrap_or(f32::NAN) }

    /// True unless the value is NaN or equal to the nodata sentinel.
    #[inline]
    pub fn is_valid(&self, value: f32) -> bool {
        !value.is_nan() && self.nodata.is_none_or(|nodata| value != nodata)
    }

    /// Pixel window covering `rect`, or `None` if it does not overlap the grid.
    pub fn window(&self, rect: &Rect<f64>) -> Option<Window> {
        self.transform.window_for(rect, self.width, self.height)
    }

    /// Copy out a sub-grid with its own transform.
    pub fn subgrid(&self, window: &Window) -> Result<Self, GridError> {
        if window.is_empty() || window.col_off + window.width > self.width || window.row_off + window.height > self.height {
            return Err(GridError::OutOfBounds);
        }
        let data = window.rows()
            .flat_map(|row| {
                let start = row * self.width + window.col_off;
                self.data[start..start + window.width].iter().copied()
            })
            .collect();
        Self::new(self.transform.offset(window), window.width, window.height, self.nodata, data)
    }

    /// Set every cell whose centre lies outside `footprint` to the fill value.
    /// Returns the number of cells kept.
    pub fn mask(&mut self, footprint: &MultiPolygon<f64>) -> usize {
        let mut inside = vec![false; self.data.len()];
        let full = Window::new(0, 0, self.width, self.height);
        for_each_covered_cell(footprint, &self.transform, full, |col, row| {
            inside[row * self.width + col] = true;
        });

        let fill = self.fill_value();
        let mut kept = 0;
        for (value, keep) in self.data.iter_mut().zip(inside) {
            if keep { kept += 1 } else { *value = fill }
        }
        kept
    }

    /// Sum the valid cells whose centres lie inside `shape`.
    pub fn zonal_sum(&self, shape: &MultiPolygon<f64>) -> ZonalSum {
        let Some(window) = shape.bounding_rect().and_then(|rect| self.window(&rect)) else {
            return ZonalSum::default();
        };

        let mut total = ZonalSum::default();
        for_each_covered_cell(shape, &self.transform, window, |col, row| {
            let value = self.data[row * self.width + col];
            if self.is_valid(value) {
                total.sum += value as f64;
                total.cells += 1;
            }
        });
        total
    }
}
