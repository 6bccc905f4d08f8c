use geo::MultiPolygon;

use crate::transform::{GeoTransform, Window};

/// A non-horizontal ring segment, stored with `y0 < y1`.
#[derive(Debug, Clone, Copy)]
struct Edge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Edge {
    fn new(ax: f64, ay: f64, bx: f64, by: f64) -> Option<Self> {
        if ay < by {
            Some(Self { x0: ax, y0: ay, x1: bx, y1: by })
        } else if by < ay {
            Some(Self { x0: bx, y0: by, x1: ax, y1: ay })
        } else {
            None
        }
    }

    /// Longitude at which the edge crosses the horizontal line `y`.
    #[inline]
    fn x_at(&self, y: f64) -> f64 {
        self.x0 + (y - self.y0) * (self.x1 - self.x0) / (self.y1 - self.y0)
    }
}

/// Collect every ring segment (exteriors and holes) of the shape.
fn edges(shape: &MultiPolygon<f64>) -> Vec<Edge> {
    shape.0.iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .flat_map(|ring| ring.lines())
        .filter_map(|line| Edge::new(line.start.x, line.start.y, line.end.x, line.end.y))
        .collect()
}

/// Visit every cell of `window` whose centre lies inside `shape`.
///
/// Uses scan-line rasterisation with the even-odd rule: for each row, the
/// horizontal line through the cell centres is intersected with all ring
/// segments, and the spans between successive crossings are filled. A segment
/// counts as crossing row `y` when `y0 <= y < y1`, so vertices shared by two
/// segments are counted exactly once. Cells are visited row by row from south
/// to north, west to east within a row.
pub fn for_each_covered_cell<F>(shape: &MultiPolygon<f64>, transform: &GeoTransform, window: Window, mut visit: F)
where
    F: FnMut(usize, usize),
{
    if window.is_empty() { return }

    let mut pending = edges(shape);
    pending.sort_by(|a, b| b.y0.total_cmp(&a.y0)); // pop() yields lowest y0 first

    let mut active: Vec<Edge> = Vec::new();
    let mut crossings: Vec<f64> = Vec::new();

    for row in window.rows().rev() {
        let y = transform.row_center_y(row);

        while pending.last().is_some_and(|edge| edge.y0 <= y) {
            if let Some(edge) = pending.pop() { active.push(edge) }
        }
        active.retain(|edge| edge.y1 > y);
        if active.is_empty() { continue }

        crossings.clear();
        crossings.extend(active.iter().map(|edge| edge.x_at(y)));
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let first = transform.center_col(span[0]).ceil().max(window.col_off as f64);
            let last = transform.center_col(span[1]).ceil().min((window.col_off + window.width) as f64);
            if first >= last { continue }
            for col in first as usize..last as usize {
                visit(col, row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn collect(shape: &MultiPolygon<f64>, transform: &GeoTransform, window: Window) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for_each_covered_cell(shape, transform, window, |c, r| cells.push((c, r)));
        cells.sort();
        cells
    }

    #[test]
    fn square_covers_expected_cells() {
        // 10x10 grid of unit cells spanning (0, 0)-(10, 10).
        let t = GeoTransform::new(0.0, 10.0, 1.0, 1.0);
        let shape = MultiPolygon(vec![polygon![
            (x: 2.0, y: 2.0), (x: 5.0, y: 2.0), (x: 5.0, y: 4.0), (x: 2.0, y: 4.0), (x: 2.0, y: 2.0),
        ]]);
        let cells = collect(&shape, &t, Window::new(0, 0, 10, 10));
        // Columns 2..5, rows 6..8 (y centres 3.5 and 2.5).
        let expected: Vec<_> = (2..5).flat_map(|c| (6..8).map(move |r| (c, r))).collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn hole_is_excluded() {
        let t = GeoTransform::new(0.0, 4.0, 1.0, 1.0);
        let outer = geo::LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]);
        let hole = geo::LineString::from(vec![(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0), (1.0, 1.0)]);
        let shape = MultiPolygon(vec![geo::Polygon::new(outer, vec![hole])]);
        let cells = collect(&shape, &t, Window::new(0, 0, 4, 4));
        assert_eq!(cells.len(), 16 - 4);
        assert!(!cells.contains(&(1, 1)));
        assert!(!cells.contains(&(2, 2)));
    }

    #[test]
    fn window_restricts_visits() {
        let t = GeoTransform::new(0.0, 4.0, 1.0, 1.0);
        let shape = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0), (x: 0.0, y: 0.0),
        ]]);
        let cells = collect(&shape, &t, Window::new(1, 1, 2, 2));
        assert_eq!(cells, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn shape_between_centres_covers_nothing() {
        let t = GeoTransform::new(0.0, 4.0, 1.0, 1.0);
        let shape = MultiPolygon(vec![polygon![
            (x: 1.6, y: 1.6), (x: 1.9, y: 1.6), (x: 1.9, y: 1.9), (x: 1.6, y: 1.9), (x: 1.6, y: 1.6),
        ]]);
        assert!(collect(&shape, &t, Window::new(0, 0, 4, 4)).is_empty());
    }
}
