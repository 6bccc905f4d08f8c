use geo::MultiPolygon;
use popgrid::Grid;

use crate::geom;

/// Population and area of one region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZonalStat {
    pub population: f64,
    pub area_km2: i64,
}

/// Zonal statistics of region polygons over a country raster.
pub struct ZonalAggregator<'a> {
    grid: &'a Grid,
}

impl<'a> ZonalAggregator<'a> {
    pub fn new(grid: &'a Grid) -> Self { Self { grid } }

    /// Sum of valid cells whose centres fall inside `region` (never negative or NaN),
    /// and the region's geodesic area.
    pub fn aggregate(&self, region: &MultiPolygon<f64>) -> ZonalStat {
        let sum = self.grid.zonal_sum(region).sum;
        let population = if sum.is_nan() || sum < 0.0 { 0.0 } else { sum };
        ZonalStat { population, area_km2: geom::area_km2(region) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use popgrid::GeoTransform;

    fn grid(values: Vec<f32>) -> Grid {
        Grid::new(GeoTransform::new(0.0, 2.0, 1.0, 1.0), 2, 2, Some(-9999.0), values).unwrap()
    }

    fn whole() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0), (x: 0.0, y: 0.0)]])
    }

    #[test]
    fn sums_valid_cells() {
        let grid = grid(vec![10.0, 20.0, -9999.0, 5.5]);
        let stat = ZonalAggregator::new(&grid).aggregate(&whole());
        assert_eq!(stat.population, 35.5);
        assert!(stat.area_km2 > 40_000);
    }

    #[test]
    fn negative_sum_floors_to_zero() {
        let grid = grid(vec![-5.0, 1.0, 1.0, 1.0]);
        assert_eq!(ZonalAggregator::new(&grid).aggregate(&whole()).population, 0.0);
    }

    #[test]
    fn region_outside_raster_has_no_population() {
        let grid = grid(vec![1.0; 4]);
        let far = MultiPolygon(vec![polygon![(x: 50.0, y: 50.0), (x: 51.0, y: 50.0), (x: 51.0, y: 51.0), (x: 50.0, y: 50.0)]]);
        let stat = ZonalAggregator::new(&grid).aggregate(&far);
        assert_eq!(stat.population, 0.0);
        assert!(stat.area_km2 > 0);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let grid = grid(vec![0.1, 0.2, 0.3, 0.4]);
        let aggregator = ZonalAggregator::new(&grid);
        let first = aggregator.aggregate(&whole());
        for _ in 0..10 {
            assert_eq!(aggregator.aggregate(&whole()).population.to_bits(), first.population.to_bits());
        }
    }
}
