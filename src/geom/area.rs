use geo::{GeodesicArea, MultiPolygon};

/// WGS84 ellipsoidal area in km², rounded to the nearest integer.
pub fn area_km2(shape: &MultiPolygon<f64>) -> i64 {
    (shape.geodesic_area_unsigned() / 1e6).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn one_degree_cell_at_equator() {
        let cell = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
        ]]);
        // About 111.3 km x 110.6 km.
        let area = area_km2(&cell);
        assert!((12_300..=12_400).contains(&area), "{area}");
    }

    #[test]
    fn orientation_does_not_matter() {
        let ccw = MultiPolygon(vec![polygon![(x: 10.0, y: 50.0), (x: 11.0, y: 50.0), (x: 11.0, y: 51.0), (x: 10.0, y: 50.0)]]);
        let cw = MultiPolygon(vec![polygon![(x: 10.0, y: 50.0), (x: 11.0, y: 51.0), (x: 11.0, y: 50.0), (x: 10.0, y: 50.0)]]);
        assert_eq!(area_km2(&ccw), area_km2(&cw));
        assert_eq!(area_km2(&MultiPolygon::<f64>(vec![])), 0);
    }
}
