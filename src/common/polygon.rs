use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use shapefile as shp;

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>
pub(crate) fn shp_to_geo(p: &shp::Polygon) -> MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn ensure_closed(coords: &mut Vec<Coord<f64>>) {
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last { coords.push(first) }
        }
    }

    // Each outer ring starts a polygon; inner rings attach to the preceding outer ring.
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in p.rings() {
        let mut coords: Vec<Coord<f64>> = ring.points().iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect();
        ensure_closed(&mut coords);
        match ring {
            shp::PolygonRing::Outer(_) => {
                if let Some(ext) = exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
                exterior = Some(LineString(coords));
            }
            shp::PolygonRing::Inner(_) => holes.push(LineString(coords)),
        }
    }
    if let Some(ext) = exterior {
        polys.push(Polygon::new(ext, holes));
    }

    MultiPolygon(polys)
}

/// Convert a shapefile shape into a geo geometry. Single-part polygons stay `Polygon`.
/// Returns `None` for null shapes and shape kinds with no planar meaning here.
pub(crate) fn shape_to_geometry(shape: &shp::Shape) -> Option<Geometry<f64>> {
    match shape {
        shp::Shape::Polygon(p) => {
            let mut mp = shp_to_geo(p);
            Some(if mp.0.len() == 1 { Geometry::Polygon(mp.0.remove(0)) } else { Geometry::MultiPolygon(mp) })
        }
        shp::Shape::Point(p) => Some(Geometry::Point(Point::new(p.x, p.y))),
        _ => None,
    }
}

/// The polygonal part of a geometry as a multipolygon.
pub(crate) fn as_multipolygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        _ => None,
    }
}

/// Short name of a geometry kind, for diagnostics.
pub(crate) fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, s: f64) -> Vec<shp::Point> {
        vec![
            shp::Point { x, y }, shp::Point { x, y: y + s },
            shp::Point { x: x + s, y: y + s }, shp::Point { x: x + s, y },
        ]
    }

    #[test]
    fn rings_group_into_polygons() {
        let p = shp::Polygon::with_rings(vec![
            shp::PolygonRing::Outer(square(0.0, 0.0, 4.0)),
            shp::PolygonRing::Inner(square(1.0, 1.0, 1.0)),
            shp::PolygonRing::Outer(square(10.0, 10.0, 1.0)),
        ]);
        let mp = shp_to_geo(&p);
        assert_eq!(mp.0.len(), 2);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert!(mp.0[1].interiors().is_empty());
        assert!(mp.0[0].exterior().is_closed());
    }

    #[test]
    fn single_part_shape_is_a_polygon() {
        let shape = shp::Shape::Polygon(shp::Polygon::new(shp::PolygonRing::Outer(square(0.0, 0.0, 1.0))));
        assert!(matches!(shape_to_geometry(&shape), Some(Geometry::Polygon(_))));
        assert!(shape_to_geometry(&shp::Shape::NullShape).is_none());
    }
}
