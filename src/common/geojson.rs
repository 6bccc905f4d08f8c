use anyhow::{Context, Result, anyhow, bail};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{Value, json};

/// Write (geometry, properties) pairs as a GeoJSON FeatureCollection of MultiPolygons.
pub(crate) fn write_to_geojson_bytes(features: &[(MultiPolygon<f64>, Value)]) -> Result<Vec<u8>> {
    fn ring(ls: &LineString<f64>) -> Value {
        Value::Array(ls.coords().map(|c| json!([c.x, c.y])).collect())
    }

    let features: Vec<Value> = features.iter().map(|(mp, properties)| {
        let polygons: Vec<Value> = mp.0.iter()
            .map(|polygon| Value::Array(
                std::iter::once(polygon.exterior()).chain(polygon.interiors()).map(ring).collect()
            ))
            .collect();

        json!({
            "type": "Feature",
            "geometry": { "type": "MultiPolygon", "coordinates": polygons },
            "properties": properties,
        })
    }).collect();

    serde_json::to_vec(&json!({ "type": "FeatureCollection", "features": features }))
        .context("Failed to serialize GeoJSON to bytes")
}

/// Read (geometry, properties) pairs from a GeoJSON FeatureCollection.
/// Polygon features are widened to single-part MultiPolygons.
pub(crate) fn read_from_geojson_bytes(bytes: &[u8]) -> Result<Vec<(MultiPolygon<f64>, Value)>> {
    let value: Value = serde_json::from_slice(bytes).context("Failed to parse GeoJSON bytes")?;
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("GeoJSON is not a FeatureCollection"))?;

    features.iter().enumerate().map(|(i, feature)| {
        let geometry = &feature["geometry"];
        let coords = geometry["coordinates"].as_array()
            .ok_or_else(|| anyhow!("feature {i}: missing coordinates"))?;
        let mp = match geometry["type"].as_str() {
            Some("MultiPolygon") => MultiPolygon(coords.iter()
                .map(parse_polygon)
                .collect::<Result<_>>()?),
            Some("Polygon") => MultiPolygon(vec![parse_polygon(&geometry["coordinates"])?]),
            other => bail!("feature {i}: unsupported geometry type {other:?}"),
        };
        Ok((mp, feature["properties"].clone()))
    }).collect()
}

/// Parse `[exterior, hole, hole, ...]`.
fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value.as_array().ok_or_else(|| anyhow!("Invalid Polygon: expected an array of rings"))?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next().ok_or_else(|| anyhow!("Invalid Polygon: missing exterior ring"))??;
    Ok(Polygon::new(exterior, rings.collect::<Result<_>>()?))
}

/// Parse `[[x, y], [x, y], ...]`, closing the ring if needed.
fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let mut points = value.as_array()
        .ok_or_else(|| anyhow!("Invalid ring: expected an array of positions"))?
        .iter()
        .map(|position| {
            let x = position[0].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?;
            let y = position[1].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?;
            Ok(Coord { x, y })
        })
        .collect::<Result<Vec<_>>>()?;

    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last { points.push(first) }
    }
    Ok(LineString(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn holes_and_properties_survive() {
        let outer = LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]);
        let hole = LineString::from(vec![(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)]);
        let mp = MultiPolygon(vec![
            Polygon::new(outer, vec![hole]),
            polygon![(x: 10.0, y: 10.0), (x: 11.0, y: 10.0), (x: 11.0, y: 11.0), (x: 10.0, y: 10.0)],
        ]);

        let bytes = write_to_geojson_bytes(&[(mp.clone(), json!({ "id": "AAA.1_1" }))]).unwrap();
        let features = read_from_geojson_bytes(&bytes).unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].0, mp);
        assert_eq!(features[0].1["id"], "AAA.1_1");
    }

    #[test]
    fn plain_polygon_is_accepted() {
        let bytes = br#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1]]]}}
        ]}"#;
        let features = read_from_geojson_bytes(bytes).unwrap();
        assert_eq!(features[0].0.0[0].exterior().0.len(), 4);
    }

    #[test]
    fn points_are_rejected() {
        let bytes = br#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[0,0]}}
        ]}"#;
        assert!(read_from_geojson_bytes(bytes).is_err());
    }
}
