use std::fs::File;
use std::io::BufReader;

use geo::{polygon, Coord, MultiPolygon, Rect};
use popgrid::{read_geotiff, read_geotiff_window, write_geotiff, GeoTransform, Grid};

/// 1/12 degree grid over a 2x1 degree box, each cell holding 1 person.
fn uniform() -> Grid {
    let (width, height) = (24, 12);
    Grid::new(
        GeoTransform::new(30.0, 1.0, 1.0 / 12.0, 1.0 / 12.0),
        width, height, Some(-99999.0),
        vec![1.0; width * height],
    ).unwrap()
}

#[test]
fn clip_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("population.tif");
    write_geotiff(&uniform(), File::create(&path).unwrap()).unwrap();

    // West half plus a margin that falls off the raster edge.
    let rect = Rect::new(Coord { x: 29.9, y: -0.1 }, Coord { x: 30.95, y: 1.1 });
    let mut clipped = read_geotiff_window(BufReader::new(File::open(&path).unwrap()), &rect).unwrap();
    assert_eq!((clipped.width(), clipped.height()), (12, 12));

    let west: MultiPolygon<f64> = MultiPolygon(vec![polygon![
        (x: 30.0, y: 0.0), (x: 30.5, y: 0.0), (x: 30.5, y: 1.0), (x: 30.0, y: 1.0), (x: 30.0, y: 0.0),
    ]]);
    let kept = clipped.mask(&west);
    assert_eq!(kept, 6 * 12);

    let out = dir.path().join("clipped.tif");
    write_geotiff(&clipped, File::create(&out).unwrap()).unwrap();
    let reread = read_geotiff(BufReader::new(File::open(&out).unwrap())).unwrap();
    assert_eq!(reread, clipped);

    let total = reread.zonal_sum(&west);
    assert_eq!(total.cells, 72);
    assert!((total.sum - 72.0).abs() < 1e-9);
}
