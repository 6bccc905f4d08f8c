use std::io::{Read, Seek, Write};

use geo::Rect;
use tiff::{
    decoder::{Decoder, DecodingResult, Limits},
    encoder::{colortype, TiffEncoder},
    tags::Tag,
    ColorType,
};

use crate::error::GridError;
use crate::grid::Grid;
use crate::transform::{GeoTransform, Window};

/// GeoKeyDirectory for a geographic (lon/lat) WGS84 raster with area pixels:
/// header, GTModelType = Geographic, GTRasterType = PixelIsArea, GeographicType = 4326.
const WGS84_GEO_KEYS: [u16; 16] = [
    1, 1, 0, 3,
    1024, 0, 1, 2,
    1025, 0, 1, 1,
    2048, 0, 1, 4326,
];

/// Size, georeferencing and nodata sentinel read from the first IFD.
struct Header {
    width: usize,
    height: usize,
    transform: GeoTransform,
    nodata: Option<f32>,
}

fn read_header<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Header, GridError> {
    match decoder.colortype()? {
        ColorType::Gray(_) => {}
        other => return Err(GridError::Unsupported(format!("expected a single band, found {other:?}"))),
    }

    let (width, height) = decoder.dimensions()?;

    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| GridError::MissingGeoreference("ModelPixelScale"))?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| GridError::MissingGeoreference("ModelTiepoint"))?;
    if scale.len() < 2 || tiepoint.len() < 6 || scale[0] <= 0.0 || scale[1] <= 0.0 {
        return Err(GridError::MissingGeoreference("ModelPixelScale/ModelTiepoint"));
    }

    // Tiepoint maps raster (i, j) to model (x, y).
    let transform = GeoTransform::new(
        tiepoint[3] - tiepoint[0] * scale[0],
        tiepoint[4] + tiepoint[1] * scale[1],
        scale[0],
        scale[1],
    );

    let nodata = match decoder.find_tag(Tag::GdalNodata)? {
        Some(value) => value.into_string()?
            .trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .parse::<f32>()
            .ok(),
        None => None,
    };

    Ok(Header { width: width as usize, height: height as usize, transform, nodata })
}

/// Widen any integer or float sample buffer to `f32`.
fn into_f32(result: DecodingResult) -> Result<Vec<f32>, GridError> {
    Ok(match result {
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        _ => return Err(GridError::Unsupported("64-bit integer samples".into())),
    })
}

fn decoder<R: Read + Seek>(reader: R) -> Result<Decoder<R>, GridError> {
    Ok(Decoder::new(reader)?.with_limits(Limits::unlimited()))
}

/// Decode a whole single-band GeoTIFF.
pub fn read_geotiff<R: Read + Seek>(reader: R) -> Result<Grid, GridError> {
    let mut decoder = decoder(reader)?;
    let header = read_header(&mut decoder)?;
    let data = into_f32(decoder.read_image()?)?;
    Grid::new(header.transform, header.width, header.height, header.nodata, data)
}

/// Decode only the pixels covering `rect`, reading just the strips or tiles
/// that intersect it. Fails with `OutOfBounds` if `rect` misses the raster.
pub fn read_geotiff_window<R: Read + Seek>(reader: R, rect: &Rect<f64>) -> Result<Grid, GridError> {
    let mut decoder = decoder(reader)?;
    let header = read_header(&mut decoder)?;
    let window = header.transform.window_for(rect, header.width, header.height)
        .ok_or(GridError::OutOfBounds)?;

    let (chunk_width, chunk_height) = decoder.chunk_dimensions();
    let (chunk_width, chunk_height) = (chunk_width as usize, chunk_height as usize);
    if chunk_width == 0 || chunk_height == 0 {
        return Err(GridError::Unsupported("zero-sized chunks".into()));
    }
    let chunks_across = header.width.div_ceil(chunk_width);

    let mut grid = Grid::filled(
        header.transform.offset(&window), window.width, window.height,
        header.nodata, header.nodata.unwrap_or(f32::NAN),
    );

    let chunk_rows = window.row_off / chunk_height..=(window.row_off + window.height - 1) / chunk_height;
    let chunk_cols = window.col_off / chunk_width..=(window.col_off + window.width - 1) / chunk_width;

    for chunk_row in chunk_rows {
        for chunk_col in chunk_cols.clone() {
            let index = (chunk_row * chunks_across + chunk_col) as u32;
            let (_, rows_in_chunk) = decoder.chunk_data_dimensions(index);
            let samples = into_f32(decoder.read_chunk(index)?)?;
            let rows_in_chunk = (rows_in_chunk as usize).max(1);
            let stride = samples.len() / rows_in_chunk;

            let top = chunk_row * chunk_height;
            let left = chunk_col * chunk_width;
            copy_overlap(&samples, stride, rows_in_chunk, top, left, &window, &mut grid);
        }
    }

    Ok(grid)
}

/// Copy the part of one decoded chunk that falls inside `window` into `grid`.
fn copy_overlap(samples: &[f32], stride: usize, rows: usize, top: usize, left: usize, window: &Window, grid: &mut Grid) {
    let row_start = top.max(window.row_off);
    let row_end = (top + rows).min(window.row_off + window.height);
    let col_start = left.max(window.col_off);
    let col_end = (left + stride).min(window.col_off + window.width);

    for row in row_start..row_end {
        for col in col_start..col_end {
            let value = samples[(row - top) * stride + (col - left)];
            grid.set(col - window.col_off, row - window.row_off, value);
        }
    }
}

/// Encode the grid as a Float32 GeoTIFF in EPSG:4326.
pub fn write_geotiff<W: Write + Seek>(grid: &Grid, writer: W) -> Result<(), GridError> {
    encode_strips(grid, writer, None)
}

fn encode_strips<W: Write + Seek>(grid: &Grid, writer: W, rows_per_strip: Option<u32>) -> Result<(), GridError> {
    if grid.width() == 0 || grid.height() == 0 {
        return Err(GridError::Shape { len: grid.data().len(), width: grid.width(), height: grid.height() });
    }

    let transform = grid.transform();
    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<colortype::Gray32Float>(grid.width() as u32, grid.height() as u32)?;
    if let Some(rows) = rows_per_strip {
        image.rows_per_strip(rows)?;
    }

    image.encoder().write_tag(Tag::ModelPixelScaleTag, &[transform.cell_width, transform.cell_height, 0.0][..])?;
    image.encoder().write_tag(Tag::ModelTiepointTag, &[0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0][..])?;
    image.encoder().write_tag(Tag::GeoKeyDirectoryTag, &WGS84_GEO_KEYS[..])?;
    if let Some(nodata) = grid.nodata() {
        image.encoder().write_tag(Tag::GdalNodata, nodata.to_string().as_str())?;
    }

    image.write_data(grid.data())?;
    Ok(())
}
