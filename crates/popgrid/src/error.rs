use thiserror::Error;

/// Errors raised while decoding, encoding or slicing a grid.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("tiff: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The file carries no usable georeferencing for the named tag.
    #[error("missing or malformed georeferencing tag: {0}")]
    MissingGeoreference(&'static str),

    /// Multi-band rasters, rotated transforms or exotic sample types.
    #[error("unsupported raster layout: {0}")]
    Unsupported(String),

    /// The requested window lies entirely outside the raster.
    #[error("requested window does not intersect the raster")]
    OutOfBounds,

    #[error("data length {len} does not match a {width}x{height} grid")]
    Shape { len: usize, width: usize, height: usize },
}
