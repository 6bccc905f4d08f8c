pub mod error;
pub mod grid;
pub mod io;
pub mod scan;
pub mod transform;

pub use error::GridError;
pub use grid::{Grid, ZonalSum};
pub use io::{read_geotiff, read_geotiff_window, write_geotiff};
pub use transform::{GeoTransform, Window};
