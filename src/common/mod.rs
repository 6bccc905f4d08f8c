mod data;
mod fs;
mod geojson;
mod polygon;

pub(crate) use data::*;
pub(crate) use fs::*;
pub(crate) use geojson::*;
pub(crate) use polygon::*;
