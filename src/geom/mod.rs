mod area;
mod simplify;

pub use area::area_km2;
pub use simplify::{InvalidReason, SimplifyOutcome, SimplifyPolicy};
