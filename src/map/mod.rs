pub mod adapter;
mod braille_map;
mod geometry;
mod projection;
mod renderer;
mod surface;

pub use adapter::{MapAdapter, MapStatus, ReadinessPolicy};
pub use braille_map::{BrailleMap, MapFrame};
pub use renderer::{BaseLayers, Lod};
pub use surface::MapSurface;
#[cfg(test)]
pub(crate) use surface::MarkerSpec;
