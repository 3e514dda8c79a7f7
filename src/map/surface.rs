//! Narrow interface to the interactive map widget.
//!
//! The adapter only ever talks to a map through [`MapSurface`], so the
//! Braille terminal map and the recording double used in tests are
//! interchangeable.

use crate::map::BaseLayers;

/// Handle to a placed marker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Everything needed to draw one marker
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerSpec {
    pub lat: f64,
    pub lng: f64,
    /// Short text drawn on the marker
    pub label: String,
    /// Hover/accessibility title
    pub title: String,
    /// Fill color as RGB
    pub color: (u8, u8, u8),
    /// Drawn larger than the others
    pub emphasized: bool,
    /// Higher values draw on top
    pub z_index: i32,
}

/// Options the map is constructed with
#[derive(Clone, Debug, PartialEq)]
pub struct MapOptions {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center_lat: 52.0,
            center_lng: 12.0,
            zoom: 4.0,
        }
    }
}

pub trait MapSurface {
    /// Build the map once its base data is available
    fn construct(layers: BaseLayers, options: &MapOptions) -> Self
    where
        Self: Sized;

    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId;

    fn remove_marker(&mut self, id: MarkerId);

    /// Center the viewport on a coordinate
    fn pan_to(&mut self, lat: f64, lng: f64);

    /// Shift the viewport by a pixel delta (manual panning)
    fn pan_by(&mut self, dx: i32, dy: i32);

    /// Current viewport center as (lat, lng)
    fn center(&self) -> (f64, f64);

    fn zoom(&self) -> f64;

    fn set_zoom(&mut self, zoom: f64);

    /// Zoom by `delta` levels around a cell of the map area
    fn zoom_at(&mut self, col: u16, row: u16, delta: f64);

    /// Topmost marker drawn at a cell of the map area
    fn marker_at(&self, col: u16, row: u16) -> Option<MarkerId>;

    /// Hover title of a placed marker
    fn marker_title(&self, id: MarkerId) -> Option<&str>;

    /// Map area size in terminal cells
    fn resize(&mut self, cols: u16, rows: u16);
}
