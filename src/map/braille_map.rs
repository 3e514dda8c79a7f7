use crate::braille::BrailleCanvas;
use crate::map::geometry::draw_circle;
use crate::map::projection::Viewport;
use crate::map::renderer::{BaseFrame, BaseLayers, Lod};
use crate::map::surface::{MapOptions, MapSurface, MarkerId, MarkerSpec};
use std::collections::BTreeMap;

/// A marker resolved to terminal cells for the current viewport
#[derive(Clone, Debug)]
pub struct PlacedMarker {
    pub id: MarkerId,
    pub col: u16,
    pub row: u16,
    pub text: String,
    pub color: (u8, u8, u8),
    pub emphasized: bool,
}

impl PlacedMarker {
    fn covers(&self, col: u16, row: u16) -> bool {
        let width = self.text.chars().count() as u16;
        row == self.row && col >= self.col && col < self.col.saturating_add(width)
    }
}

/// Everything the UI needs to draw one frame of the map
pub struct MapFrame {
    pub base: BaseFrame,
    /// Dots around the emphasized marker
    pub halo: BrailleCanvas,
    /// Markers in draw order (lowest z-index first)
    pub markers: Vec<PlacedMarker>,
}

/// Terminal map drawn with braille dots, markers overlaid as text
pub struct BrailleMap {
    layers: BaseLayers,
    viewport: Viewport,
    cols: u16,
    rows: u16,
    markers: BTreeMap<MarkerId, MarkerSpec>,
    next_id: u64,
}

impl BrailleMap {
    pub fn lod(&self) -> Lod {
        Lod::from_zoom(self.viewport.zoom)
    }

    #[cfg(test)]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Markers projected into cell coordinates, in draw order
    pub fn placed_markers(&self) -> Vec<PlacedMarker> {
        let mut ordered: Vec<(&MarkerId, &MarkerSpec)> = self.markers.iter().collect();
        // Stable sort keeps insertion order between equal z-indexes
        ordered.sort_by_key(|(_, spec)| spec.z_index);

        ordered
            .into_iter()
            .filter_map(|(id, spec)| {
                let (px, py) = self.viewport.project(spec.lng, spec.lat);
                if !self.viewport.is_visible(px, py) {
                    return None;
                }

                let text = if spec.emphasized {
                    format!("[ {} ]", spec.label)
                } else {
                    format!("({})", spec.label)
                };
                let width = text.chars().count() as i32;
                let col = (px / 2 - width / 2).max(0) as u16;
                let row = (py / 4) as u16;

                Some(PlacedMarker {
                    id: *id,
                    col,
                    row,
                    text,
                    color: spec.color,
                    emphasized: spec.emphasized,
                })
            })
            .collect()
    }

    /// Rasterize the current view
    pub fn render(&self) -> MapFrame {
        let width = self.cols as usize;
        let height = self.rows as usize;

        let mut halo = BrailleCanvas::new(width, height);
        for spec in self.markers.values().filter(|spec| spec.emphasized) {
            let (px, py) = self.viewport.project(spec.lng, spec.lat);
            draw_circle(&mut halo, px, py, 5);
        }

        MapFrame {
            base: self.layers.render(width, height, &self.viewport),
            halo,
            markers: self.placed_markers(),
        }
    }
}

impl MapSurface for BrailleMap {
    fn construct(layers: BaseLayers, options: &MapOptions) -> Self {
        Self {
            layers,
            viewport: Viewport::new(options.center_lng, options.center_lat, options.zoom, 0, 0),
            cols: 0,
            rows: 0,
            markers: BTreeMap::new(),
            next_id: 0,
        }
    }

    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.markers.insert(id, spec);
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    fn pan_to(&mut self, lat: f64, lng: f64) {
        self.viewport.center_on(lng, lat);
    }

    fn pan_by(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    fn center(&self) -> (f64, f64) {
        (self.viewport.center_lat, self.viewport.center_lon)
    }

    fn zoom(&self) -> f64 {
        self.viewport.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.viewport.set_zoom(zoom);
    }

    fn zoom_at(&mut self, col: u16, row: u16, delta: f64) {
        // Each cell is 2 braille pixels wide, 4 tall
        self.viewport.zoom_at(col as i32 * 2, row as i32 * 4, delta);
    }

    fn marker_at(&self, col: u16, row: u16) -> Option<MarkerId> {
        self.placed_markers()
            .iter()
            .rev()
            .find(|marker| marker.covers(col, row))
            .map(|marker| marker.id)
    }

    fn marker_title(&self, id: MarkerId) -> Option<&str> {
        self.markers.get(&id).map(|spec| spec.title.as_str())
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.viewport.width = cols as usize * 2;
        self.viewport.height = rows as usize * 4;
    }
}
