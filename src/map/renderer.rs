use crate::braille::BrailleCanvas;
use crate::map::geometry::draw_line;
use crate::map::projection::Viewport;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for base map geometry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - continental
    Medium, // 50m - country
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD based on zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 4.0 {
            Lod::Low
        } else if zoom < 7.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// Rasterized base map, one canvas per stroke color
pub struct BaseFrame {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
}

/// Coastline and border geometry at several resolutions
#[derive(Default)]
pub struct BaseLayers {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders_medium: Vec<LineString>,
    borders_high: Vec<LineString>,
}

impl BaseLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coastlines for the LOD, falling back to coarser data
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_high],
            Lod::Low => [&self.coastlines_low, &self.coastlines_medium, &self.coastlines_high],
        };
        candidates
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        if lod == Lod::High && !self.borders_high.is_empty() {
            &self.borders_high
        } else {
            &self.borders_medium
        }
    }

    /// Rasterize coastlines and borders for a viewport of `width` x `height` characters
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport) -> BaseFrame {
        let lod = Lod::from_zoom(viewport.zoom);
        let mut frame = BaseFrame {
            coastlines: BrailleCanvas::new(width, height),
            borders: BrailleCanvas::new(width, height),
        };

        for line in self.coastlines(lod) {
            draw_linestring(&mut frame.coastlines, line, viewport);
        }
        for line in self.borders(lod) {
            draw_linestring(&mut frame.borders, line, viewport);
        }

        frame
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            // No 110m borders are shipped, coarse data shares the medium slot
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    /// Merge another set of layers into this one
    pub fn extend(&mut self, other: BaseLayers) {
        self.coastlines_low.extend(other.coastlines_low);
        self.coastlines_medium.extend(other.coastlines_medium);
        self.coastlines_high.extend(other.coastlines_high);
        self.borders_medium.extend(other.borders_medium);
        self.borders_high.extend(other.borders_high);
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            // Skip segments that wrap across the antimeridian
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lod_fallback() {
        let mut layers = BaseLayers::new();
        layers.add_coastline(vec![(0.0, 0.0), (1.0, 1.0)], Lod::Low);
        assert_eq!(layers.coastlines(Lod::High).len(), 1);
        assert!(layers.has_data());
    }

    #[test]
    fn test_medium_falls_back_to_high_detail() {
        let mut layers = BaseLayers::new();
        layers.add_coastline(vec![(0.0, 0.0), (1.0, 1.0)], Lod::High);
        assert_eq!(layers.coastlines(Lod::Medium).len(), 1);
        assert_eq!(layers.coastlines(Lod::Low).len(), 1);
    }

    #[test]
    fn test_render_draws_visible_line() {
        let mut layers = BaseLayers::new();
        layers.add_coastline(vec![(5.0, 50.0), (25.0, 50.0)], Lod::Low);
        let viewport = Viewport::new(15.0, 50.0, 3.0, 40, 40);
        let frame = layers.render(20, 10, &viewport);
        assert!(frame.coastlines.rows().any(|row| row.chars().any(|c| c != crate::braille::BLANK)));
        assert!(frame.borders.rows().all(|row| row.chars().all(|c| c == crate::braille::BLANK)));
    }
}
