use std::f64::consts::PI;

/// Lowest and highest supported zoom levels
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 18.0;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level, each step doubles the scale
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Pixels spanned by the full 360° of longitude.
    /// Level 2 fits the world once across the canvas.
    fn scale(&self) -> f64 {
        2f64.powf(self.zoom - 2.0) * self.width as f64
    }

    /// Move the center to a coordinate
    pub fn center_on(&mut self, lon: f64, lat: f64) {
        self.center_lon = wrap_lon(lon);
        self.center_lat = lat;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let degrees_per_px = 360.0 / self.scale().max(1.0);
        self.center_lon = wrap_lon(self.center_lon + dx as f64 * degrees_per_px);
        self.center_lat -= dy as f64 * degrees_per_px * 0.5; // Mercator distortion
        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    /// Zoom by `delta` levels while keeping the point under (px, py) fixed
    pub fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.set_zoom(self.zoom + delta);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let (center_x, center_y) = mercator(self.center_lon, self.center_lat);

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;

        let lon = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

        (lon, lat)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = mercator(lon, lat);
        let (center_x, center_y) = mercator(self.center_lon, self.center_lat);
        let scale = self.scale();

        let px = ((x - center_x) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - center_y) * scale + self.height as f64 / 2.0) as i32;

        (px, py)
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= 0 && px < self.width as i32 && py >= 0 && py < self.height as i32
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

/// Web Mercator, normalized to [0, 1] on both axes
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}

fn wrap_lon(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 2.0, 100, 100);
        let (x, y) = vp.project(0.0, 0.0);
        assert_eq!(x, 50);
        assert_eq!(y, 50);
    }

    #[test]
    fn test_center_projects_to_middle() {
        let mut vp = Viewport::new(12.0, 52.0, 4.0, 200, 120);
        vp.center_on(13.405, 52.52);
        assert_eq!(vp.project(13.405, 52.52), (100, 60));
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(15.0, 50.0, 5.0, 400, 200);
        let (px, py) = vp.project(18.0686, 59.3293);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 18.0686).abs() < 0.2);
        assert!((lat - 59.3293).abs() < 0.2);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 2.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = Viewport::new(0.0, 0.0, 4.0, 100, 100);
        vp.set_zoom(40.0);
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.set_zoom(-3.0);
        assert_eq!(vp.zoom, MIN_ZOOM);
    }
}
