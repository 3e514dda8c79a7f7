use crate::catalog::CountryRecord;
use crate::map::surface::{MapOptions, MapSurface, MarkerId, MarkerSpec};
use crate::map::BaseLayers;
use std::time::{Duration, Instant};
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Where the adapter returns the viewport on "reset view"
pub const RESET_CENTER: (f64, f64) = (50.0, 15.0);

const SELECTED_Z_INDEX: i32 = 1000;
const DEFAULT_Z_INDEX: i32 = 1;

/// Lifecycle of the underlying map
#[derive(Clone, Debug, PartialEq)]
pub enum MapStatus {
    Loading { attempts: u32 },
    Ready,
    Failed(String),
}

/// Bounded polling for the map's base data
#[derive(Clone, Copy, Debug)]
pub struct ReadinessPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_attempts: 60,
        }
    }
}

/// Binds the visible countries and the active one to a map surface.
///
/// The surface is built once, when its base data arrives, and is never rebuilt.
/// Markers are cleared and recreated on every sync.
pub struct MapAdapter<S: MapSurface> {
    surface: Option<S>,
    pending: Option<oneshot::Receiver<BaseLayers>>,
    status: MapStatus,
    policy: ReadinessPolicy,
    options: MapOptions,
    last_poll: Option<Instant>,
    /// Placed markers and the country each one stands for
    markers: Vec<(MarkerId, String)>,
    size: (u16, u16),
}

impl<S: MapSurface> MapAdapter<S> {
    pub fn new(pending: oneshot::Receiver<BaseLayers>, policy: ReadinessPolicy) -> Self {
        Self {
            surface: None,
            pending: Some(pending),
            status: MapStatus::Loading { attempts: 0 },
            policy,
            options: MapOptions::default(),
            last_poll: None,
            markers: Vec::new(),
            size: (0, 0),
        }
    }

    pub fn status(&self) -> &MapStatus {
        &self.status
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Check for base data at most once per poll interval.
    /// Returns true on the call that constructs the surface.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !matches!(self.status, MapStatus::Loading { .. }) {
            return false;
        }
        if let Some(last) = self.last_poll {
            if now.duration_since(last) < self.policy.interval {
                return false;
            }
        }
        self.last_poll = Some(now);

        let Some(pending) = self.pending.as_mut() else {
            return false;
        };

        match pending.try_recv() {
            Ok(layers) => {
                self.pending = None;
                let mut surface = S::construct(layers, &self.options);
                surface.resize(self.size.0, self.size.1);
                self.surface = Some(surface);
                self.status = MapStatus::Ready;
                tracing::info!("map surface ready");
                true
            }
            Err(TryRecvError::Empty) => {
                let attempts = match self.status {
                    MapStatus::Loading { attempts } => attempts + 1,
                    _ => 1,
                };
                if attempts >= self.policy.max_attempts {
                    self.fail(format!("map data not ready after {attempts} attempts"));
                } else {
                    self.status = MapStatus::Loading { attempts };
                }
                false
            }
            Err(TryRecvError::Closed) => {
                self.fail("map data loader stopped before finishing".to_string());
                false
            }
        }
    }

    fn fail(&mut self, reason: String) {
        tracing::error!(%reason, "map initialization failed");
        self.pending = None;
        self.status = MapStatus::Failed(reason);
    }

    /// Replace every marker with one per visible country
    pub fn sync_markers(&mut self, visible: &[&CountryRecord], active_id: &str) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        for (id, _) in self.markers.drain(..) {
            surface.remove_marker(id);
        }

        for country in visible {
            let id = surface.add_marker(marker_spec(country, country.id == active_id));
            self.markers.push((id, country.id.clone()));
        }
    }

    /// Center the map on a country
    pub fn focus(&mut self, country: &CountryRecord) {
        if let Some(surface) = self.surface.as_mut() {
            surface.pan_to(country.lat, country.lng);
        }
    }

    /// Country id behind the marker at a map cell, if any
    pub fn click(&self, col: u16, row: u16) -> Option<&str> {
        let surface = self.surface.as_ref()?;
        let hit = surface.marker_at(col, row)?;
        self.markers
            .iter()
            .find(|(id, _)| *id == hit)
            .map(|(_, country_id)| country_id.as_str())
    }

    /// Hover title of the marker at a map cell, if any
    pub fn title_at(&self, col: u16, row: u16) -> Option<&str> {
        let surface = self.surface.as_ref()?;
        surface.marker_title(surface.marker_at(col, row)?)
    }

    pub fn zoom_in(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            let zoom = surface.zoom();
            surface.set_zoom(zoom + 1.0);
        }
    }

    pub fn zoom_out(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            let zoom = surface.zoom();
            surface.set_zoom(zoom - 1.0);
        }
    }

    pub fn zoom_at(&mut self, col: u16, row: u16, delta: f64) {
        if let Some(surface) = self.surface.as_mut() {
            surface.zoom_at(col, row, delta);
        }
    }

    pub fn reset_view(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.pan_to(RESET_CENTER.0, RESET_CENTER.1);
        }
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        if let Some(surface) = self.surface.as_mut() {
            surface.pan_by(dx, dy);
        }
    }

    /// Map area size in cells; remembered until the surface exists
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.size = (cols, rows);
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(cols, rows);
        }
    }
}

/// Marker appearance for a country
pub fn marker_spec(country: &CountryRecord, selected: bool) -> MarkerSpec {
    MarkerSpec {
        lat: country.lat,
        lng: country.lng,
        label: country.uv_index.code().to_string(),
        title: format!("{} - UV Index: {}", country.name, country.uv_index),
        color: country.risk_level.color(),
        emphasized: selected,
        z_index: if selected { SELECTED_Z_INDEX } else { DEFAULT_Z_INDEX },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::search::filter;
    use std::collections::BTreeMap;

    /// Map double that records every call
    #[derive(Default)]
    pub struct RecordingSurface {
        pub constructed_with: Option<MapOptions>,
        pub markers: BTreeMap<MarkerId, MarkerSpec>,
        pub removed: Vec<MarkerId>,
        pub center: (f64, f64),
        pub zoom: f64,
        pub size: (u16, u16),
        pub pans: Vec<(i32, i32)>,
        next_id: u64,
    }

    impl MapSurface for RecordingSurface {
        fn construct(_layers: BaseLayers, options: &MapOptions) -> Self {
            Self {
                constructed_with: Some(options.clone()),
                center: (options.center_lat, options.center_lng),
                zoom: options.zoom,
                ..Self::default()
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
            self.removed.push(id);
        }

        fn pan_to(&mut self, lat: f64, lng: f64) {
            self.center = (lat, lng);
        }

        fn pan_by(&mut self, dx: i32, dy: i32) {
            self.pans.push((dx, dy));
        }

        fn center(&self) -> (f64, f64) {
            self.center
        }

        fn zoom(&self) -> f64 {
            self.zoom
        }

        fn set_zoom(&mut self, zoom: f64) {
            self.zoom = zoom;
        }

        fn zoom_at(&mut self, _col: u16, _row: u16, delta: f64) {
            self.zoom += delta;
        }

        /// Markers are addressed by id: column = marker id, row 0
        fn marker_at(&self, col: u16, row: u16) -> Option<MarkerId> {
            let id = MarkerId(col as u64);
            (row == 0 && self.markers.contains_key(&id)).then_some(id)
        }

        fn marker_title(&self, id: MarkerId) -> Option<&str> {
            self.markers.get(&id).map(|spec| spec.title.as_str())
        }

        fn resize(&mut self, cols: u16, rows: u16) {
            self.size = (cols, rows);
        }
    }

    /// Adapter whose base data is already available
    pub fn ready_adapter() -> MapAdapter<RecordingSurface> {
        let (tx, rx) = oneshot::channel();
        tx.send(BaseLayers::new()).ok();
        let mut adapter = MapAdapter::new(rx, ReadinessPolicy::default());
        assert!(adapter.poll(Instant::now()));
        adapter
    }

    #[test]
    fn test_constructed_once() {
        let mut adapter = ready_adapter();
        assert_eq!(adapter.status(), &MapStatus::Ready);
        let options = adapter.surface().unwrap().constructed_with.clone();
        assert_eq!(options, Some(MapOptions::default()));

        let later = Instant::now() + Duration::from_secs(5);
        assert!(!adapter.poll(later));
    }

    #[test]
    fn test_polling_is_bounded() {
        let (_tx, rx) = oneshot::channel::<BaseLayers>();
        let policy = ReadinessPolicy {
            interval: Duration::from_millis(10),
            max_attempts: 3,
        };
        let mut adapter: MapAdapter<RecordingSurface> = MapAdapter::new(rx, policy);
        let start = Instant::now();

        adapter.poll(start);
        // Within the interval: not counted
        adapter.poll(start + Duration::from_millis(5));
        assert_eq!(adapter.status(), &MapStatus::Loading { attempts: 1 });

        adapter.poll(start + Duration::from_millis(20));
        adapter.poll(start + Duration::from_millis(40));
        assert!(matches!(adapter.status(), MapStatus::Failed(_)));
        assert!(adapter.surface().is_none());
    }

    #[test]
    fn test_loader_dropped_fails() {
        let (tx, rx) = oneshot::channel::<BaseLayers>();
        drop(tx);
        let mut adapter: MapAdapter<RecordingSurface> = MapAdapter::new(rx, ReadinessPolicy::default());
        adapter.poll(Instant::now());
        assert!(matches!(adapter.status(), MapStatus::Failed(_)));
    }

    #[test]
    fn test_operations_before_ready_are_noops() {
        let (_tx, rx) = oneshot::channel::<BaseLayers>();
        let mut adapter: MapAdapter<RecordingSurface> = MapAdapter::new(rx, ReadinessPolicy::default());
        let catalog = Catalog::europe();
        adapter.sync_markers(&filter(&catalog, ""), "sweden");
        adapter.zoom_in();
        adapter.focus(catalog.first());
        assert!(adapter.click(0, 0).is_none());
        assert!(adapter.surface().is_none());
    }

    #[test]
    fn test_resize_applied_on_construction() {
        let (tx, rx) = oneshot::channel();
        let mut adapter: MapAdapter<RecordingSurface> = MapAdapter::new(rx, ReadinessPolicy::default());
        adapter.resize(100, 40);
        tx.send(BaseLayers::new()).ok();
        adapter.poll(Instant::now());
        assert_eq!(adapter.surface().unwrap().size, (100, 40));
    }

    #[test]
    fn test_sync_clears_and_rebuilds() {
        let mut adapter = ready_adapter();
        let catalog = Catalog::europe();

        adapter.sync_markers(&filter(&catalog, ""), "sweden");
        assert_eq!(adapter.surface().unwrap().markers.len(), 7);

        adapter.sync_markers(&filter(&catalog, "an"), "germany");
        let surface = adapter.surface().unwrap();
        assert_eq!(surface.removed.len(), 7);
        assert_eq!(surface.markers.len(), 2);
    }

    #[test]
    fn test_selected_marker_emphasized() {
        let mut adapter = ready_adapter();
        let catalog = Catalog::europe();
        adapter.sync_markers(&filter(&catalog, ""), "norway");

        let surface = adapter.surface().unwrap();
        let emphasized: Vec<&MarkerSpec> = surface.markers.values().filter(|m| m.emphasized).collect();
        assert_eq!(emphasized.len(), 1);
        assert_eq!(emphasized[0].label, "EL");
        assert_eq!(emphasized[0].z_index, 1000);
        assert!(surface.markers.values().filter(|m| !m.emphasized).all(|m| m.z_index == 1));
    }

    #[test]
    fn test_click_maps_to_country() {
        let mut adapter = ready_adapter();
        let catalog = Catalog::europe();
        adapter.sync_markers(&filter(&catalog, ""), "sweden");

        // Second marker placed in this sync, ids start after none removed
        let ids: Vec<MarkerId> = adapter.surface().unwrap().markers.keys().copied().collect();
        assert_eq!(adapter.click(ids[1].0 as u16, 0), Some("germany"));
        assert_eq!(adapter.click(500, 0), None);
    }

    #[test]
    fn test_title_at_marker_cell() {
        let mut adapter = ready_adapter();
        let catalog = Catalog::europe();
        adapter.sync_markers(&filter(&catalog, "spa"), "spain");

        let id = *adapter.surface().unwrap().markers.keys().next().unwrap();
        assert_eq!(adapter.title_at(id.0 as u16, 0), Some("Spain - UV Index: High"));
        assert_eq!(adapter.title_at(id.0 as u16, 3), None);
    }

    #[test]
    fn test_focus_and_reset() {
        let mut adapter = ready_adapter();
        let catalog = Catalog::europe();
        for country in catalog.countries() {
            adapter.focus(country);
            assert_eq!(adapter.surface().unwrap().center(), (country.lat, country.lng));
        }

        adapter.reset_view();
        assert_eq!(adapter.surface().unwrap().center(), RESET_CENTER);
    }

    #[test]
    fn test_zoom_steps() {
        let mut adapter = ready_adapter();
        adapter.zoom_in();
        adapter.zoom_in();
        adapter.zoom_out();
        assert_eq!(adapter.surface().unwrap().zoom(), 5.0);
    }

    #[test]
    fn test_marker_spec_colors() {
        let catalog = Catalog::europe();
        let germany = marker_spec(catalog.get("germany").unwrap(), true);
        assert_eq!(germany.color, (0xf5, 0x9e, 0x0b));
        assert_eq!(germany.label, "L");
        assert_eq!(germany.title, "Germany - UV Index: Low");

        let spain = marker_spec(catalog.get("spain").unwrap(), false);
        assert_eq!(spain.color, (0x10, 0xb9, 0x81));
        let uk = marker_spec(catalog.get("uk").unwrap(), false);
        assert_eq!(uk.color, (0xef, 0x44, 0x44));
    }
}
