use crate::catalog::{Catalog, CountryRecord};
use crate::insight::{self, InsightOutcome, InsightProvider, ProfilePanel, UserProfile};
use crate::map::{BrailleMap, MapAdapter, MapSurface};
use crate::search::{filter, SearchInput};
use crate::selection::Selection;
use crate::ui;
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Which control receives typed characters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Map,
    Search,
    Age,
}

/// Map display layer. Only changes which selector is highlighted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Sunshine,
    Dietary,
    Heatmap,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Sunshine, ViewMode::Dietary, ViewMode::Heatmap];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Sunshine => "Sunshine Duration",
            ViewMode::Dietary => "Dietary Patterns",
            ViewMode::Heatmap => "Deficiency Heatmap",
        }
    }
}

/// Results delivered from background tasks
#[derive(Debug)]
pub enum AppEvent {
    Insight(InsightOutcome),
}

/// Application state and the controller that owns every transition
pub struct App<S: MapSurface = BrailleMap> {
    catalog: Catalog,
    search: SearchInput,
    selection: Selection,
    pub map: MapAdapter<S>,
    panel: ProfilePanel,
    /// Profile used by the last applied calculation
    last_profile: Option<UserProfile>,
    view_mode: ViewMode,
    pub focus: Focus,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Map cell under the pointer
    hover: Option<(u16, u16)>,
    /// Terminal size in cells
    size: (u16, u16),
    provider: Arc<dyn InsightProvider>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl<S: MapSurface> App<S> {
    pub fn new(catalog: Catalog, map: MapAdapter<S>, provider: Arc<dyn InsightProvider>, model: String) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let selection = Selection::new(catalog.first());

        Self {
            catalog,
            search: SearchInput::default(),
            selection,
            map,
            panel: ProfilePanel::new(model),
            last_profile: None,
            view_mode: ViewMode::default(),
            focus: Focus::Map,
            should_quit: false,
            last_mouse: None,
            hover: None,
            size: (0, 0),
            provider,
            events_tx,
            events_rx,
        }
    }

    #[cfg(test)]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn query(&self) -> &str {
        self.search.query()
    }

    /// Countries matching the current query, recomputed on every call
    pub fn filtered(&self) -> Vec<&CountryRecord> {
        filter(&self.catalog, self.search.query())
    }

    pub fn no_results(&self) -> bool {
        self.filtered().is_empty()
    }

    pub fn active(&self) -> &CountryRecord {
        self.selection.active()
    }

    pub fn panel(&self) -> &ProfilePanel {
        &self.panel
    }

    pub fn last_profile(&self) -> Option<&UserProfile> {
        self.last_profile.as_ref()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // --- search ---

    pub fn push_search_char(&mut self, ch: char) {
        self.search.push(ch);
        self.query_changed();
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
        self.query_changed();
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.query_changed();
    }

    #[cfg(test)]
    pub fn set_query(&mut self, query: &str) {
        self.search.set(query);
        self.query_changed();
    }

    /// Auto-select a unique match, then redraw markers for the new visible set
    fn query_changed(&mut self) {
        let filtered = filter(&self.catalog, self.search.query());
        tracing::debug!(query = self.search.query(), matches = filtered.len(), "search updated");

        if self.selection.resolve(self.search.query(), &filtered) {
            self.selection_changed();
        } else {
            self.map.sync_markers(&filtered, &self.selection.active().id);
        }
    }

    // --- selection ---

    /// Make a country active by id and center on it; unknown ids are ignored
    pub fn select(&mut self, id: &str) {
        let Some(country) = self.catalog.get(id) else {
            return;
        };
        if self.selection.select(country) {
            self.selection_changed();
        } else {
            self.map.focus(country);
        }
    }

    pub fn select_next(&mut self) {
        let filtered = filter(&self.catalog, self.search.query());
        if self.selection.select_next(&filtered) {
            self.selection_changed();
        }
    }

    pub fn select_prev(&mut self) {
        let filtered = filter(&self.catalog, self.search.query());
        if self.selection.select_prev(&filtered) {
            self.selection_changed();
        }
    }

    fn selection_changed(&mut self) {
        let active = self.selection.active();
        tracing::info!(country = %active.id, "selection changed");

        self.panel.country_changed();
        self.map.focus(active);
        self.refresh_markers();
    }

    fn refresh_markers(&mut self) {
        let filtered = filter(&self.catalog, self.search.query());
        self.map.sync_markers(&filtered, &self.selection.active().id);
    }

    // --- map ---

    /// Advance time-driven work: map readiness and background results
    pub fn tick(&mut self, now: Instant) {
        if self.map.poll(now) {
            self.map.focus(self.selection.active());
            self.refresh_markers();
        }
        self.drain_events();
    }

    /// Left click at a terminal cell; selects the country under it, if any
    pub fn click(&mut self, col: u16, row: u16) {
        let Some((map_col, map_row)) = self.map_cell(col, row) else {
            return;
        };
        if let Some(id) = self.map.click(map_col, map_row).map(str::to_string) {
            self.select(&id);
        }
    }

    /// Zoom one level around a terminal cell (mouse wheel)
    pub fn zoom_at(&mut self, col: u16, row: u16, delta: f64) {
        if let Some((map_col, map_row)) = self.map_cell(col, row) {
            self.map.zoom_at(map_col, map_row, delta);
        }
    }

    /// Pan by drag distance; less sensitive when zoomed out
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = (last_col as i32 - col as i32) * 2;
            let dy = (last_row as i32 - row as i32) * 4;
            self.map.pan(dx, dy);
        }
        self.last_mouse = Some((col, row));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Pointer moved to a terminal cell
    pub fn hover(&mut self, col: u16, row: u16) {
        self.hover = self.map_cell(col, row);
    }

    /// Title of the marker under the pointer
    pub fn hovered_title(&self) -> Option<&str> {
        let (col, row) = self.hover?;
        self.map.title_at(col, row)
    }

    /// Translate a terminal cell into the map's own cell coordinates
    fn map_cell(&self, col: u16, row: u16) -> Option<(u16, u16)> {
        let inner = self.map_area();
        let inside = col >= inner.x && col < inner.x + inner.width && row >= inner.y && row < inner.y + inner.height;
        inside.then(|| (col - inner.x, row - inner.y))
    }

    fn map_area(&self) -> Rect {
        ui::layout(Rect::new(0, 0, self.size.0, self.size.1)).map_inner
    }

    /// Terminal resized
    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        let inner = self.map_area();
        self.map.resize(inner.width, inner.height);
    }

    // --- profile ---

    pub fn panel_mut(&mut self) -> &mut ProfilePanel {
        &mut self.panel
    }

    /// Request a recommendation for the active country. Ignored while disabled.
    pub fn calculate(&mut self) {
        let Some(request) = self.panel.begin(self.selection.active()) else {
            return;
        };

        let provider = Arc::clone(&self.provider);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = insight::resolve(provider.as_ref(), request).await;
            // Receiver is gone only when the app is shutting down
            let _ = tx.send(AppEvent::Insight(outcome));
        });
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::Insight(outcome) => {
                    if let Some(profile) = self.panel.complete(outcome) {
                        self.last_profile = Some(profile);
                    }
                }
            }
        }
    }
}
