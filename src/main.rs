mod app;
mod braille;
mod catalog;
mod config;
mod data;
mod insight;
mod logging;
mod map;
mod search;
mod selection;
mod ui;

use anyhow::Result;
use app::{App, Focus, ViewMode};
use catalog::Catalog;
use config::Config;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use insight::GeminiProvider;
use map::{BrailleMap, MapAdapter};
use ratatui::DefaultTerminal;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    let _guard = logging::init(&config.log_dir)?;

    tracing::info!(model = %config.model, data_dir = %config.data_dir.display(), "starting");
    if config.api_key.is_none() {
        tracing::warn!("no GEMINI_API_KEY set, recommendations will use the fallback advice");
    }

    let catalog = Catalog::load_or_builtin(&config.data_dir);
    let map: MapAdapter<BrailleMap> = MapAdapter::new(data::spawn_base_layer_load(config.data_dir.clone()), config.readiness());
    let provider = Arc::new(GeminiProvider::new(config.api_base.clone(), config.api_key.clone()));
    let mut app = App::new(catalog, map, provider, config.model.clone());

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!(error = %e, "exited with error");
    }
    result
}

/// Handle mouse events for selecting, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel zooms towards the mouse position
        MouseEventKind::ScrollUp => app.zoom_at(mouse.column, mouse.row, 1.0),
        MouseEventKind::ScrollDown => app.zoom_at(mouse.column, mouse.row, -1.0),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.map.pan(-15, 0),
        MouseEventKind::ScrollRight => app.map.pan(15, 0),
        // Click selects a marker, drag pans
        MouseEventKind::Down(MouseButton::Left) => {
            app.click(mouse.column, mouse.row);
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        // Hover shows the marker title in the status bar
        MouseEventKind::Moved => app.hover(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_map_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        KeyCode::Char('/') => app.focus = Focus::Search,
        KeyCode::Char('a') => app.focus = Focus::Age,

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.map.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.map.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.map.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.map.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.map.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.map.zoom_out(),
        KeyCode::Char('r') | KeyCode::Char('0') => app.map.reset_view(),

        // View modes
        KeyCode::Char('1') => app.set_view_mode(ViewMode::Sunshine),
        KeyCode::Char('2') => app.set_view_mode(ViewMode::Dietary),
        KeyCode::Char('3') => app.set_view_mode(ViewMode::Heatmap),

        // Selection
        KeyCode::Char('n') | KeyCode::Tab => app.select_next(),
        KeyCode::Char('p') | KeyCode::BackTab => app.select_prev(),

        // Profile
        KeyCode::Char('x') => app.panel_mut().toggle_sex(),
        KeyCode::Char('[') => app.panel_mut().prev_skin_type(),
        KeyCode::Char(']') => app.panel_mut().next_skin_type(),
        KeyCode::Char('c') | KeyCode::Enter => app.calculate(),

        _ => {}
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.clear_search();
            app.focus = Focus::Map;
        }
        KeyCode::Enter | KeyCode::Tab => app.focus = Focus::Map,
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(ch) => app.push_search_char(ch),
        _ => {}
    }
}

fn handle_age_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => app.focus = Focus::Map,
        KeyCode::Enter => {
            app.calculate();
            app.focus = Focus::Map;
        }
        KeyCode::Backspace => app.panel_mut().pop_age_digit(),
        KeyCode::Char(ch) => app.panel_mut().push_age_digit(ch),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    // Main loop
    loop {
        app.tick(Instant::now());

        // Draw
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match app.focus {
                            Focus::Map => handle_map_key(app, key),
                            Focus::Search => handle_search_key(app, key),
                            Focus::Age => handle_age_key(app, key),
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width, height);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
