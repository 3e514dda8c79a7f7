use crate::app::{App, Focus, ViewMode};
use crate::braille::{BrailleCanvas, BLANK};
use crate::catalog::{CountryRecord, RiskLevel};
use crate::insight::{ProfilePanel, Sex, SkinType, UserProfile};
use crate::map::{MapFrame, MapStatus, MapSurface};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 42;

/// Screen regions. Shared by rendering and mouse hit-testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Screen {
    pub header: Rect,
    pub map: Rect,
    /// Map area inside its border
    pub map_inner: Rect,
    pub sidebar: Rect,
    pub status: Rect,
}

pub fn layout(area: Rect) -> Screen {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title + search
            Constraint::Min(3),    // Map + sidebar
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(SIDEBAR_WIDTH)])
        .split(rows[1]);

    Screen {
        header: rows[0],
        map: body[0],
        map_inner: map_block().inner(body[0]),
        sidebar: body[1],
        status: rows[2],
    }
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Europe ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(legend())
}

/// Risk color key, drawn on the map border
fn legend() -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for risk in [RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High] {
        spans.push(Span::styled("● ", Style::default().fg(risk_color(risk))));
        spans.push(Span::styled(format!("{} Risk  ", risk.label()), Style::default().fg(Color::Gray)));
    }
    Line::from(spans)
}

fn risk_color(risk: RiskLevel) -> Color {
    let (r, g, b) = risk.color();
    Color::Rgb(r, g, b)
}

fn label_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let screen = layout(frame.area());

    render_header(frame, app, screen.header);
    render_map(frame, app, screen.map, screen.map_inner);
    render_sidebar(frame, app, screen.sidebar);
    render_status_bar(frame, app, screen.status);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Search;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Yellow } else { Color::DarkGray }))
        .title(Span::styled(
            " Interactive Vitamin Map | Europe Region ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let mut spans = vec![Span::styled(" Search: ", label_style())];
    if app.query().is_empty() && !focused {
        spans.push(Span::styled("country name... (press /)", label_style()));
    } else {
        spans.push(Span::styled(app.query().to_string(), Style::default().fg(Color::White)));
    }
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect, inner: Rect) {
    frame.render_widget(map_block(), area);

    match app.map.surface() {
        Some(map) => frame.render_widget(MapWidget { frame: map.render() }, inner),
        None => {
            let message = match app.map.status() {
                MapStatus::Loading { attempts } => {
                    vec![
                        Line::styled("Initializing Map Engine...", Style::default().fg(Color::Cyan)),
                        Line::styled(format!("waiting for map data ({attempts})"), label_style()),
                    ]
                }
                MapStatus::Failed(reason) => vec![
                    Line::styled("Map unavailable", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                    Line::styled(reason.clone(), label_style()),
                ],
                MapStatus::Ready => Vec::new(),
            };
            render_overlay(frame, inner, message, None);
        }
    }

    if app.no_results() {
        let message = vec![
            Line::styled("No results found", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            Line::from(""),
            Line::styled(
                format!(
                    "We couldn't find any Vitamin D data for \"{}\". Try another European region.",
                    app.query()
                ),
                label_style(),
            ),
        ];
        render_overlay(frame, inner, message, Some(Color::DarkGray));
    }
}

/// Centered message box over the map
fn render_overlay(frame: &mut Frame, area: Rect, lines: Vec<Line>, border: Option<Color>) {
    let width = area.width.min(48);
    let height = (lines.len() as u16 + 4).min(area.height);
    let rect = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    let mut block = Block::default();
    if let Some(color) = border {
        block = block.borders(Borders::ALL).border_style(Style::default().fg(color));
    }

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block),
        rect,
    );
}

/// Custom widget that renders braille map with country markers overlaid
struct MapWidget {
    frame: MapFrame,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                if ch == BLANK {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        Self::render_layer(&self.frame.base.coastlines, Color::Cyan, area, buf);
        Self::render_layer(&self.frame.base.borders, Color::DarkGray, area, buf);
        Self::render_layer(&self.frame.halo, Color::White, area, buf);

        for marker in &self.frame.markers {
            if marker.row >= area.height {
                continue;
            }
            let (r, g, b) = marker.color;
            let mut style = Style::default().fg(Color::Black).bg(Color::Rgb(r, g, b));
            if marker.emphasized {
                style = style.fg(Color::White).add_modifier(Modifier::BOLD);
            }

            let y = area.y + marker.row;
            for (i, ch) in marker.text.chars().enumerate() {
                let col = marker.col + i as u16;
                if col >= area.width {
                    break;
                }
                buf[(area.x + col, y)].set_char(ch).set_style(style);
            }
        }
    }
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Current selection
            Constraint::Length(5), // View modes
            Constraint::Length(6), // Profile form
            Constraint::Min(0),    // Insight card
        ])
        .split(area);

    if !app.no_results() {
        render_details(frame, app.active(), chunks[0]);
    }
    render_view_modes(frame, app.view_mode(), chunks[1]);
    render_profile(frame, app.panel(), app.focus == Focus::Age, chunks[2]);
    if let Some(insight) = app.panel().insight() {
        render_insight(frame, insight, app.last_profile(), &app.active().name, chunks[3]);
    }
}

fn sidebar_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(format!(" {title} "), Style::default().fg(Color::Cyan)))
}

fn render_details(frame: &mut Frame, country: &CountryRecord, area: Rect) {
    let risk = risk_color(country.risk_level);
    let lines = vec![
        Line::from(vec![
            Span::styled(country.name.clone(), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!(" {} Risk ", country.risk_level.label()),
                Style::default().fg(Color::Black).bg(risk),
            ),
        ]),
        Line::from(vec![
            Span::styled("UV Index: ", label_style()),
            Span::raw(country.uv_index.label().to_string()),
            Span::styled("  Score: ", label_style()),
            Span::styled(format!("{}/100", country.risk_score), Style::default().fg(risk)),
        ]),
        Line::from(vec![
            Span::styled("Omega-3:  ", label_style()),
            Span::raw(country.omega3.label().to_string()),
        ]),
        Line::styled("Recommended", label_style()),
        Line::from(vec![
            Span::styled(country.product.name.clone(), Style::default().fg(Color::White)),
            Span::styled(format!(" ({})", country.product.match_label), Style::default().fg(Color::Green)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(sidebar_block("Current Selection")), area);
}

fn render_view_modes(frame: &mut Frame, active: ViewMode, area: Rect) {
    let lines: Vec<Line> = ViewMode::ALL
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let style = if *mode == active {
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(vec![
                Span::styled(format!("[{}] ", i + 1), label_style()),
                Span::styled(format!(" {} ", mode.label()), style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(sidebar_block("Map View")), area);
}

fn render_profile(frame: &mut Frame, panel: &ProfilePanel, age_focused: bool, area: Rect) {
    let profile = panel.profile();

    let age = if profile.age.is_empty() && !age_focused {
        Span::styled("enter age (press a)", label_style())
    } else {
        Span::styled(profile.age.clone(), Style::default().fg(Color::White))
    };
    let mut age_line = vec![Span::styled("Age:  ", label_style()), age];
    if age_focused {
        age_line.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }

    let sex_span = |sex: Sex| {
        if profile.sex == sex {
            Span::styled(format!("[{}]", sex.label()), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        } else {
            Span::styled(format!(" {} ", sex.label()), label_style())
        }
    };

    let skin = profile.skin_type;
    let arrow = |enabled: bool, glyph: &'static str| {
        Span::styled(glyph, if enabled { Style::default().fg(Color::Cyan) } else { label_style() })
    };

    let button = if panel.in_flight() {
        Span::styled("  Calculating...  ", Style::default().fg(Color::Black).bg(Color::Yellow))
    } else if panel.can_calculate() {
        Span::styled(
            "  Calculate Intake  ",
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("  Calculate Intake  ", Style::default().fg(Color::Gray).bg(Color::DarkGray))
    };

    let lines = vec![
        Line::from(age_line),
        Line::from(vec![
            Span::styled("Sex:  ", label_style()),
            sex_span(Sex::Female),
            Span::raw(" "),
            sex_span(Sex::Male),
            Span::styled("  (x)", label_style()),
        ]),
        Line::from(vec![
            Span::styled("Skin: ", label_style()),
            arrow(skin > SkinType::ALL[0], "◀ "),
            Span::raw(skin.label()),
            arrow(skin < SkinType::ALL[SkinType::ALL.len() - 1], " ▶"),
        ]),
        Line::from(vec![button, Span::styled(" (c)", label_style())]),
    ];

    let border = if age_focused { Color::Yellow } else { Color::DarkGray };
    let block = sidebar_block("Personalized Check").border_style(Style::default().fg(border));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_insight(frame: &mut Frame, insight: &str, profile: Option<&UserProfile>, country: &str, area: Rect) {
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Estimated Need ", label_style()),
            Span::styled(
                "600-800 IU Daily",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::styled(format!("\"{insight}\""), Style::default().fg(Color::White).add_modifier(Modifier::ITALIC)),
        Line::styled(
            format!("Based on winter conditions in {country}. Consider supplements from October to March."),
            label_style(),
        ),
    ];
    if let Some(profile) = profile {
        lines.push(Line::styled(
            format!("For age {}, {}, {}", profile.age, profile.sex, profile.skin_type.label()),
            label_style(),
        ));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(sidebar_block("Your Vitamin D")),
        area,
    );
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();

    if let Some(map) = app.map.surface() {
        let (lat, lng) = map.center();
        spans.extend([
            Span::styled(" Zoom: ", label_style()),
            Span::styled(format!("{:.0}", map.zoom()), Style::default().fg(Color::Yellow)),
            Span::styled(" (", label_style()),
            Span::styled(map.lod().label(), Style::default().fg(Color::Magenta)),
            Span::styled(") ", label_style()),
            Span::styled(format!("{lat:.2}°, {lng:.2}° "), Style::default().fg(Color::Cyan)),
        ]);
    }

    if let Some(title) = app.hovered_title() {
        spans.push(Span::styled(
            format!("| {title} "),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));
    }

    let hints = match app.focus {
        Focus::Map => "| /:search a:age hjkl:pan +/-:zoom r:reset 1-3:view n/p:next x:sex [/]:skin c:calc q:quit",
        Focus::Search => "| type to filter  Enter:done  Esc:clear",
        Focus::Age => "| digits:age  Enter:calculate  Esc:done",
    };
    spans.push(Span::styled(hints, label_style()));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
