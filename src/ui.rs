use crate::app::{App, Message};
use crate::clock::ClockState;
use crate::map::{MapLayers, Viewport};
use crate::trend::TrendPopup;
use glam::DVec2;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Widget},
    Frame,
};
use std::time::Instant;

const BAR_COLOR: Color = Color::Rgb(0x69, 0xb3, 0xa2);

/// The six control buttons, left to right
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Start,
    Stop,
    Reset,
    ZoomOut,
    Previous,
    Next,
}

impl Control {
    pub const ALL: [Control; 6] = [
        Control::Start,
        Control::Stop,
        Control::Reset,
        Control::ZoomOut,
        Control::Previous,
        Control::Next,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::Start => " Start ",
            Control::Stop => " Stop ",
            Control::Reset => " Reset ",
            Control::ZoomOut => " Zoom Out ",
            Control::Previous => " Previous ",
            Control::Next => " Next ",
        }
    }

    pub fn message(self) -> Message {
        match self {
            Control::Start => Message::Start,
            Control::Stop => Message::Stop,
            Control::Reset => Message::Reset,
            Control::ZoomOut => Message::ZoomOut,
            Control::Previous => Message::Previous,
            Control::Next => Message::Next,
        }
    }
}

/// Screen regions, shared by drawing and mouse hit-testing
#[derive(Clone, Debug)]
pub struct Areas {
    pub screen: Rect,
    pub map: Rect,
    pub map_inner: Rect,
    pub chart: Rect,
    pub buttons: Vec<(Rect, Control)>,
    pub slider: Rect,
    pub slider_track: Rect,
    pub status: Rect,
}

fn contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

impl Areas {
    pub fn button_at(&self, col: u16, row: u16) -> Option<Control> {
        self.buttons
            .iter()
            .find(|(rect, _)| contains(*rect, col, row))
            .map(|(_, control)| *control)
    }

    pub fn on_slider(&self, col: u16, row: u16) -> bool {
        contains(self.slider_track, col, row)
    }

    /// Viewport matching the map's Braille canvas
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.map_inner.width as usize * 2, self.map_inner.height as usize * 4)
    }

    /// Map-space point under a terminal cell (cell center)
    pub fn map_point(&self, col: u16, row: u16) -> Option<DVec2> {
        if !contains(self.map_inner, col, row) {
            return None;
        }
        let px = (col - self.map_inner.x) as i32 * 2 + 1;
        let py = (row - self.map_inner.y) as i32 * 4 + 2;
        Some(self.viewport().to_map(px, py))
    }

    /// Year under a slider column, snapped to whole years
    pub fn slider_year(&self, col: u16, years: &[i32]) -> Option<i32> {
        let (&min, &max) = (years.first()?, years.last()?);
        let track = self.slider_track;
        if track.width <= 1 {
            return Some(min);
        }
        let offset = col.clamp(track.x, track.x + track.width - 1) - track.x;
        let t = offset as f64 / (track.width - 1) as f64;
        Some(min + (t * (max - min) as f64).round() as i32)
    }

    /// Slider column for a year
    pub fn slider_column(&self, year: i32, years: &[i32]) -> Option<u16> {
        let (&min, &max) = (years.first()?, years.last()?);
        let track = self.slider_track;
        if track.width == 0 {
            return None;
        }
        let t = if max > min {
            (year - min) as f64 / (max - min) as f64
        } else {
            0.0
        };
        Some(track.x + (t * (track.width.saturating_sub(1)) as f64).round() as u16)
    }
}

fn slider_labels(years: &[i32]) -> (String, String) {
    match (years.first(), years.last()) {
        (Some(min), Some(max)) => (format!(" {min} "), format!(" {max} ")),
        _ => (" ---- ".to_string(), " ---- ".to_string()),
    }
}

/// Split the screen into map, chart, controls, slider and status bar
pub fn layout(area: Rect, years: &[i32]) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Map and chart
            Constraint::Length(1), // Buttons
            Constraint::Length(1), // Slider
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(rows[0]);

    let map = columns[0];
    let map_inner = Block::default().borders(Borders::ALL).inner(map);

    let mut buttons = Vec::with_capacity(Control::ALL.len());
    let controls = rows[1];
    let mut x = controls.x + 1;
    for control in Control::ALL {
        let width = control.label().chars().count() as u16;
        if x + width > controls.x + controls.width {
            break;
        }
        buttons.push((Rect::new(x, controls.y, width, 1), control));
        x += width + 1;
    }

    let slider = rows[2];
    let (left, right) = slider_labels(years);
    let left_width = left.chars().count() as u16;
    let right_width = right.chars().count() as u16;
    let slider_track = Rect::new(
        slider.x + left_width.min(slider.width),
        slider.y,
        slider.width.saturating_sub(left_width + right_width),
        slider.height,
    );

    Areas {
        screen: area,
        map,
        map_inner,
        chart: columns[1],
        buttons,
        slider,
        slider_track,
        status: rows[3],
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App, now: Instant) {
    let areas = layout(frame.area(), &app.dataset.years);

    render_map(frame, app, &areas);
    render_chart(frame, app, areas.chart, now);
    render_controls(frame, app, &areas);
    render_slider(frame, app, &areas);
    render_status_bar(frame, app, areas.status);

    if let Some(ref popup) = app.popup {
        render_popup(frame, popup, areas.screen);
    }
}

fn render_map(frame: &mut Frame, app: &App, areas: &Areas) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " European Cities ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(block, areas.map);

    let inner = areas.map_inner;
    let layers = app.map_renderer.render(
        &app.dataset,
        &app.frame,
        &app.view.projection,
        app.view.selected_country,
        app.hovered.as_deref(),
        inner.width as usize,
        inner.height as usize,
    );

    let mut headings = Vec::new();
    if let Some(error) = &app.load_error {
        headings.push(Line::from(Span::styled(
            format!("Data failed to load: {error}"),
            Style::default().fg(Color::Red),
        )));
    } else {
        let year = app.frame.year.map(|y| y.to_string()).unwrap_or_else(|| "---".to_string());
        headings.push(Line::from(Span::styled(
            format!("Year: {year}"),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
        if let Some(name) = &app.frame.country_name {
            headings.push(Line::from(Span::styled(
                format!("Country: {name}"),
                Style::default().fg(Color::Yellow),
            )));
        }
    }

    frame.render_widget(
        MapWidget {
            layers,
            headings,
            inner_width: inner.width,
            inner_height: inner.height,
        },
        inner,
    );
}

/// Custom widget that renders braille map with text labels overlaid
struct MapWidget {
    layers: MapLayers,
    headings: Vec<Line<'static>>,
    inner_width: u16,
    inner_height: u16,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &crate::braille::BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (col, row, ch) in canvas.cells() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            buf[(area.x + col as u16, area.y + row as u16)].set_char(ch).set_fg(color);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        Self::render_layer(&self.layers.countries, Color::Gray, area, buf);
        Self::render_layer(&self.layers.selected, Color::Yellow, area, buf);
        Self::render_layer(&self.layers.leaders, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.markers, Color::Red, area, buf);
        Self::render_layer(&self.layers.fastest, Color::Green, area, buf);
        Self::render_layer(&self.layers.hovered, Color::Blue, area, buf);

        let label_style = Style::default().fg(Color::White);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= self.inner_height || *lx >= self.inner_width {
                continue;
            }
            let max_len = self.inner_width.saturating_sub(*lx) as usize;
            for (i, ch) in text.chars().take(max_len.min(24)).enumerate() {
                buf[(area.x + *lx + i as u16, area.y + *ly)].set_char(ch).set_style(label_style);
            }
        }

        for (i, line) in self.headings.iter().enumerate() {
            if i as u16 >= area.height {
                break;
            }
            buf.set_line(area.x + 1, area.y + i as u16, line, area.width.saturating_sub(1));
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width.max(1)).collect()
}

/// Value scale for a bar area `rows` tall: max on the top row, 0 on the
/// bottom bar row, and the midpoint value when there is room for it
fn y_axis(max: u64, rows: u16) -> Vec<String> {
    let rows = rows as usize;
    let width = max.to_string().len();
    (0..rows)
        .map(|row| {
            let value = if row == 0 {
                Some(max)
            } else if row + 1 == rows {
                Some(0)
            } else if rows >= 5 && row == rows / 2 {
                Some(max * (rows - 1 - row) as u64 / (rows - 1) as u64)
            } else {
                None
            };
            match value {
                Some(v) => format!("{v:>width$}┤"),
                None => format!("{:>width$}│", ""),
            }
        })
        .collect()
}

/// Draw `block` with a y axis down its left edge; returns the area left for bars
fn render_axis_frame(frame: &mut Frame, block: Block, area: Rect, max: u64) -> Rect {
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Bottom row holds the bar labels
    let axis = y_axis(max, inner.height.saturating_sub(1));
    let gutter = axis
        .first()
        .map(|line| line.chars().count() as u16)
        .unwrap_or(0)
        .min(inner.width);
    let [axis_area, bars_area] = Layout::horizontal([Constraint::Length(gutter), Constraint::Min(0)]).areas(inner);

    let lines: Vec<Line> = axis.into_iter().map(Line::from).collect();
    frame.render_widget(Paragraph::new(lines).style(Style::default().fg(Color::DarkGray)), axis_area);
    bars_area
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect, now: Instant) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Top 5 Cities by Frequency ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let max = app.bars.domain_max().max(1) as u64;
    let bars_area = render_axis_frame(frame, block, area, max);

    let snapshot = app.bars.snapshot(now);
    let count = snapshot.len().max(1) as u16;
    let bar_width = (bars_area.width.saturating_sub(count - 1) / count).clamp(1, 12);

    let bars: Vec<Bar> = snapshot
        .iter()
        .map(|bar| {
            Bar::default()
                .value(bar.value.round() as u64)
                .text_value(bar.target.to_string())
                .label(Line::from(truncate(&bar.city, bar_width as usize)))
        })
        .collect();

    let chart = BarChart::default()
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(BAR_COLOR))
        .value_style(Style::default().fg(Color::Black).bg(BAR_COLOR))
        .label_style(Style::default().fg(Color::White))
        .data(BarGroup::default().bars(&bars))
        .max(max);

    frame.render_widget(chart, bars_area);
}

fn render_controls(frame: &mut Frame, app: &App, areas: &Areas) {
    let running = app.clock.state() == ClockState::Running;
    for (rect, control) in &areas.buttons {
        let active = matches!(
            (control, running),
            (Control::Start, true) | (Control::Stop, false)
        );
        let style = if active {
            Style::default().fg(Color::Black).bg(Color::Green)
        } else {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        };
        frame.render_widget(Paragraph::new(Span::styled(control.label(), style)), *rect);
    }
}

fn render_slider(frame: &mut Frame, app: &App, areas: &Areas) {
    let years = &app.dataset.years;
    let (left, right) = slider_labels(years);
    let track_width = areas.slider_track.width as usize;
    let thumb = app
        .current_year()
        .and_then(|year| areas.slider_column(year, years))
        .map(|col| (col - areas.slider_track.x) as usize);

    let track: String = (0..track_width)
        .map(|i| if Some(i) == thumb { '●' } else { '━' })
        .collect();

    let line = Line::from(vec![
        Span::styled(left, Style::default().fg(Color::DarkGray)),
        Span::styled(track, Style::default().fg(Color::Cyan)),
        Span::styled(right, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), areas.slider);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;
    let running = app.clock.state() == ClockState::Running;

    let year = app.current_year().map(|y| y.to_string()).unwrap_or_else(|| "---".to_string());
    let hovered = app
        .hovered
        .as_ref()
        .and_then(|city| app.frame.markers.iter().find(|m| &m.city == city))
        .map(|m| format!("{} ({}) ", m.city, m.frequency))
        .unwrap_or_default();

    let status = Line::from(vec![
        Span::styled(
            if running { " ▶ running " } else { " ■ stopped " },
            Style::default().fg(if running { Color::Green } else { Color::Yellow }),
        ),
        Span::styled("Year: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{year} "), Style::default().fg(Color::Yellow)),
        Span::styled(hovered, Style::default().fg(Color::Blue)),
        // Toggle indicators
        Span::styled(
            if settings.show_labels { "[L]abels " } else { "[l]abels " },
            Style::default().fg(if settings.show_labels { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(
            if settings.show_fastest { "[F]astest " } else { "[f]astest " },
            Style::default().fg(if settings.show_fastest { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(
            "| s:start p:stop r:reset z:zoom out ←/→:prev/next q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

fn render_popup(frame: &mut Frame, popup: &TrendPopup, screen: Rect) {
    let rect = popup.rect(screen);
    frame.render_widget(Clear, rect);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray))
        .style(Style::default().bg(Color::Black))
        .title(Span::styled(
            format!(" {} ", popup.trend.title()),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));

    let points = &popup.trend.points;
    let max = points.iter().map(|p| p.frequency).max().unwrap_or(0).max(1) as u64;
    let bars_area = render_axis_frame(frame, block, rect, max);

    let count = points.len().max(1) as u16;
    let bar_width = (bars_area.width.saturating_sub(count - 1) / count).clamp(1, 8);
    let bars: Vec<Bar> = points
        .iter()
        .map(|p| {
            Bar::default()
                .value(p.frequency as u64)
                .label(Line::from(p.year.to_string()))
        })
        .collect();

    let chart = BarChart::default()
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(BAR_COLOR))
        .value_style(Style::default().fg(Color::Black).bg(BAR_COLOR))
        .data(BarGroup::default().bars(&bars))
        .max(max);

    frame.render_widget(chart, bars_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEARS: [i32; 11] = [2000, 2001, 2002, 2003, 2004, 2005, 2006, 2007, 2008, 2009, 2010];

    #[test]
    fn test_layout_regions() {
        let areas = layout(Rect::new(0, 0, 120, 40), &YEARS);
        assert_eq!(areas.status.y, 39);
        assert_eq!(areas.slider.y, 38);
        assert_eq!(areas.buttons.len(), 6);
        assert_eq!(areas.button_at(2, 37), Some(Control::Start));
        assert_eq!(areas.button_at(0, 37), None);
        assert_eq!(areas.map_inner.x, areas.map.x + 1);
    }

    #[test]
    fn test_slider_round_trip() {
        let areas = layout(Rect::new(0, 0, 120, 40), &YEARS);
        for year in YEARS {
            let col = areas.slider_column(year, &YEARS).unwrap();
            assert_eq!(areas.slider_year(col, &YEARS), Some(year));
        }
        let track = areas.slider_track;
        assert_eq!(areas.slider_year(track.x, &YEARS), Some(2000));
        assert_eq!(areas.slider_year(track.x + track.width - 1, &YEARS), Some(2010));
    }

    #[test]
    fn test_slider_without_years() {
        let areas = layout(Rect::new(0, 0, 80, 24), &[]);
        assert_eq!(areas.slider_year(10, &[]), None);
    }

    #[test]
    fn test_y_axis_scale() {
        assert_eq!(y_axis(40, 5), vec!["40┤", "  │", "20┤", "  │", " 0┤"]);
        assert_eq!(y_axis(7, 3), vec!["7┤", " │", "0┤"]);
        assert!(y_axis(7, 0).is_empty());
    }

    #[test]
    fn test_chart_draws_axis() {
        let t0 = Instant::now();
        let mut app = App::new(crate::data::fixtures::sample());
        app.launch(true, t0);
        let mut terminal = ratatui::Terminal::new(ratatui::backend::TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| render(f, &app, t0)).unwrap();

        let areas = layout(Rect::new(0, 0, 120, 40), &app.dataset.years);
        let buffer = terminal.backend().buffer();
        // Rome leads 2000 with 30
        let top_row: String = (areas.chart.x + 1..areas.chart.x + 4)
            .map(|x| buffer[(x, areas.chart.y + 1)].symbol().to_string())
            .collect();
        assert_eq!(top_row, "30┤");
    }

    #[test]
    fn test_map_point_inside_only() {
        let areas = layout(Rect::new(0, 0, 120, 40), &YEARS);
        assert!(areas.map_point(0, 0).is_none());
        assert!(areas.map_point(areas.map_inner.x + 3, areas.map_inner.y + 3).is_some());
    }
}
