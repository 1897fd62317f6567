use crate::app::{App, Message};
use crate::map::Projection;
use crate::trend::PopupClick;
use crate::ui::Areas;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use std::time::Instant;

/// Translate a key press into a message
pub fn key_message(app: &App, key: KeyEvent) -> Option<Message> {
    let message = match key.code {
        KeyCode::Esc if app.popup.is_some() => Message::DismissTrend,
        KeyCode::Char('q') | KeyCode::Esc => Message::Quit,
        KeyCode::Char('s') | KeyCode::Char('S') => Message::Start,
        KeyCode::Char('p') | KeyCode::Char('P') => Message::Stop,
        KeyCode::Char('r') | KeyCode::Char('0') => Message::Reset,
        KeyCode::Char('z') | KeyCode::Char('Z') => Message::ZoomOut,
        KeyCode::Left | KeyCode::Char('h') => Message::Previous,
        KeyCode::Right | KeyCode::Char('l') => Message::Next,
        KeyCode::Char('L') => Message::ToggleLabels,
        KeyCode::Char('f') | KeyCode::Char('F') => Message::ToggleFastest,
        _ => return None,
    };
    Some(message)
}

/// Translate a mouse event into zero or more messages, in dispatch order
pub fn mouse_messages(app: &App, areas: &Areas, mouse: MouseEvent, now: Instant) -> Vec<Message> {
    let (col, row) = (mouse.column, mouse.row);
    let mut messages = Vec::new();

    match mouse.kind {
        MouseEventKind::Moved => {
            let hovered = city_under(app, areas, col, row);
            if hovered != app.hovered {
                messages.push(Message::Hover(hovered));
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if areas.on_slider(col, row) {
                messages.extend(slider_message(app, areas, col));
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(ref popup) = app.popup {
                match popup.classify_click(col, row, areas.screen, now) {
                    PopupClick::Inside => return messages,
                    PopupClick::Dismiss => messages.push(Message::DismissTrend),
                    PopupClick::PassThrough => {}
                }
            }
            messages.extend(click_message(app, areas, col, row));
        }
        _ => {}
    }

    messages
}

fn slider_message(app: &App, areas: &Areas, col: u16) -> Option<Message> {
    areas.slider_year(col, &app.dataset.years).map(Message::SliderYear)
}

fn city_under(app: &App, areas: &Areas, col: u16, row: u16) -> Option<String> {
    let point = areas.map_point(col, row)?;
    // One character cell is at least two pixels wide
    let min_hit = areas.viewport().map_units_per_pixel() * 2.0;
    app.frame.marker_at(point, min_hit).map(|m| m.city.clone())
}

fn click_message(app: &App, areas: &Areas, col: u16, row: u16) -> Option<Message> {
    if let Some(control) = areas.button_at(col, row) {
        return Some(control.message());
    }
    if areas.on_slider(col, row) {
        return slider_message(app, areas, col);
    }

    // City targets sit on top of country shapes
    if let Some(city) = city_under(app, areas, col, row) {
        return Some(Message::OpenTrend { city, at: (col, row) });
    }

    let point = areas.map_point(col, row)?;
    let (lon, lat) = Projection::new(app.view.projection.clone()).invert(point);
    app.dataset.country_at(lon, lat).map(Message::SelectCountry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::sample;
    use crate::trend::DISMISS_DELAY;
    use crate::ui::{layout, Control};
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};
    use ratatui::layout::Rect;

    fn setup() -> (App, Areas, Instant) {
        let t0 = Instant::now();
        let mut app = App::new(sample());
        app.launch(false, t0);
        app.update(Message::SliderYear(2002), t0);
        let areas = layout(Rect::new(0, 0, 160, 50), &app.dataset.years);
        (app, areas, t0)
    }

    fn click(col: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: col,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Terminal cell showing a city's marker
    fn cell_of(app: &App, areas: &Areas, city: &str) -> (u16, u16) {
        let marker = app.frame.markers.iter().find(|m| m.city == city).unwrap();
        let (px, py) = areas.viewport().to_pixel(marker.position);
        (areas.map_inner.x + (px / 2) as u16, areas.map_inner.y + (py / 4) as u16)
    }

    #[test]
    fn test_keys() {
        let (app, _, _) = setup();
        let key = |code| KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        };
        assert_eq!(key_message(&app, key(KeyCode::Char('s'))), Some(Message::Start));
        assert_eq!(key_message(&app, key(KeyCode::Left)), Some(Message::Previous));
        assert_eq!(key_message(&app, key(KeyCode::Esc)), Some(Message::Quit));
        assert_eq!(key_message(&app, key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_button_click() {
        let (app, areas, t0) = setup();
        let (rect, _) = areas.buttons.iter().find(|(_, c)| *c == Control::ZoomOut).unwrap();
        assert_eq!(mouse_messages(&app, &areas, click(rect.x, rect.y), t0), vec![Message::ZoomOut]);
    }

    #[test]
    fn test_city_click_opens_trend() {
        let (app, areas, t0) = setup();
        let (col, row) = cell_of(&app, &areas, "Berlin");
        assert_eq!(
            mouse_messages(&app, &areas, click(col, row), t0),
            vec![Message::OpenTrend {
                city: "Berlin".into(),
                at: (col, row)
            }]
        );
    }

    #[test]
    fn test_country_click_selects() {
        let (app, areas, t0) = setup();
        // Sardinia-ish: inside the Italy box, far from any city
        let point = Projection::new(app.view.projection.clone()).project(9.0, 38.0);
        let (px, py) = areas.viewport().to_pixel(point);
        let (col, row) = (areas.map_inner.x + (px / 2) as u16, areas.map_inner.y + (py / 4) as u16);
        assert_eq!(mouse_messages(&app, &areas, click(col, row), t0), vec![Message::SelectCountry(1)]);
    }

    #[test]
    fn test_popup_click_rules() {
        let (mut app, areas, t0) = setup();
        app.update(
            Message::OpenTrend {
                city: "Paris".into(),
                at: (10, 10),
            },
            t0,
        );
        let rect = app.popup.as_ref().unwrap().rect(areas.screen);

        // inside the popup: swallowed
        assert!(mouse_messages(&app, &areas, click(rect.x + 1, rect.y + 1), t0 + DISMISS_DELAY).is_empty());

        // outside, on a button: dismiss first, then the button
        let (button, _) = areas.buttons[0];
        assert_eq!(
            mouse_messages(&app, &areas, click(button.x, button.y), t0 + DISMISS_DELAY),
            vec![Message::DismissTrend, Message::Start]
        );

        // too soon after opening: popup stays
        assert_eq!(mouse_messages(&app, &areas, click(button.x, button.y), t0), vec![Message::Start]);
    }

    #[test]
    fn test_hover_reports_changes_only() {
        let (mut app, areas, t0) = setup();
        let (col, row) = cell_of(&app, &areas, "Berlin");
        let moved = MouseEvent {
            kind: MouseEventKind::Moved,
            ..click(col, row)
        };
        let messages = mouse_messages(&app, &areas, moved, t0);
        assert_eq!(messages, vec![Message::Hover(Some("Berlin".into()))]);
        app.update(messages[0].clone(), t0);
        assert!(mouse_messages(&app, &areas, moved, t0).is_empty());
    }
}
