use crate::data::Dataset;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Most recent years shown in a trend
pub const TREND_LEN: usize = 5;
/// Clicks are not checked for dismissal until this long after opening
pub const DISMISS_DELAY: Duration = Duration::from_millis(50);

const POPUP_WIDTH: u16 = 40;
const POPUP_HEIGHT: u16 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrendPoint {
    pub year: i32,
    pub frequency: u32,
}

/// Recent frequency history of one city
#[derive(Clone, Debug, PartialEq)]
pub struct CityTrend {
    pub city: String,
    pub points: Vec<TrendPoint>,
}

impl CityTrend {
    /// Up to `TREND_LEN` entries ending at `current_year`, or at the city's
    /// latest year when `current_year` is missing from its history.
    pub fn build(dataset: &Dataset, city: &str, current_year: i32) -> Option<Self> {
        let history = dataset.city_history(city);
        if history.is_empty() {
            warn!("no history for city {city}");
            return None;
        }

        let end = match history.iter().position(|r| r.year == current_year) {
            Some(index) => index,
            None => {
                warn!("current year {current_year} not found for city {city}, showing latest years instead");
                history.len() - 1
            }
        };
        let start = end.saturating_sub(TREND_LEN - 1);

        let points: Vec<TrendPoint> = history[start..=end]
            .iter()
            .map(|r| TrendPoint {
                year: r.year,
                frequency: r.frequency,
            })
            .collect();
        debug!(
            "showing years for city {city}: {:?}",
            points.iter().map(|p| p.year).collect::<Vec<_>>()
        );

        Some(Self {
            city: city.to_string(),
            points,
        })
    }

    pub fn title(&self) -> String {
        format!("Last {} Years: {}", self.points.len(), self.city)
    }
}

/// What a click means while the popup is open
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupClick {
    /// Landed on the popup; swallow it
    Inside,
    /// Outside after the dismiss delay; close the popup, then handle the click
    Dismiss,
    /// Outside but too soon after opening; handle the click, keep the popup
    PassThrough,
}

/// Floating trend panel anchored near the pointer
#[derive(Clone, Debug)]
pub struct TrendPopup {
    pub trend: CityTrend,
    /// Terminal cell the opening click landed on
    pub anchor: (u16, u16),
    opened_at: Instant,
}

impl TrendPopup {
    pub fn open(trend: CityTrend, anchor: (u16, u16), now: Instant) -> Self {
        Self {
            trend,
            anchor,
            opened_at: now,
        }
    }

    /// Whether the outside-click listener is attached yet
    pub fn is_armed(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.opened_at) >= DISMISS_DELAY
    }

    /// Panel placement: two cells right of the pointer, kept on screen
    pub fn rect(&self, screen: Rect) -> Rect {
        let width = POPUP_WIDTH.min(screen.width);
        let height = POPUP_HEIGHT.min(screen.height);
        let max_x = screen.x + screen.width - width;
        let max_y = screen.y + screen.height - height;
        let x = self.anchor.0.saturating_add(2).clamp(screen.x, max_x);
        let y = self.anchor.1.clamp(screen.y, max_y);
        Rect::new(x, y, width, height)
    }

    pub fn classify_click(&self, col: u16, row: u16, screen: Rect, now: Instant) -> PopupClick {
        let rect = self.rect(screen);
        let inside = col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height;
        if inside {
            PopupClick::Inside
        } else if self.is_armed(now) {
            PopupClick::Dismiss
        } else {
            PopupClick::PassThrough
        }
    }
}
