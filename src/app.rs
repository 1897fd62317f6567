use crate::chart::BarChartState;
use crate::clock::AnimationClock;
use crate::data::Dataset;
use crate::map::frame::{build_frame, Frame, ViewState};
use crate::map::labels::LabelLayout;
use crate::map::projection::ProjectionState;
use crate::map::MapRenderer;
use crate::trend::{CityTrend, TrendPopup};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything the UI can ask the application to do
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Start,
    Stop,
    Reset,
    ZoomOut,
    Previous,
    Next,
    /// Slider moved to a year
    SliderYear(i32),
    /// Country clicked, by index
    SelectCountry(usize),
    /// City marker clicked at a terminal cell
    OpenTrend { city: String, at: (u16, u16) },
    DismissTrend,
    Hover(Option<String>),
    /// Animation clock fired
    Tick,
    ToggleLabels,
    ToggleFastest,
    Quit,
}

/// Application state
pub struct App {
    pub dataset: Dataset,
    pub view: ViewState,
    pub clock: AnimationClock,
    pub layout: LabelLayout,
    /// Model of the last render
    pub frame: Frame,
    pub bars: BarChartState,
    pub popup: Option<TrendPopup>,
    pub hovered: Option<String>,
    pub map_renderer: MapRenderer,
    /// Why the app is inert, if loading failed
    pub load_error: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            view: ViewState::default(),
            clock: AnimationClock::new(),
            layout: LabelLayout::default(),
            frame: Frame::default(),
            bars: BarChartState::new(),
            popup: None,
            hovered: None,
            map_renderer: MapRenderer::new(),
            load_error: None,
            should_quit: false,
        }
    }

    /// An app with nothing to show
    pub fn inert(error: String) -> Self {
        let mut app = Self::new(Dataset::default());
        app.load_error = Some(error);
        app
    }

    /// First render, then start the animation unless asked not to
    pub fn launch(&mut self, paused: bool, now: Instant) {
        self.refresh(now);
        if !paused && self.load_error.is_none() {
            self.clock.start(now);
        }
    }

    pub fn current_year(&self) -> Option<i32> {
        self.dataset.years.get(self.view.year_index).copied()
    }

    /// Fire the clock if due
    pub fn poll_clock(&mut self, now: Instant) {
        if self.clock.poll(now) {
            self.update(Message::Tick, now);
        }
    }

    pub fn update(&mut self, message: Message, now: Instant) {
        match message {
            Message::Start => self.clock.start(now),
            Message::Stop => self.clock.stop(),
            Message::Tick => {
                let count = self.dataset.years.len();
                if count == 0 {
                    return;
                }
                self.view.year_index = (self.view.year_index + 1) % count;
                debug!("animation index {} year {:?}", self.view.year_index, self.current_year());
                self.refresh(now);
            }
            Message::Previous => {
                self.clock.stop();
                self.view.year_index = self.view.year_index.saturating_sub(1);
                self.refresh(now);
            }
            Message::Next => {
                self.clock.stop();
                let last = self.dataset.years.len().saturating_sub(1);
                self.view.year_index = (self.view.year_index + 1).min(last);
                self.refresh(now);
            }
            Message::SliderYear(year) => {
                self.clock.stop();
                match self.dataset.year_position(year) {
                    Some(index) => {
                        self.view.year_index = index;
                        self.refresh(now);
                    }
                    None => warn!("slider selected year {year} not found in data"),
                }
            }
            Message::Reset => {
                self.clock.stop();
                self.view = ViewState::default();
                self.refresh(now);
                self.clock.start(now);
            }
            Message::ZoomOut => {
                self.view.selected_country = None;
                self.view.projection = ProjectionState::original();
                self.refresh(now);
            }
            Message::SelectCountry(index) => {
                let Some(country) = self.dataset.countries.get(index) else {
                    return;
                };
                self.clock.stop();
                info!("zooming to {}", country.name);
                self.view.selected_country = Some(index);
                self.view.projection = ProjectionState::fit_bounds(country.bounds);
                self.refresh(now);
                self.clock.start(now);
            }
            Message::OpenTrend { city, at } => {
                self.clock.stop();
                let Some(year) = self.current_year() else {
                    return;
                };
                // Opening replaces whatever popup was showing
                self.popup = CityTrend::build(&self.dataset, &city, year).map(|trend| TrendPopup::open(trend, at, now));
            }
            Message::DismissTrend => self.popup = None,
            Message::Hover(city) => self.hovered = city,
            Message::ToggleLabels => self.map_renderer.toggle_labels(),
            Message::ToggleFastest => self.map_renderer.toggle_fastest(),
            Message::Quit => self.should_quit = true,
        }
    }

    /// Replace the rendered frame and retarget the bar chart
    fn refresh(&mut self, now: Instant) {
        self.frame = build_frame(&self.dataset, &self.view, &self.layout);
        self.bars
            .update(self.frame.top.iter().map(|r| (r.city.as_str(), r.frequency)), now);
    }
}
