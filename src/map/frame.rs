use crate::data::{CityRecord, Dataset};
use crate::map::labels::LabelLayout;
use crate::map::projection::{Projection, ProjectionState};
use glam::DVec2;
use rayon::prelude::*;

/// Number of cities labelled and charted per year
pub const TOP_N: usize = 5;
/// Pointer target radius as a multiple of the drawn radius
pub const HIT_RADIUS_FACTOR: f64 = 3.0;

/// The mutable part of the display: which year, which country, which view
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    pub year_index: usize,
    pub selected_country: Option<usize>,
    pub projection: ProjectionState,
}

/// A city drawn on the map
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub city: String,
    pub frequency: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Projected position in map space
    pub position: DVec2,
    pub radius: f64,
    pub hit_radius: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub city: String,
    /// Marker position the connector line starts from
    pub anchor: DVec2,
    /// Position after relaxation
    pub position: DVec2,
}

/// Everything needed to draw one year
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub year: Option<i32>,
    pub country_name: Option<String>,
    pub markers: Vec<Marker>,
    /// Top cities by frequency, descending
    pub top: Vec<CityRecord>,
    pub labels: Vec<Label>,
    pub fastest: Option<Marker>,
}

impl Frame {
    /// Marker under a map-space point, nearest first.
    /// `min_hit` widens tiny targets to something a terminal cell can hit.
    pub fn marker_at(&self, point: DVec2, min_hit: f64) -> Option<&Marker> {
        self.markers
            .iter()
            .map(|m| (m, m.position.distance(point)))
            .filter(|(m, d)| *d <= m.hit_radius.max(min_hit))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(m, _)| m)
    }
}

/// Records shown for `year`, restricted to a selected country if any
pub fn visible_records<'a>(dataset: &'a Dataset, year: i32, selected_country: Option<usize>) -> Vec<&'a CityRecord> {
    let year_records: Vec<&CityRecord> = dataset.records_for_year(year).collect();
    match selected_country.and_then(|i| dataset.countries.get(i)) {
        Some(country) => year_records
            .into_par_iter()
            .filter(|r| country.contains(r.longitude, r.latitude))
            .collect(),
        None => year_records,
    }
}

/// Highest-frequency records, descending, at most `TOP_N`
pub fn top_cities<'a>(records: &[&'a CityRecord]) -> Vec<&'a CityRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    sorted.truncate(TOP_N);
    sorted
}

fn marker_for(dataset: &Dataset, projection: &Projection, record: &CityRecord) -> Marker {
    let radius = dataset.radius.radius(record.frequency);
    Marker {
        city: record.city.clone(),
        frequency: record.frequency,
        latitude: record.latitude,
        longitude: record.longitude,
        position: projection.project(record.longitude, record.latitude),
        radius,
        hit_radius: radius * HIT_RADIUS_FACTOR,
    }
}

/// Build the frame for the current view. Pure: same inputs, same frame.
pub fn build_frame(dataset: &Dataset, view: &ViewState, layout: &LabelLayout) -> Frame {
    let Some(&year) = dataset.years.get(view.year_index) else {
        return Frame::default();
    };

    let projection = Projection::new(view.projection.clone());
    let records = visible_records(dataset, year, view.selected_country);
    let top = top_cities(&records);

    let markers: Vec<Marker> = records.iter().map(|r| marker_for(dataset, &projection, r)).collect();

    let anchors: Vec<DVec2> = top
        .iter()
        .map(|r| projection.project(r.longitude, r.latitude))
        .collect();
    let labels = top
        .iter()
        .zip(anchors.iter())
        .zip(layout.place(&anchors))
        .map(|((record, &anchor), position)| Label {
            city: record.city.clone(),
            anchor,
            position,
        })
        .collect();

    // Pre-computed elsewhere; absent years simply get no overlay
    let fastest = dataset.fastest.get(&year).map(|r| marker_for(dataset, &projection, r));

    Frame {
        year: Some(year),
        country_name: view
            .selected_country
            .and_then(|i| dataset.countries.get(i))
            .map(|c| c.name.clone()),
        markers,
        top: top.into_iter().cloned().collect(),
        labels,
        fastest,
    }
}
