use crate::braille::BrailleCanvas;
use crate::data::Dataset;
use crate::map::frame::Frame;
use crate::map::geometry::{draw_circle, draw_line, draw_ring};
use crate::map::projection::{Projection, ProjectionState, Viewport};
use glam::DVec2;
use rayon::prelude::*;

/// Label text sits up and to the right of its relaxed position, map units
const LABEL_OFFSET: DVec2 = DVec2::new(5.0, -5.0);

/// Display settings for map layers
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_labels: bool,
    pub show_fastest: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_labels: true,
            show_fastest: true,
        }
    }
}

/// Rasterized map, one Braille canvas per color plus text overlays
pub struct MapLayers {
    pub countries: BrailleCanvas,
    pub selected: BrailleCanvas,
    pub leaders: BrailleCanvas,
    pub markers: BrailleCanvas,
    pub hovered: BrailleCanvas,
    pub fastest: BrailleCanvas,
    /// (col, row, text) in character cells
    pub labels: Vec<(u16, u16, String)>,
}

impl MapLayers {
    fn new(width: usize, height: usize) -> Self {
        Self {
            countries: BrailleCanvas::new(width, height),
            selected: BrailleCanvas::new(width, height),
            leaders: BrailleCanvas::new(width, height),
            markers: BrailleCanvas::new(width, height),
            hovered: BrailleCanvas::new(width, height),
            fastest: BrailleCanvas::new(width, height),
            labels: Vec::new(),
        }
    }
}

/// Draws a [`Frame`] onto Braille layers
pub struct MapRenderer {
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            settings: DisplaySettings::default(),
        }
    }

    /// Render the whole map from scratch for a canvas of `width` x `height` characters
    pub fn render(
        &self,
        dataset: &Dataset,
        frame: &Frame,
        projection: &ProjectionState,
        selected_country: Option<usize>,
        hovered_city: Option<&str>,
        width: usize,
        height: usize,
    ) -> MapLayers {
        let mut layers = MapLayers::new(width, height);
        let viewport = Viewport::new(width * 2, height * 4);
        let projection = Projection::new(projection.clone());
        let scale = viewport.scale();

        // Project outlines in parallel, draw sequentially
        let outlines: Vec<(usize, Vec<Vec<(i32, i32)>>)> = dataset
            .countries
            .par_iter()
            .enumerate()
            .map(|(idx, country)| {
                let rings: Vec<Vec<(i32, i32)>> = country
                    .polygons
                    .iter()
                    .flatten()
                    .map(|ring| {
                        ring.iter()
                            .map(|&(lon, lat)| viewport.to_pixel(projection.project(lon, lat)))
                            .collect::<Vec<_>>()
                    })
                    .collect();
                (idx, rings)
            })
            .collect();

        for (idx, rings) in &outlines {
            let canvas = if Some(*idx) == selected_country {
                &mut layers.selected
            } else {
                &mut layers.countries
            };
            for ring in rings {
                draw_pixel_path(canvas, ring, &viewport);
            }
        }

        for marker in &frame.markers {
            let (px, py) = viewport.to_pixel(marker.position);
            if !viewport.is_visible(px, py) {
                continue;
            }
            if hovered_city == Some(marker.city.as_str()) {
                draw_circle(&mut layers.hovered, px, py, (marker.hit_radius * scale).round() as i32);
            } else {
                draw_circle(&mut layers.markers, px, py, (marker.radius * scale).round() as i32);
            }
        }

        if self.settings.show_labels {
            for label in &frame.labels {
                let from = viewport.to_pixel(label.anchor);
                let to = viewport.to_pixel(label.position);
                if viewport.line_might_be_visible(from, to) {
                    draw_line(&mut layers.leaders, from.0, from.1, to.0, to.1);
                }
                if let Some(cell) = pixel_to_cell(viewport.to_pixel(label.position + LABEL_OFFSET), width, height) {
                    layers.labels.push((cell.0, cell.1, label.city.clone()));
                }
            }
        }

        if self.settings.show_fastest {
            if let Some(ref marker) = frame.fastest {
                let (px, py) = viewport.to_pixel(marker.position);
                let radius = ((marker.radius * scale).round() as i32).max(1) + 2;
                draw_ring(&mut layers.fastest, px, py, radius);
                if let Some((col, row)) = pixel_to_cell((px, py - radius - 4), width, height) {
                    layers.labels.push((col, row, format!("★ {}", marker.city)));
                }
            }
        }

        layers
    }

    /// Toggle city labels
    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    /// Toggle the fastest growing overlay
    pub fn toggle_fastest(&mut self) {
        self.settings.show_fastest = !self.settings.show_fastest;
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Braille pixel to character cell, if it lands on the canvas
fn pixel_to_cell((px, py): (i32, i32), width: usize, height: usize) -> Option<(u16, u16)> {
    if px < 0 || py < 0 {
        return None;
    }
    let (col, row) = ((px / 2) as usize, (py / 4) as usize);
    (col < width && row < height).then_some((col as u16, row as u16))
}

/// Draw a projected ring with viewport culling
fn draw_pixel_path(canvas: &mut BrailleCanvas, points: &[(i32, i32)], viewport: &Viewport) {
    if points.len() < 2 {
        return;
    }

    for pair in points.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        // Skip wild jumps from points behind the cone apex
        let dist = ((p1.0 - p0.0).abs() + (p1.1 - p0.1).abs()) as usize;
        if dist < viewport.width.max(1) * 2 && viewport.line_might_be_visible(p0, p1) {
            draw_line(canvas, p0.0, p0.1, p1.0, p1.1);
        }
    }
}
