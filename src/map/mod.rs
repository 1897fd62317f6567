pub mod frame;
pub mod geometry;
pub mod labels;
pub mod projection;
mod renderer;

pub use frame::{build_frame, Frame, Marker, ViewState};
pub use labels::LabelLayout;
pub use projection::{Projection, ProjectionState, Viewport};
pub use renderer::{DisplaySettings, MapLayers, MapRenderer};
