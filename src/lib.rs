pub mod app;
pub mod braille;
pub mod chart;
pub mod clock;
pub mod config;
pub mod data;
pub mod input;
pub mod map;
pub mod trend;
pub mod ui;
