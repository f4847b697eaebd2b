//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{ChartPlotter, BAR_COLOR, TILE_COLORS};
pub use renderer::{RenderError, StaticChartRenderer};
