//! GUI module - User interface components

mod app;
mod control_panel;
mod data_viewer;

pub use app::DashboardApp;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use data_viewer::DataViewer;
