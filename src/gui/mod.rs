//! GUI module - User interface components

mod app;
mod fonts;
mod results_view;
mod search_panel;

pub use app::RealtyApp;
pub use results_view::{ResultsAction, ResultsView};
pub use search_panel::{SearchPanel, SearchPanelAction};
