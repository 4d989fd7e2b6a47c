//! Ratatui front-end: one screen that renders whichever state the current
//! load cycle has reached.

mod app;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
