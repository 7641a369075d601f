//! Terminal output helpers.

pub mod status_line;

pub use status_line::{IdleIndicator, IndicatorState, Twirl};
