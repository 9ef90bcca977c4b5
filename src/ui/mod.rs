//! Terminal dashboard components for runlog.

pub mod chart;
mod help;
mod theme;
pub mod widgets;

pub use help::HelpOverlay;
pub use theme::Theme;
