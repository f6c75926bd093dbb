//! UI components module
//!
//! Reusable UI components for the dashboard: panels, borders, sidebar,
//! status bar, help overlay, loading skeleton and animations.

pub mod animation;
pub mod borders;
pub mod help_overlay;
pub mod panels;
pub mod sidebar;
pub mod skeleton;
pub mod status_bar;

pub use help_overlay::HelpOverlay;
pub use panels::{InfoBox, Panel, PanelStyle};
pub use sidebar::Sidebar;
pub use skeleton::Skeleton;
pub use status_bar::{MonitorStatus, StatusBar};
