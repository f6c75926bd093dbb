//! View modules for the dashboard pages

use anyhow::Result;
use ratatui::prelude::*;

pub mod overview;
pub mod procurements;
pub mod statistics;

pub use overview::{OverviewData, OverviewView};
pub use procurements::{ProcurementPage, ProcurementsView};
pub use statistics::StatisticsView;

/// Available views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Overview,
    Procurements,
    Statistics,
}

impl View {
    /// Next page for Tab
    pub fn next(self) -> Self {
        match self {
            Self::Overview => Self::Procurements,
            Self::Procurements => Self::Statistics,
            Self::Statistics => Self::Overview,
        }
    }

    /// Sidebar item id
    pub fn id(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Procurements => "procurements",
            Self::Statistics => "statistics",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Overview => "Início",
            Self::Procurements => "Contratações",
            Self::Statistics => "Estatísticas",
        }
    }

    pub fn from_shortcut(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Overview),
            '2' => Some(Self::Procurements),
            '3' => Some(Self::Statistics),
            _ => None,
        }
    }
}

/// Action returned by a view's key handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    /// Key handled (or ignored), nothing else to do
    Continue,
    /// The view changed its query and needs fresh data
    Reload,
}

/// Trait for views that can be rendered
pub trait ViewTrait {
    /// Render the view
    fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<()>;

    /// Handle key input
    fn handle_key(&mut self, _key: crossterm::event::KeyCode) -> Result<ViewAction> {
        Ok(ViewAction::Continue)
    }
}

/// What a page currently has to show
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

/// Page data plus the ticket of the load in flight.
///
/// Every load gets a new ticket; results carrying an older ticket are
/// dropped, so a slow reload can never overwrite a newer one.
#[derive(Debug)]
pub struct Loadable<T> {
    state: LoadState<T>,
    ticket: u64,
    started: bool,
}

impl<T> Loadable<T> {
    pub fn new() -> Self {
        Self {
            state: LoadState::Loading,
            ticket: 0,
            started: false,
        }
    }

    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }

    /// Whether any load was ever requested
    pub fn started(&self) -> bool {
        self.started
    }

    /// Start a load and return its ticket. Data already shown is kept
    /// unless `show_skeleton` is set.
    pub fn begin(&mut self, show_skeleton: bool) -> u64 {
        self.ticket += 1;
        self.started = true;
        if show_skeleton || !matches!(self.state, LoadState::Ready(_)) {
            self.state = LoadState::Loading;
        }
        self.ticket
    }

    /// Apply a load result; returns false when the ticket is stale
    pub fn finish(&mut self, ticket: u64, result: std::result::Result<T, String>) -> bool {
        if ticket != self.ticket {
            return false;
        }
        self.state = match result {
            Ok(data) => LoadState::Ready(data),
            Err(message) => LoadState::Failed(message),
        };
        true
    }
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self::new()
    }
}
