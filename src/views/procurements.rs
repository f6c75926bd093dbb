//! Procurements view - paged listing with modality filter

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::api::Modality;
use crate::store::{ListFilter, Procurement};
use crate::themes::Theme;
use crate::ui::animation::Pulse;
use crate::ui::borders::Separators;
use crate::ui::panels::{render_message, Panel, PanelStyle};
use crate::ui::skeleton::Skeleton;
use crate::widgets::ProcurementTable;

use super::{LoadState, Loadable, ViewAction};

pub const PAGE_SIZE: usize = 20;

/// One page of the listing as returned by the loader
#[derive(Debug, Clone, PartialEq)]
pub struct ProcurementPage {
    pub items: Vec<Procurement>,
    /// Rows matching the filter across all pages
    pub total: u64,
    /// Modalities present in the store, for the filter cycle
    pub modalities: Vec<Modality>,
}

/// What to fetch for the current page
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub filter: ListFilter,
    pub limit: usize,
    pub offset: usize,
}

pub struct ProcurementsView {
    theme: Theme,
    table: ProcurementTable,
    page: usize,
    filter: Option<Modality>,
    available: Vec<Modality>,
    data: Loadable<ProcurementPage>,
    pulse: Pulse,
}

impl ProcurementsView {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            table: ProcurementTable::new(),
            page: 0,
            filter: None,
            available: Vec::new(),
            data: Loadable::new(),
            pulse: Pulse::default(),
        }
    }

    pub fn query(&self) -> PageQuery {
        PageQuery {
            filter: ListFilter {
                modality: self.filter,
                ..ListFilter::default()
            },
            limit: PAGE_SIZE,
            offset: self.page * PAGE_SIZE,
        }
    }

    pub fn started(&self) -> bool {
        self.data.started()
    }

    pub fn begin(&mut self, show_skeleton: bool) -> u64 {
        self.data.begin(show_skeleton)
    }

    /// Apply a load result, refreshing the table when it is current
    pub fn apply(&mut self, ticket: u64, result: std::result::Result<ProcurementPage, String>) {
        if !self.data.finish(ticket, result) {
            return;
        }
        if let LoadState::Ready(page) = self.data.state() {
            self.table.update(page.items.clone());
            self.available = page.modalities.clone();
        }
    }

    fn total(&self) -> u64 {
        match self.data.state() {
            LoadState::Ready(page) => page.total,
            _ => 0,
        }
    }

    fn page_count(&self) -> usize {
        (self.total() as usize).div_ceil(PAGE_SIZE).max(1)
    }

    /// All -> each present modality -> all
    fn cycle_filter(&mut self) {
        self.filter = match self.filter {
            None => self.available.first().copied(),
            Some(current) => self
                .available
                .iter()
                .position(|m| *m == current)
                .and_then(|i| self.available.get(i + 1))
                .copied(),
        };
    }

    fn filter_label(&self) -> &'static str {
        self.filter.map(Modality::label).unwrap_or("Todas")
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let sep = || {
            Span::styled(
                format!("  {}  ", Separators::VERTICAL),
                Style::default().fg(self.theme.border),
            )
        };
        let header = Paragraph::new(Line::from(vec![
            Span::styled(format!("{} ", Separators::DIAMOND), Style::default().fg(self.theme.accent)),
            Span::styled("Contratações", Style::default().fg(self.theme.text_primary).bold()),
            sep(),
            Span::styled(
                format!("{} registro(s)", self.total()),
                Style::default().fg(self.theme.text_secondary),
            ),
            sep(),
            Span::styled("Modalidade: ", Style::default().fg(self.theme.text_muted)),
            Span::styled(self.filter_label(), Style::default().fg(self.theme.accent)),
            sep(),
            Span::styled(
                format!("Página {}/{}", self.page + 1, self.page_count()),
                Style::default().fg(self.theme.text_muted),
            ),
        ]));
        frame.render_widget(header, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let link = self
            .table
            .selected()
            .and_then(|p| p.portal_link.as_deref())
            .unwrap_or("-");
        let footer = Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{} ", Separators::ARROW_RIGHT),
                Style::default().fg(self.theme.accent),
            ),
            Span::styled(link.to_string(), Style::default().fg(self.theme.info).underlined()),
            Span::styled(
                "   [j/k] mover  [n/p] página  [f] modalidade",
                Style::default().fg(self.theme.text_muted),
            ),
        ]));
        frame.render_widget(footer, area);
    }
}

impl super::ViewTrait for ProcurementsView {
    fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let bg = Block::default().style(Style::default().bg(self.theme.background));
        frame.render_widget(bg, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(4),    // Table
                Constraint::Length(1), // Footer
            ])
            .margin(1)
            .split(area);

        self.render_header(frame, chunks[0]);

        match self.data.state() {
            LoadState::Loading => {
                frame.render_widget(
                    Skeleton::new(&self.theme, "Carregando", self.pulse.level()),
                    chunks[1],
                );
            }
            LoadState::Failed(message) => {
                render_message(
                    chunks[1],
                    frame.buffer_mut(),
                    &self.theme,
                    "Erro ao carregar",
                    message,
                    PanelStyle::Error,
                );
            }
            LoadState::Ready(_) => {
                let block = Panel::new(&self.theme).style(PanelStyle::Focused).block();
                let inner = block.inner(chunks[1]);
                frame.render_widget(block, chunks[1]);
                self.table.render(inner, frame.buffer_mut(), &self.theme);
                self.render_footer(frame, chunks[2]);
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) -> Result<ViewAction> {
        let action = match key {
            KeyCode::Char('j') | KeyCode::Down => {
                self.table.down();
                ViewAction::Continue
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.table.up();
                ViewAction::Continue
            }
            KeyCode::Char('n') | KeyCode::PageDown if self.page + 1 < self.page_count() => {
                self.page += 1;
                self.table.select_first();
                ViewAction::Reload
            }
            KeyCode::Char('p') | KeyCode::PageUp if self.page > 0 => {
                self.page -= 1;
                self.table.select_first();
                ViewAction::Reload
            }
            KeyCode::Char('f') => {
                self.cycle_filter();
                self.page = 0;
                self.table.select_first();
                ViewAction::Reload
            }
            _ => ViewAction::Continue,
        };
        Ok(action)
    }
}
