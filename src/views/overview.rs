//! Overview view - headline figures and the run log

use anyhow::Result;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::format;
use crate::store::{RunRecord, Statistics};
use crate::themes::Theme;
use crate::ui::animation::Pulse;
use crate::ui::borders::Separators;
use crate::ui::panels::{render_message, Panel, PanelStyle};
use crate::ui::skeleton::Skeleton;
use crate::widgets::StatCard;

use super::{LoadState, Loadable};

/// Everything the overview shows, loaded in one go
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewData {
    pub statistics: Statistics,
    pub runs: Vec<RunRecord>,
}

/// Overview view - aggregate dashboard figures
pub struct OverviewView {
    theme: Theme,
    recent_window_days: u32,
    pub data: Loadable<OverviewData>,
    pulse: Pulse,
}

impl OverviewView {
    pub fn new(theme: Theme, recent_window_days: u32) -> Self {
        Self {
            theme,
            recent_window_days,
            data: Loadable::new(),
            pulse: Pulse::default(),
        }
    }

    fn render_cards(&self, frame: &mut Frame, area: Rect, stats: &Statistics) {
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        let last_update = stats
            .last_capture
            .as_deref()
            .map(format::date)
            .unwrap_or_else(|| "-".to_string());
        let recent_title = format!("Novas ({} dias)", self.recent_window_days);

        frame.render_widget(
            StatCard::new(&self.theme, "Total de Contratações", stats.total.to_string())
                .caption("registradas"),
            cards[0],
        );
        frame.render_widget(
            StatCard::new(
                &self.theme,
                "Valor Total Estimado",
                format::currency(stats.total_estimated_value),
            )
            .color(self.theme.accent_secondary),
            cards[1],
        );
        frame.render_widget(
            StatCard::new(&self.theme, "Última Atualização", last_update)
                .color(self.theme.text_primary),
            cards[2],
        );
        frame.render_widget(
            StatCard::new(&self.theme, &recent_title, stats.recent.to_string())
                .caption("publicadas no período")
                .color(self.theme.success),
            cards[3],
        );
    }

    fn render_runs(&self, frame: &mut Frame, area: Rect, runs: &[RunRecord]) {
        let block = Panel::new(&self.theme).title("Últimas execuções").block();
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if runs.is_empty() {
            frame.render_widget(
                Paragraph::new("Nenhuma execução registrada")
                    .style(Style::default().fg(self.theme.text_muted))
                    .alignment(Alignment::Center),
                inner,
            );
            return;
        }

        let lines: Vec<Line> = runs
            .iter()
            .take(inner.height as usize)
            .map(|run| {
                let (glyph, color) = if run.success {
                    (Separators::CHECK, self.theme.success)
                } else {
                    (Separators::CROSS, self.theme.error)
                };
                Line::from(vec![
                    Span::styled(format!("{} ", glyph), Style::default().fg(color)),
                    Span::styled(
                        format!("{:<20}", format::datetime(&run.executed_at)),
                        Style::default().fg(self.theme.text_secondary),
                    ),
                    Span::styled(
                        format!(
                            "{:>4} encontradas {:>4} novas  ",
                            run.found, run.inserted
                        ),
                        Style::default().fg(self.theme.text_primary),
                    ),
                    Span::styled(run.message.clone(), Style::default().fg(self.theme.text_muted)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl super::ViewTrait for OverviewView {
    fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let bg = Block::default().style(Style::default().bg(self.theme.background));
        frame.render_widget(bg, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(5), // Cards
                Constraint::Min(3),    // Runs
            ])
            .margin(1)
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(format!("{} ", Separators::DIAMOND), Style::default().fg(self.theme.accent)),
            Span::styled("Início", Style::default().fg(self.theme.text_primary).bold()),
            Span::styled(format!("  {}  ", Separators::VERTICAL), Style::default().fg(self.theme.border)),
            Span::styled("Resumo das contratações monitoradas", Style::default().fg(self.theme.text_muted)),
        ]));
        frame.render_widget(header, chunks[0]);

        let body = chunks[1].union(chunks[2]);
        match self.data.state() {
            LoadState::Loading => {
                frame.render_widget(Skeleton::new(&self.theme, "Carregando", self.pulse.level()), body);
            }
            LoadState::Failed(message) => {
                render_message(
                    body,
                    frame.buffer_mut(),
                    &self.theme,
                    "Erro ao carregar",
                    message,
                    PanelStyle::Error,
                );
            }
            LoadState::Ready(data) => {
                self.render_cards(frame, chunks[1], &data.statistics);
                self.render_runs(frame, chunks[2], &data.runs);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::ViewTrait;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn draw(view: &mut OverviewView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal
            .draw(|f| {
                view.render(f, f.area()).unwrap();
            })
            .unwrap();
        let buf = terminal.backend().buffer().clone();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn stats() -> Statistics {
        Statistics {
            total: 3,
            total_estimated_value: 8_594_291.51,
            last_capture: Some("2025-05-14 10:00:00".to_string()),
            recent: 2,
            by_modality: Vec::new(),
        }
    }

    #[test]
    fn test_cards_render() {
        let mut view = OverviewView::new(Theme::default(), 30);
        let ticket = view.data.begin(true);
        view.data.finish(
            ticket,
            Ok(OverviewData {
                statistics: stats(),
                runs: vec![RunRecord {
                    id: 1,
                    executed_at: "2025-05-14 10:00:00".to_string(),
                    found: 5,
                    inserted: 3,
                    success: true,
                    message: "Sucesso".to_string(),
                }],
            }),
        );

        let out = draw(&mut view);
        assert!(out.contains("Total de Contratações"));
        assert!(out.contains("R$ 8.594.291,51"));
        assert!(out.contains("14/05/2025"));
        assert!(out.contains("Novas (30 dias)"));
        assert!(out.contains("Sucesso"));
    }

    #[test]
    fn test_missing_capture_shows_dash() {
        let mut view = OverviewView::new(Theme::default(), 30);
        let ticket = view.data.begin(true);
        let mut statistics = stats();
        statistics.last_capture = None;
        view.data.finish(ticket, Ok(OverviewData { statistics, runs: Vec::new() }));

        let out = draw(&mut view);
        assert!(out.contains("Última Atualização"));
        assert!(out.contains("Nenhuma execução registrada"));
    }

    #[test]
    fn test_failure_shows_error_panel() {
        let mut view = OverviewView::new(Theme::default(), 30);
        let ticket = view.data.begin(true);
        view.data.finish(ticket, Err("database is locked".to_string()));
        let out = draw(&mut view);
        assert!(out.contains("Erro ao carregar"));
        assert!(out.contains("database is locked"));
    }

    #[test]
    fn test_loading_shows_skeleton() {
        let mut view = OverviewView::new(Theme::default(), 30);
        view.data.begin(true);
        assert!(draw(&mut view).contains("Carregando"));
    }
}
