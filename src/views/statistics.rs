//! Statistics view - modality breakdown and general figures

use anyhow::Result;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::format;
use crate::store::Statistics;
use crate::themes::Theme;
use crate::ui::animation::Pulse;
use crate::ui::borders::Separators;
use crate::ui::panels::{render_message, InfoBox, Panel, PanelStyle};
use crate::ui::skeleton::Skeleton;
use crate::widgets::ModalityChart;

use super::{LoadState, Loadable};

pub struct StatisticsView {
    theme: Theme,
    pub data: Loadable<Statistics>,
    pulse: Pulse,
}

impl StatisticsView {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            data: Loadable::new(),
            pulse: Pulse::default(),
        }
    }

    fn render_ready(&self, frame: &mut Frame, area: Rect, stats: &Statistics) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);

        let block = Panel::new(&self.theme).title("Contratações por Modalidade").block();
        let inner = block.inner(columns[0]);
        frame.render_widget(block, columns[0]);
        ModalityChart::new(&stats.by_modality, &self.theme).render(inner, frame.buffer_mut());

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(columns[1]);

        InfoBox::new(&self.theme)
            .title("Informações Gerais")
            .item("Total", stats.total.to_string())
            .item("Modalidades", stats.by_modality.len().to_string())
            .item("Mais comum", stats.most_common_family().unwrap_or("-"))
            .item("Valor total", format::currency_compact(stats.total_estimated_value))
            .render(right[0], frame.buffer_mut());
    }
}

impl super::ViewTrait for StatisticsView {
    fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let bg = Block::default().style(Style::default().bg(self.theme.background));
        frame.render_widget(bg, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(4)])
            .margin(1)
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(format!("{} ", Separators::DIAMOND), Style::default().fg(self.theme.accent)),
            Span::styled("Estatísticas", Style::default().fg(self.theme.text_primary).bold()),
            Span::styled(format!("  {}  ", Separators::VERTICAL), Style::default().fg(self.theme.border)),
            Span::styled("Distribuição por modalidade", Style::default().fg(self.theme.text_muted)),
        ]));
        frame.render_widget(header, chunks[0]);

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
            LoadState::Ready(stats) => self.render_ready(frame, chunks[1], stats),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ModalityCount;
    use crate::views::ViewTrait;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn draw(view: &mut StatisticsView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(130, 14)).unwrap();
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

    #[test]
    fn test_breakdown_and_general_info() {
        let mut view = StatisticsView::new(Theme::default());
        let ticket = view.data.begin(true);
        view.data.finish(
            ticket,
            Ok(Statistics {
                total: 3,
                total_estimated_value: 8_594_291.51,
                last_capture: None,
                recent: 0,
                by_modality: vec![
                    ModalityCount {
                        modality_code: Some(6),
                        label: "Pregão - Eletrônico".to_string(),
                        count: 2,
                        estimated_value: 7_873_699.79,
                    },
                    ModalityCount {
                        modality_code: Some(8),
                        label: "Dispensa de Licitação".to_string(),
                        count: 1,
                        estimated_value: 720_591.72,
                    },
                ],
            }),
        );

        let out = draw(&mut view);
        assert!(out.contains("66,7%"));
        assert!(out.contains("33,3%"));
        assert!(out.contains("Informações Gerais"));
        assert!(out.contains("Pregão"));
    }

    #[test]
    fn test_empty_store_has_dash_family() {
        let mut view = StatisticsView::new(Theme::default());
        let ticket = view.data.begin(true);
        view.data.finish(ticket, Ok(Statistics::default()));
        let out = draw(&mut view);
        assert!(out.contains("Sem dados"));
        assert!(out.contains("Mais comum:"));
    }
}
