//! Status bar component
//!
//! Bottom bar: brand mark, municipality, monitor state, clock, help hint.

use chrono::{Local, NaiveDateTime};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Widget};

use crate::themes::Theme;
use crate::ui::borders::Separators;

/// State of the background monitoring task
#[derive(Clone, Debug, Default, PartialEq)]
pub enum MonitorStatus {
    #[default]
    Idle,
    Running,
    Finished {
        inserted: usize,
        at: NaiveDateTime,
    },
    Failed(String),
}

impl MonitorStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn label(&self) -> String {
        match self {
            Self::Idle => "Monitor ocioso".to_string(),
            Self::Running => "Monitorando...".to_string(),
            Self::Finished { inserted, at } => {
                format!("{} nova(s) às {}", inserted, at.format("%H:%M"))
            }
            Self::Failed(_) => "Falha no monitoramento".to_string(),
        }
    }

    pub fn color(&self, theme: &Theme) -> Color {
        match self {
            Self::Idle => theme.text_muted,
            Self::Running => theme.info,
            Self::Finished { .. } => theme.success,
            Self::Failed(_) => theme.error,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Idle => Separators::CIRCLE_EMPTY,
            Self::Running => Separators::CIRCLE_FILLED,
            Self::Finished { .. } => Separators::CHECK,
            Self::Failed(_) => Separators::CROSS,
        }
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    theme: &'a Theme,
    municipality: &'a str,
    monitor: &'a MonitorStatus,
    key_metrics: Vec<(String, String)>,
}

impl<'a> StatusBar<'a> {
    pub fn new(theme: &'a Theme, municipality: &'a str, monitor: &'a MonitorStatus) -> Self {
        Self {
            theme,
            municipality,
            monitor,
            key_metrics: Vec::new(),
        }
    }

    /// Add a key metric
    pub fn metric(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.key_metrics.push((label.into(), value.into()));
        self
    }

    fn separator(&self) -> Span<'static> {
        Span::styled(
            format!(" {} ", Separators::VERTICAL),
            Style::default().fg(self.theme.border),
        )
    }

    fn build_content(&self) -> Line<'a> {
        let mut spans = vec![
            Span::styled(
                format!("{} PNCP", Separators::DIAMOND),
                Style::default().fg(self.theme.accent).bold(),
            ),
            self.separator(),
            Span::styled(
                self.municipality.to_string(),
                Style::default().fg(self.theme.text_secondary),
            ),
            self.separator(),
        ];

        let color = self.monitor.color(self.theme);
        spans.push(Span::styled(
            format!("{} {}", self.monitor.glyph(), self.monitor.label()),
            Style::default().fg(color),
        ));

        for (label, value) in &self.key_metrics {
            spans.push(self.separator());
            spans.push(Span::styled(
                format!("{}: ", label),
                Style::default().fg(self.theme.text_secondary),
            ));
            spans.push(Span::styled(
                value.clone(),
                Style::default().fg(self.theme.text_primary),
            ));
        }

        spans.push(self.separator());
        spans.push(Span::styled(
            Local::now().format("%H:%M:%S").to_string(),
            Style::default().fg(self.theme.text_muted),
        ));

        spans.push(self.separator());
        spans.push(Span::styled(
            "[?] Ajuda",
            Style::default().fg(self.theme.text_muted),
        ));

        Line::from(spans)
    }
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let bg_style = Style::default().bg(self.theme.surface);
        for x in area.x..area.right() {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_style(bg_style);
            }
        }

        Paragraph::new(self.build_content()).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn line(buf: &Buffer) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_renders_municipality_and_state() {
        let theme = Theme::default();
        let status = MonitorStatus::Running;
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new(&theme, "Pádua - RJ", &status)
            .metric("Total", "12")
            .render(area, &mut buf);

        let text = line(&buf);
        assert!(text.contains("PNCP"));
        assert!(text.contains("Pádua - RJ"));
        assert!(text.contains("Monitorando..."));
        assert!(text.contains("Total: 12"));
        assert!(text.contains("[?] Ajuda"));
    }

    #[test]
    fn test_monitor_labels() {
        let at = NaiveDate::from_ymd_opt(2025, 5, 12)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        assert_eq!(
            MonitorStatus::Finished { inserted: 3, at }.label(),
            "3 nova(s) às 09:05"
        );
        assert!(!MonitorStatus::Idle.is_running());
        assert!(MonitorStatus::Running.is_running());
    }
}
