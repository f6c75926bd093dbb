//! Stat card widget - one headline figure with a caption

use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::themes::Theme;
use crate::ui::panels::Panel;

/// A single dashboard figure ("Total de Contratações: 12")
pub struct StatCard<'a> {
    title: &'a str,
    value: String,
    caption: Option<String>,
    color: Option<Color>,
    theme: &'a Theme,
}

impl<'a> StatCard<'a> {
    pub fn new(theme: &'a Theme, title: &'a str, value: impl Into<String>) -> Self {
        Self {
            title,
            value: value.into(),
            caption: None,
            color: None,
            theme,
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Value color (defaults to the accent)
    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

impl Widget for StatCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Panel::new(self.theme).title(self.title).block();
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let value_color = self.color.unwrap_or(self.theme.accent);
        let mut lines = vec![Line::from(Span::styled(
            self.value,
            Style::default().fg(value_color).bold(),
        ))];
        if let Some(caption) = self.caption {
            lines.push(Line::from(Span::styled(
                caption,
                Style::default().fg(self.theme.text_muted),
            )));
        }

        // Vertically centre the text block
        let used = (lines.len() as u16).min(inner.height);
        let top = inner.y + (inner.height - used) / 2;
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(Rect::new(inner.x, top, inner.width, used), buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(buf: &Buffer) -> Vec<String> {
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_renders_title_value_caption() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        StatCard::new(&theme, "Total de Contratações", "12")
            .caption("registradas")
            .render(area, &mut buf);

        let rows = rows(&buf);
        assert!(rows[0].contains("Total de Contratações"));
        assert!(rows.iter().any(|r| r.contains("12")));
        assert!(rows.iter().any(|r| r.contains("registradas")));
    }

    #[test]
    fn test_value_uses_custom_color() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        StatCard::new(&theme, "Novas", "7")
            .color(theme.success)
            .render(area, &mut buf);

        let cell = (0..area.width)
            .map(|x| &buf[(x, 1)])
            .find(|c| c.symbol() == "7")
            .expect("value cell");
        assert_eq!(cell.fg, theme.success);
    }
}
