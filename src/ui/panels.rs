//! Reusable panel components
//!
//! Provides styled panels with consistent theming.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Widget};

use crate::themes::Theme;

/// Panel style variants
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelStyle {
    /// Default panel style
    #[default]
    Default,
    /// Focused panel (highlighted border)
    Focused,
    /// Error state
    Error,
}

/// A styled panel component
#[derive(Clone)]
pub struct Panel<'a> {
    title: Option<&'a str>,
    style: PanelStyle,
    theme: &'a Theme,
    padding: Padding,
}

impl<'a> Panel<'a> {
    /// Create a new panel with the given theme
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            title: None,
            style: PanelStyle::Default,
            theme,
            padding: Padding::horizontal(1),
        }
    }

    /// Set the panel title
    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    /// Set the panel style
    pub fn style(mut self, style: PanelStyle) -> Self {
        self.style = style;
        self
    }

    /// Build the Block widget
    pub fn block(&self) -> Block<'a> {
        let (border_color, title_color) = match self.style {
            PanelStyle::Default => (self.theme.border, self.theme.text_secondary),
            PanelStyle::Focused => (self.theme.border_focused, self.theme.accent),
            PanelStyle::Error => (self.theme.error, self.theme.error),
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .padding(self.padding);

        if let Some(title) = self.title {
            block = block
                .title(format!(" {} ", title))
                .title_style(Style::default().fg(title_color).bold());
        }

        block
    }
}

/// Label/value rows inside a panel
pub struct InfoBox<'a> {
    items: Vec<(&'a str, String)>,
    theme: &'a Theme,
    title: Option<&'a str>,
}

impl<'a> InfoBox<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            items: Vec::new(),
            theme,
            title: None,
        }
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    pub fn item(mut self, label: &'a str, value: impl Into<String>) -> Self {
        self.items.push((label, value.into()));
        self
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let panel = Panel::new(self.theme);
        let panel = if let Some(title) = self.title {
            panel.title(title)
        } else {
            panel
        };

        let block = panel.block();
        let inner = block.inner(area);
        block.render(area, buf);

        let label_width = self
            .items
            .iter()
            .map(|(label, _)| label.chars().count() as u16 + 2)
            .max()
            .unwrap_or(0)
            .min(inner.width / 2);

        for (i, (label, value)) in self.items.iter().enumerate() {
            if i as u16 >= inner.height {
                break;
            }

            let y = inner.y + i as u16;
            Paragraph::new(format!("{}:", label))
                .style(Style::default().fg(self.theme.text_secondary))
                .render(Rect::new(inner.x, y, label_width, 1), buf);

            Paragraph::new(value.as_str())
                .style(Style::default().fg(self.theme.text_primary).bold())
                .render(
                    Rect::new(inner.x + label_width, y, inner.width.saturating_sub(label_width), 1),
                    buf,
                );
        }
    }
}

/// Centered one-line message inside a panel (errors, empty states)
pub fn render_message(area: Rect, buf: &mut Buffer, theme: &Theme, title: &str, message: &str, style: PanelStyle) {
    let block = Panel::new(theme).title(title).style(style).block();
    let inner = block.inner(area);
    block.render(area, buf);

    let color = match style {
        PanelStyle::Error => theme.error,
        _ => theme.text_muted,
    };
    let y = inner.y + inner.height / 2;
    Paragraph::new(message)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .render(Rect::new(inner.x, y, inner.width, 1.min(inner.height)), buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_text(buf: &Buffer, y: u16) -> String {
        (buf.area.x..buf.area.right())
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_info_box_renders_pairs() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        InfoBox::new(&theme)
            .title("Informações Gerais")
            .item("Total", "12")
            .item("Modalidades", "3")
            .render(area, &mut buf);

        assert!(row_text(&buf, 0).contains("Informações Gerais"));
        let first = row_text(&buf, 1);
        assert!(first.contains("Total:"));
        assert!(first.contains("12"));
        assert!(row_text(&buf, 2).contains("Modalidades:"));
    }

    #[test]
    fn test_render_message_centered() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 30, 5);
        let mut buf = Buffer::empty(area);
        render_message(area, &mut buf, &theme, "Erro", "falhou", PanelStyle::Error);
        assert!(row_text(&buf, 2).contains("falhou"));
    }
}
