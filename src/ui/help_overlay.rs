//! Help overlay
//!
//! Keyboard shortcuts reference overlay.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

use crate::themes::Theme;

/// A keyboard shortcut entry
struct ShortcutEntry {
    key: &'static str,
    description: &'static str,
}

const NAVIGATION: &[ShortcutEntry] = &[
    ShortcutEntry { key: "1", description: "Início" },
    ShortcutEntry { key: "2", description: "Contratações" },
    ShortcutEntry { key: "3", description: "Estatísticas" },
    ShortcutEntry { key: "Tab", description: "Próxima página" },
];

const GENERAL: &[ShortcutEntry] = &[
    ShortcutEntry { key: "r", description: "Recarregar página" },
    ShortcutEntry { key: "m", description: "Executar monitoramento" },
    ShortcutEntry { key: "?", description: "Esta ajuda" },
    ShortcutEntry { key: "q/Esc", description: "Sair" },
];

const SIDEBAR: &[ShortcutEntry] = &[
    ShortcutEntry { key: "[", description: "Mostrar/ocultar menu" },
    ShortcutEntry { key: "]", description: "Fixar menu" },
];

const LISTING: &[ShortcutEntry] = &[
    ShortcutEntry { key: "j/k ↑/↓", description: "Mover seleção" },
    ShortcutEntry { key: "n/p", description: "Página seguinte/anterior" },
    ShortcutEntry { key: "f", description: "Filtrar modalidade" },
];

/// Help overlay showing keyboard shortcuts
pub struct HelpOverlay {
    pub visible: bool,
}

impl HelpOverlay {
    pub fn new() -> Self {
        Self { visible: false }
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Render a section of shortcuts
    fn render_section(
        &self,
        title: &str,
        shortcuts: &[ShortcutEntry],
        area: Rect,
        buf: &mut Buffer,
        theme: &Theme,
    ) {
        if area.height == 0 {
            return;
        }
        Paragraph::new(title)
            .style(Style::default().fg(theme.text_secondary).underlined())
            .render(Rect::new(area.x, area.y, area.width, 1), buf);

        for (i, entry) in shortcuts.iter().enumerate() {
            if i as u16 + 1 >= area.height {
                break;
            }
            let y = area.y + i as u16 + 1;

            Paragraph::new(format!("{:>10}", entry.key))
                .style(Style::default().fg(theme.accent).bold())
                .render(Rect::new(area.x, y, 10.min(area.width), 1), buf);

            Paragraph::new(format!("  {}", entry.description))
                .style(Style::default().fg(theme.text_primary))
                .render(
                    Rect::new(area.x + 10, y, area.width.saturating_sub(10), 1),
                    buf,
                );
        }
    }

    /// Render the help overlay
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if !self.visible {
            return;
        }

        // Centered, 70% width, 70% height
        let width = ((area.width as f32 * 0.7) as u16).min(area.width.saturating_sub(4));
        let height = ((area.height as f32 * 0.7) as u16).min(area.height.saturating_sub(2));
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let overlay_area = Rect { x, y, width, height };

        Clear.render(overlay_area, buf);

        let block = Block::default()
            .title(" Atalhos de teclado ")
            .title_style(Style::default().fg(theme.accent).bold())
            .borders(Borders::ALL)
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(Style::default().fg(theme.border))
            .style(Style::default().bg(theme.surface_elevated));

        let inner = block.inner(overlay_area);
        block.render(overlay_area, buf);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(inner);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(NAVIGATION.len() as u16 + 1),
                Constraint::Length(1),
                Constraint::Length(GENERAL.len() as u16 + 1),
                Constraint::Min(0),
            ])
            .split(columns[0]);
        self.render_section("Navegação", NAVIGATION, left[0], buf, theme);
        self.render_section("Geral", GENERAL, left[2], buf, theme);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(LISTING.len() as u16 + 1),
                Constraint::Length(1),
                Constraint::Length(SIDEBAR.len() as u16 + 1),
                Constraint::Min(0),
            ])
            .split(columns[1]);
        self.render_section("Contratações", LISTING, right[0], buf, theme);
        self.render_section("Menu lateral", SIDEBAR, right[2], buf, theme);

        if inner.height >= 2 {
            Paragraph::new("[Qualquer tecla fecha]")
                .style(Style::default().fg(theme.text_muted))
                .alignment(Alignment::Center)
                .render(Rect::new(inner.x, inner.bottom() - 1, inner.width, 1), buf);
        }
    }
}

impl Default for HelpOverlay {
    fn default() -> Self {
        Self::new()
    }
}
