//! Auto-hide sidebar
//!
//! Navigation sidebar that can be shown/hidden and pinned.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Widget};
use std::time::{Duration, Instant};

use crate::themes::Theme;
use crate::ui::borders::{rule, Separators};
use crate::ui::status_bar::MonitorStatus;

/// Marker in front of the selected navigation entry
const HIGHLIGHT_SYMBOL: &str = "▸ ";

/// Sidebar navigation item
#[derive(Clone, Debug)]
pub struct SidebarItem {
    pub id: String,
    pub label: String,
    pub shortcut: Option<char>,
    pub active: bool,
}

impl SidebarItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            shortcut: None,
            active: false,
        }
    }

    pub fn shortcut(mut self, shortcut: char) -> Self {
        self.shortcut = Some(shortcut);
        self
    }
}

/// Quick action for sidebar
#[derive(Clone, Debug)]
pub struct QuickAction {
    pub shortcut: char,
    pub label: String,
}

impl QuickAction {
    pub fn new(shortcut: char, label: impl Into<String>) -> Self {
        Self {
            shortcut,
            label: label.into(),
        }
    }
}

/// Auto-hide sidebar state
pub struct Sidebar {
    /// Subtitle under the title (monitored municipality)
    subtitle: String,
    items: Vec<SidebarItem>,
    quick_actions: Vec<QuickAction>,
    /// Shown in the monitor section
    monitor: MonitorStatus,
    selected: usize,
    list_state: ListState,
    /// Whether the sidebar is visible
    pub visible: bool,
    /// Whether the sidebar is pinned (won't auto-hide)
    pub pinned: bool,
    pub width: u16,
    /// Columns from the left edge that reveal the sidebar on hover
    pub hover_zone: u16,
    /// Time when mouse left the sidebar (for hide delay)
    last_mouse_leave: Option<Instant>,
    hide_delay: Duration,
}

impl Sidebar {
    pub fn new(subtitle: impl Into<String>) -> Self {
        Self {
            subtitle: subtitle.into(),
            items: Vec::new(),
            quick_actions: Vec::new(),
            monitor: MonitorStatus::Idle,
            selected: 0,
            list_state: ListState::default().with_selected(Some(0)),
            visible: true,
            pinned: false,
            width: 30,
            hover_zone: 2,
            last_mouse_leave: None,
            hide_delay: Duration::from_millis(500),
        }
    }

    /// Sidebar with the dashboard pages and actions
    pub fn with_default_items(subtitle: impl Into<String>) -> Self {
        let mut sidebar = Self::new(subtitle);

        sidebar.add_item(SidebarItem::new("overview", "Início").shortcut('1'));
        sidebar.add_item(SidebarItem::new("procurements", "Contratações").shortcut('2'));
        sidebar.add_item(SidebarItem::new("statistics", "Estatísticas").shortcut('3'));

        sidebar.add_quick_action(QuickAction::new('m', "Monitorar agora"));
        sidebar.add_quick_action(QuickAction::new('r', "Recarregar"));
        sidebar.add_quick_action(QuickAction::new('?', "Ajuda"));

        sidebar
    }

    pub fn add_item(&mut self, item: SidebarItem) {
        self.items.push(item);
    }

    pub fn add_quick_action(&mut self, action: QuickAction) {
        self.quick_actions.push(action);
    }

    pub fn set_monitor_status(&mut self, status: MonitorStatus) {
        self.monitor = status;
    }

    /// Set the active item by ID
    pub fn set_active(&mut self, id: &str) {
        for (i, item) in self.items.iter_mut().enumerate() {
            item.active = item.id == id;
            if item.active {
                self.selected = i;
                self.list_state.select(Some(i));
            }
        }
    }

    /// Id of the active item
    pub fn active_id(&self) -> Option<&str> {
        self.items.iter().find(|i| i.active).map(|i| i.id.as_str())
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.last_mouse_leave = None;
    }

    /// Hide the sidebar (if not pinned)
    pub fn hide(&mut self) {
        if !self.pinned {
            self.visible = false;
        }
    }

    pub fn toggle(&mut self) {
        if self.visible {
            self.hide();
        } else {
            self.show();
        }
    }

    pub fn toggle_pin(&mut self) {
        self.pinned = !self.pinned;
        if self.pinned {
            self.visible = true;
        }
    }

    /// Handle mouse position (for auto-show/hide)
    pub fn handle_mouse(&mut self, x: u16, _y: u16) {
        if x <= self.hover_zone {
            self.show();
        } else if self.visible && !self.pinned && x > self.width {
            if self.last_mouse_leave.is_none() {
                self.last_mouse_leave = Some(Instant::now());
            }
        } else {
            self.last_mouse_leave = None;
        }
    }

    /// Update hide delay (call every frame)
    pub fn update(&mut self) {
        if let Some(leave_time) = self.last_mouse_leave {
            if leave_time.elapsed() > self.hide_delay {
                self.hide();
                self.last_mouse_leave = None;
            }
        }
    }

    /// Render the sidebar
    pub fn render(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        // Hidden: thin rail on the left edge
        if !self.visible {
            for y in area.y..area.bottom() {
                if let Some(cell) = buf.cell_mut((area.x, y)) {
                    cell.set_symbol(Separators::VERTICAL);
                    cell.set_fg(theme.accent_muted);
                }
            }
            return;
        }

        let sidebar_area = Rect {
            x: area.x,
            y: area.y,
            width: self.width.min(area.width),
            height: area.height,
        };

        Clear.render(sidebar_area, buf);

        let pin_indicator = if self.pinned { " [fixo]" } else { "" };
        let block = Block::default()
            .title(format!(" {} PNCP Monitor{} ", Separators::DIAMOND, pin_indicator))
            .title_style(Style::default().fg(theme.accent).bold())
            .borders(Borders::ALL)
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(Style::default().fg(theme.border))
            .style(Style::default().bg(theme.surface));

        let inner = block.inner(sidebar_area);
        block.render(sidebar_area, buf);

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Subtitle
                Constraint::Length(self.items.len() as u16 + 1),
                Constraint::Length(1), // Separator
                Constraint::Length(3), // Monitor state
                Constraint::Length(1), // Separator
                Constraint::Min(0),    // Quick actions
            ])
            .split(inner);

        Paragraph::new(format!(" {}", self.subtitle))
            .style(Style::default().fg(theme.text_secondary))
            .render(sections[0], buf);

        self.render_navigation(sections[1], buf, theme);

        for idx in [2, 4] {
            Paragraph::new(rule(sections[idx].width as usize))
                .style(Style::default().fg(theme.border))
                .render(sections[idx], buf);
        }

        self.render_monitor(sections[3], buf, theme);
        self.render_quick_actions(sections[5], buf, theme);
    }

    fn render_navigation(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| {
                let marker = if item.active {
                    Separators::DIAMOND
                } else {
                    Separators::DIAMOND_EMPTY
                };

                let shortcut = item
                    .shortcut
                    .map(|s| format!(" [{}]", s))
                    .unwrap_or_default();

                let style = if item.active {
                    Style::default().fg(theme.accent)
                } else {
                    Style::default().fg(theme.text_secondary)
                };

                ListItem::new(format!("{} {}{}", marker, item.label, shortcut)).style(style)
            })
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().fg(theme.text_primary).bold())
            .highlight_symbol(HIGHLIGHT_SYMBOL);

        ratatui::widgets::StatefulWidget::render(list, area, buf, &mut self.list_state);
    }

    fn render_monitor(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if area.height == 0 {
            return;
        }
        Paragraph::new(" Monitor")
            .style(Style::default().fg(theme.text_muted))
            .render(Rect::new(area.x, area.y, area.width, 1), buf);

        if area.height < 2 {
            return;
        }
        Paragraph::new(format!(" {} {}", self.monitor.glyph(), self.monitor.label()))
            .style(Style::default().fg(self.monitor.color(theme)))
            .render(Rect::new(area.x, area.y + 1, area.width, 1), buf);

        if let (MonitorStatus::Failed(reason), true) = (&self.monitor, area.height >= 3) {
            Paragraph::new(format!("   {}", reason))
                .style(Style::default().fg(theme.text_muted))
                .render(Rect::new(area.x, area.y + 2, area.width, 1), buf);
        }
    }

    fn render_quick_actions(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if area.height == 0 {
            return;
        }
        Paragraph::new(" Ações")
            .style(Style::default().fg(theme.text_muted))
            .render(Rect::new(area.x, area.y, area.width, 1), buf);

        for (i, action) in self.quick_actions.iter().enumerate() {
            if i as u16 + 1 >= area.height {
                break;
            }
            Paragraph::new(format!(" [{}] {}", action.shortcut, action.label))
                .style(Style::default().fg(theme.text_secondary))
                .render(Rect::new(area.x, area.y + i as u16 + 1, area.width, 1), buf);
        }
    }

    /// Get the main content area (after sidebar)
    pub fn content_area(&self, area: Rect) -> Rect {
        let used = if self.visible {
            self.width.min(area.width)
        } else {
            1.min(area.width)
        };
        Rect {
            x: area.x + used,
            y: area.y,
            width: area.width - used,
            height: area.height,
        }
    }
}
