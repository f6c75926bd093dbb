//! Procurement table widget - one page of the listing with a selection cursor

use ratatui::prelude::*;

use crate::format;
use crate::store::Procurement;
use crate::themes::Theme;
use crate::ui::borders::rule;

const EMPTY_TEXT: &str = "Nenhuma contratação encontrada";

/// Fixed columns; "Objeto" takes what is left
const NUMBER_WIDTH: u16 = 12;
const MODALITY_WIDTH: u16 = 22;
const VALUE_WIDTH: u16 = 17;
const DATE_WIDTH: u16 = 10;
const MIN_DESCRIPTION_WIDTH: u16 = 10;

/// Procurement table widget
pub struct ProcurementTable {
    rows: Vec<Procurement>,
    selected: usize,
}

impl ProcurementTable {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            selected: 0,
        }
    }

    /// Replace the rows; selection is kept in bounds
    pub fn update(&mut self, rows: Vec<Procurement>) {
        self.rows = rows;
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Move selection up
    pub fn up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    /// Move selection down
    pub fn down(&mut self) {
        if self.selected < self.rows.len().saturating_sub(1) {
            self.selected += 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&Procurement> {
        self.rows.get(self.selected)
    }

    fn description_width(area: Rect) -> u16 {
        let fixed = NUMBER_WIDTH + MODALITY_WIDTH + VALUE_WIDTH + DATE_WIDTH + 4;
        area.width.saturating_sub(fixed).max(MIN_DESCRIPTION_WIDTH)
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        if self.rows.is_empty() {
            let len = EMPTY_TEXT.chars().count() as u16;
            buf.set_string(
                area.x + area.width.saturating_sub(len) / 2,
                area.y + area.height / 2,
                EMPTY_TEXT,
                Style::default().fg(theme.text_muted),
            );
            return;
        }

        let widths = [
            NUMBER_WIDTH,
            Self::description_width(area),
            MODALITY_WIDTH,
            VALUE_WIDTH,
            DATE_WIDTH,
        ];
        let header = ["Número", "Objeto", "Modalidade", "Valor Estimado", "Data"];
        let header_style = Style::default().fg(theme.text_primary).bold();

        let mut x = area.x;
        for (col, width) in header.iter().zip(widths) {
            if x >= area.right() {
                break;
            }
            buf.set_stringn(x, area.y, col, (area.right() - x) as usize, header_style);
            x = x.saturating_add(width + 1);
        }

        if area.height < 2 {
            return;
        }
        buf.set_string(
            area.x,
            area.y + 1,
            rule(area.width as usize),
            Style::default().fg(theme.border),
        );

        let data_start_y = area.y + 2;
        let visible_rows = (area.height as usize).saturating_sub(2);
        if visible_rows == 0 {
            return;
        }

        // Keep the selected row on screen
        let scroll_offset = if self.selected >= visible_rows {
            self.selected - visible_rows + 1
        } else {
            0
        };

        for (i, record) in self.rows.iter().skip(scroll_offset).take(visible_rows).enumerate() {
            let y = data_start_y + i as u16;
            let is_selected = i + scroll_offset == self.selected;
            let row_style = if is_selected {
                Style::default().bg(theme.surface_elevated)
            } else {
                Style::default().bg(theme.background)
            };

            let value = record
                .estimated_value
                .map(format::currency)
                .unwrap_or_else(|| "-".to_string());
            let published = record.published_at.as_deref().map(format::date).unwrap_or_else(|| "-".to_string());
            let cells = [
                (record.display_number(), theme.accent),
                (record.description.clone().unwrap_or_default(), theme.text_primary),
                (record.modality_label(), theme.text_secondary),
                (value, theme.accent_secondary),
                (published, theme.text_muted),
            ];

            let mut x = area.x;
            for ((text, color), width) in cells.iter().zip(widths) {
                if x >= area.right() {
                    break;
                }
                let width = width.min(area.right() - x);
                let mut style = row_style.fg(*color);
                if is_selected {
                    style = style.bold();
                }
                buf.set_string(x, y, format::fit(text, width as usize), style);
                x = x.saturating_add(width + 1);
            }
        }
    }
}

impl Default for ProcurementTable {
    fn default() -> Self {
        Self::new()
    }
}
