//! Modality share chart: one horizontal bar per modality
//!
//! `Pregão - Eletrônico  ████████▌        12   57,1%`

use ratatui::prelude::*;

use crate::format;
use crate::store::ModalityCount;
use crate::themes::Theme;

/// Eighth-block characters for fractional bar ends
const PARTIAL_BLOCKS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];
const FULL_BLOCK: char = '█';

const COUNT_WIDTH: u16 = 6;
const PERCENT_WIDTH: u16 = 8;
/// Gaps around the bar plus the two numeric columns
const FIXED_WIDTH: u16 = 2 + 1 + COUNT_WIDTH + PERCENT_WIDTH;

/// Bar string of `fraction` (0..=1) of `width` cells, eighth-cell resolution
pub fn bar(fraction: f64, width: usize) -> String {
    let eighths = (fraction.clamp(0.0, 1.0) * width as f64 * 8.0).round() as usize;
    let full = eighths / 8;
    let rest = eighths % 8;
    let mut out: String = std::iter::repeat(FULL_BLOCK).take(full).collect();
    if rest > 0 && full < width {
        out.push(PARTIAL_BLOCKS[rest]);
    }
    out
}

/// Horizontal bar chart of procurement counts per modality
pub struct ModalityChart<'a> {
    rows: &'a [ModalityCount],
    theme: &'a Theme,
}

impl<'a> ModalityChart<'a> {
    pub fn new(rows: &'a [ModalityCount], theme: &'a Theme) -> Self {
        Self { rows, theme }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width < 20 {
            return;
        }

        let total: u64 = self.rows.iter().map(|r| r.count).sum();
        if total == 0 {
            let msg = "Sem dados";
            let x = area.x + area.width.saturating_sub(msg.len() as u16) / 2;
            buf.set_string(x, area.y + area.height / 2, msg, Style::default().fg(self.theme.text_muted));
            return;
        }

        let label_width = self
            .rows
            .iter()
            .map(|r| r.label.chars().count() as u16)
            .max()
            .unwrap_or(0)
            .min(area.width / 3)
            .min(area.width - FIXED_WIDTH);
        let bar_x = area.x + label_width + 2;
        // label + FIXED_WIDTH + bar_width == area.width, so the percent column ends at area.right()
        let bar_width = area.width - label_width - FIXED_WIDTH;
        let max_count = self.rows.iter().map(|r| r.count).max().unwrap_or(1).max(1);

        for (i, row) in self.rows.iter().enumerate() {
            if i as u16 >= area.height {
                break;
            }
            let y = area.y + i as u16;
            let color = self.theme.series_color(i);

            buf.set_string(
                area.x,
                y,
                format::fit(&row.label, label_width as usize),
                Style::default().fg(self.theme.text_secondary),
            );

            // Bars are scaled to the largest modality so small shares stay visible
            let fraction = row.count as f64 / max_count as f64;
            buf.set_string(bar_x, y, bar(fraction, bar_width as usize), Style::default().fg(color));

            let count_x = bar_x + bar_width + 1;
            buf.set_string(
                count_x,
                y,
                format!("{:>width$}", row.count, width = COUNT_WIDTH as usize),
                Style::default().fg(self.theme.text_primary).bold(),
            );
            buf.set_string(
                count_x + COUNT_WIDTH,
                y,
                format!("{:>width$}", format::percent(row.count, total), width = PERCENT_WIDTH as usize),
                Style::default().fg(self.theme.text_muted),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(label: &str, count: u64) -> ModalityCount {
        ModalityCount {
            modality_code: None,
            label: label.to_string(),
            count,
            estimated_value: 0.0,
        }
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_bar_resolution() {
        assert_eq!(bar(1.0, 4), "████");
        assert_eq!(bar(0.5, 4), "██");
        assert_eq!(bar(0.0, 4), "");
        assert_eq!(bar(0.125, 2), "▎");
        assert_eq!(bar(2.0, 3), "███");
    }

    #[test]
    fn test_rows_show_count_and_share() {
        let theme = Theme::default();
        let rows = vec![count("Pregão - Eletrônico", 2), count("Dispensa de Licitação", 1)];
        let area = Rect::new(0, 0, 80, 3);
        let mut buf = Buffer::empty(area);
        ModalityChart::new(&rows, &theme).render(area, &mut buf);

        let first = row_text(&buf, 0);
        assert!(first.contains("Pregão - Eletrônico"));
        assert!(first.contains("66,7%"));
        let second = row_text(&buf, 1);
        assert!(second.contains("Dispensa de Licitação"));
        assert!(second.contains("33,3%"));
    }

    #[test]
    fn test_narrow_chart_stays_inside_area() {
        let theme = Theme::default();
        let rows = vec![count("Pregão - Eletrônico", 2), count("Dispensa de Licitação", 1)];
        for width in 20..=40 {
            let mut buf = Buffer::empty(Rect::new(0, 0, 60, 2));
            ModalityChart::new(&rows, &theme).render(Rect::new(0, 0, width, 2), &mut buf);

            for y in 0..2 {
                let text = row_text(&buf, y);
                let outside: String = text.chars().skip(width as usize).collect();
                assert!(outside.trim().is_empty(), "width {} row {}: {:?}", width, y, text);
            }
            assert!(row_text(&buf, 0).contains("66,7%"), "width {}", width);
            assert!(row_text(&buf, 1).contains("33,3%"), "width {}", width);
        }
    }

    #[test]
    fn test_empty_chart() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        ModalityChart::new(&[], &theme).render(area, &mut buf);
        assert!(row_text(&buf, 1).contains("Sem dados"));
    }
}
