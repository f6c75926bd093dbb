//! Loading skeleton
//!
//! Placeholder bars drawn while a page's data is loading. The bar color
//! pulses between the surface and border colors.

use ratatui::prelude::*;
use ratatui::widgets::Widget;

use crate::themes::Theme;
use crate::ui::animation::mix;
use crate::ui::panels::Panel;

const SHADE: &str = "▒";

/// Relative widths of the placeholder lines, repeated down the area
const LINE_WIDTHS: [f32; 4] = [0.9, 0.6, 0.75, 0.4];

pub struct Skeleton<'a> {
    theme: &'a Theme,
    title: &'a str,
    /// Pulse level in `0.0..=1.0`
    level: f32,
}

impl<'a> Skeleton<'a> {
    pub fn new(theme: &'a Theme, title: &'a str, level: f32) -> Self {
        Self { theme, title, level }
    }

    fn color(&self) -> Color {
        mix(self.theme.surface_elevated, self.theme.border, self.level)
    }
}

impl Widget for Skeleton<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Panel::new(self.theme).title(self.title).block();
        let inner = block.inner(area);
        block.render(area, buf);

        let style = Style::default().fg(self.color());
        // Every other row, leaving a blank line between bars
        for (i, y) in (inner.y..inner.bottom()).step_by(2).enumerate() {
            let fraction = LINE_WIDTHS[i % LINE_WIDTHS.len()];
            let width = (inner.width as f32 * fraction) as usize;
            buf.set_string(inner.x, y, SHADE.repeat(width), style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_alternating_bars() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 22, 7);
        let mut buf = Buffer::empty(area);
        Skeleton::new(&theme, "Carregando", 0.0).render(area, &mut buf);

        // inner starts at (2, 1) with width 18
        assert_eq!(buf[(2, 1)].symbol(), SHADE);
        assert_eq!(buf[(2, 2)].symbol(), " ");
        assert_eq!(buf[(2, 3)].symbol(), SHADE);
        assert_eq!(buf[(2, 1)].fg, theme.surface_elevated);
    }

    #[test]
    fn test_pulse_moves_toward_border() {
        let theme = Theme::default();
        assert_eq!(Skeleton::new(&theme, "x", 1.0).color(), theme.border);
    }
}
