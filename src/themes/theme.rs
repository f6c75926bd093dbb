//! Theme structure and application
//!
//! Semantic color system: colors are organized by purpose, not by color name.

use ratatui::style::Color;
use tracing::warn;

use crate::config::ThemeSettings;

/// Theme colors with semantic organization
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    // ─────────────────────────────────────────────────────────────────────────
    // Surfaces - Background layers
    // ─────────────────────────────────────────────────────────────────────────
    /// Main background color
    pub background: Color,
    /// Card/panel background (slightly elevated)
    pub surface: Color,
    /// Overlays and selected rows (most elevated)
    pub surface_elevated: Color,

    // ─────────────────────────────────────────────────────────────────────────
    // Text - Foreground colors
    // ─────────────────────────────────────────────────────────────────────────
    /// Primary text - headers, active items, important content
    pub text_primary: Color,
    /// Secondary text - descriptions, labels
    pub text_secondary: Color,
    /// Muted text - hints, timestamps
    pub text_muted: Color,

    // ─────────────────────────────────────────────────────────────────────────
    // Accents
    // ─────────────────────────────────────────────────────────────────────────
    /// Primary accent (portal blue)
    pub accent: Color,
    /// Secondary accent, used for money figures
    pub accent_secondary: Color,
    /// Muted accent - subtle highlights, sidebar rail
    pub accent_muted: Color,

    // ─────────────────────────────────────────────────────────────────────────
    // Semantic - Status colors
    // ─────────────────────────────────────────────────────────────────────────
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // ─────────────────────────────────────────────────────────────────────────
    // Borders
    // ─────────────────────────────────────────────────────────────────────────
    pub border: Color,
    pub border_focused: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::portal_dark()
    }
}

impl Theme {
    /// Dark slate with the portal's blue and green
    pub fn portal_dark() -> Self {
        Self {
            // Surfaces
            background: Color::Rgb(24, 28, 36),          // #181c24
            surface: Color::Rgb(34, 40, 51),             // #222833
            surface_elevated: Color::Rgb(48, 56, 70),    // #303846

            // Text
            text_primary: Color::Rgb(236, 239, 244),     // #eceff4
            text_secondary: Color::Rgb(176, 184, 196),
            text_muted: Color::Rgb(120, 130, 145),

            // Accents
            accent: Color::Rgb(88, 150, 230),            // #5896e6
            accent_secondary: Color::Rgb(120, 200, 150), // #78c896
            accent_muted: Color::Rgb(62, 98, 146),

            // Semantic
            success: Color::Rgb(139, 213, 162),          // #8bd5a2
            warning: Color::Rgb(249, 226, 175),          // #f9e2af
            error: Color::Rgb(255, 107, 107),            // #ff6b6b
            info: Color::Rgb(137, 180, 250),             // #89b4fa

            // Borders
            border: Color::Rgb(58, 66, 80),
            border_focused: Color::Rgb(88, 150, 230),
        }
    }

    /// Default palette with the configured overrides applied. Invalid hex
    /// values are logged and ignored.
    pub fn load(settings: &ThemeSettings) -> Self {
        let mut theme = Self::default();

        if let Some(raw) = settings.background.as_deref() {
            match Self::hex_to_color(raw) {
                Some(bg) => {
                    theme.background = bg;
                    theme.surface = Self::lighten_color(bg, 0.05);
                    theme.surface_elevated = Self::lighten_color(bg, 0.12);
                    theme.border = Self::lighten_color(bg, 0.15);
                    theme.text_secondary = Self::blend_colors(theme.text_primary, bg, 0.7);
                    theme.text_muted = Self::blend_colors(theme.text_primary, bg, 0.5);
                }
                None => warn!("Ignoring invalid theme background {:?}", raw),
            }
        }

        if let Some(raw) = settings.accent.as_deref() {
            match Self::hex_to_color(raw) {
                Some(accent) => {
                    theme.accent = accent;
                    theme.border_focused = accent;
                    theme.accent_muted = Self::blend_colors(accent, theme.background, 0.6);
                }
                None => warn!("Ignoring invalid theme accent {:?}", raw),
            }
        }

        theme
    }

    /// Lighten a color by a factor (0.0 - 1.0)
    fn lighten_color(color: Color, factor: f32) -> Color {
        if let Color::Rgb(r, g, b) = color {
            let lighten = |c: u8| -> u8 {
                let c = c as f32;
                (c + (255.0 - c) * factor).min(255.0) as u8
            };
            Color::Rgb(lighten(r), lighten(g), lighten(b))
        } else {
            color
        }
    }

    /// Blend two colors with a ratio (1.0 = color1, 0.0 = color2)
    fn blend_colors(color1: Color, color2: Color, ratio: f32) -> Color {
        match (color1, color2) {
            (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
                let blend = |c1: u8, c2: u8| -> u8 {
                    let c1 = c1 as f32;
                    let c2 = c2 as f32;
                    (c1 * ratio + c2 * (1.0 - ratio)) as u8
                };
                Color::Rgb(blend(r1, r2), blend(g1, g2), blend(b1, b2))
            }
            _ => color1,
        }
    }

    /// Convert hex string to Color
    pub fn hex_to_color(hex: &str) -> Option<Color> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Color::Rgb(r, g, b))
    }

    /// Cycling palette for per-modality bars
    pub fn series_color(&self, index: usize) -> Color {
        let palette = [
            self.accent,
            self.accent_secondary,
            self.warning,
            self.info,
            self.error,
            self.success,
        ];
        palette[index % palette.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_color() {
        assert_eq!(Theme::hex_to_color("#3a7bd5"), Some(Color::Rgb(0x3a, 0x7b, 0xd5)));
        assert_eq!(Theme::hex_to_color("ffffff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(Theme::hex_to_color("#fff"), None);
        assert_eq!(Theme::hex_to_color("#gg0000"), None);
        assert_eq!(Theme::hex_to_color("#ééé"), None);
    }

    #[test]
    fn test_load_without_overrides_is_default() {
        assert_eq!(Theme::load(&ThemeSettings::default()), Theme::default());
    }

    #[test]
    fn test_overrides_derive_related_colors() {
        let theme = Theme::load(&ThemeSettings {
            accent: Some("#ff0000".to_string()),
            background: Some("#000000".to_string()),
        });
        assert_eq!(theme.accent, Color::Rgb(255, 0, 0));
        assert_eq!(theme.border_focused, Color::Rgb(255, 0, 0));
        assert_eq!(theme.background, Color::Rgb(0, 0, 0));
        assert_ne!(theme.surface, theme.background);
    }

    #[test]
    fn test_invalid_override_ignored() {
        let theme = Theme::load(&ThemeSettings {
            accent: Some("blue".to_string()),
            background: None,
        });
        assert_eq!(theme.accent, Theme::default().accent);
    }

    #[test]
    fn test_series_color_cycles() {
        let theme = Theme::default();
        assert_eq!(theme.series_color(0), theme.series_color(6));
    }
}
