//! Border and separator glyphs

/// Horizontal rule of `width` light box-drawing characters
pub fn rule(width: usize) -> String {
    Separators::LIGHT_HORIZONTAL.repeat(width)
}

/// Separator characters for visual hierarchy
pub struct Separators;

impl Separators {
    /// Light horizontal line
    pub const LIGHT_HORIZONTAL: &'static str = "─";

    /// Column separator in headers and the status bar
    pub const VERTICAL: &'static str = "│";

    /// Arrow right
    pub const ARROW_RIGHT: &'static str = "→";

    /// Check mark
    pub const CHECK: &'static str = "✓";

    /// Cross mark
    pub const CROSS: &'static str = "✗";

    /// Diamond (for branding)
    pub const DIAMOND: &'static str = "◆";

    /// Empty diamond
    pub const DIAMOND_EMPTY: &'static str = "◇";

    /// Filled circle (status indicator)
    pub const CIRCLE_FILLED: &'static str = "●";

    /// Empty circle
    pub const CIRCLE_EMPTY: &'static str = "○";
}
