//! Animation state for view transitions and loading placeholders

use ratatui::prelude::*;
use std::time::{Duration, Instant};

/// Fade-in after a view switch
#[derive(Clone, Debug)]
pub struct FadeState {
    start: Instant,
    duration: Duration,
}

impl FadeState {
    pub fn fade_in(duration_ms: u64) -> Self {
        Self {
            start: Instant::now(),
            duration: Duration::from_millis(duration_ms),
        }
    }

    pub fn progress(&self) -> f32 {
        progress(self.start.elapsed(), self.duration)
    }

    pub fn is_done(&self) -> bool {
        self.start.elapsed() >= self.duration
    }

    /// Get alpha value (0.0 to 1.0)
    pub fn alpha(&self) -> f32 {
        ease_out_cubic(self.progress())
    }
}

/// Endless triangle-wave pulse driving the loading skeleton
#[derive(Clone, Debug)]
pub struct Pulse {
    start: Instant,
    period: Duration,
}

impl Pulse {
    pub fn new(period_ms: u64) -> Self {
        Self {
            start: Instant::now(),
            period: Duration::from_millis(period_ms.max(1)),
        }
    }

    /// Brightness in `0.0..=1.0`
    pub fn level(&self) -> f32 {
        pulse_level(self.start.elapsed(), self.period)
    }
}

impl Default for Pulse {
    fn default() -> Self {
        Self::new(1200)
    }
}

fn progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
}

fn pulse_level(elapsed: Duration, period: Duration) -> f32 {
    let phase = (elapsed.as_secs_f32() / period.as_secs_f32()).fract();
    if phase < 0.5 {
        phase * 2.0
    } else {
        (1.0 - phase) * 2.0
    }
}

/// Cubic ease-out function
fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Mix `color` toward `target` by `amount` (0.0 keeps `color`)
pub fn mix(color: Color, target: Color, amount: f32) -> Color {
    match (color, target) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let a = amount.clamp(0.0, 1.0);
            let m = |c1: u8, c2: u8| (c1 as f32 + (c2 as f32 - c1 as f32) * a).round() as u8;
            Color::Rgb(m(r1, r2), m(g1, g2), m(b1, b2))
        }
        (other, _) => other,
    }
}

/// Apply alpha to a color (simple dimming)
pub fn apply_alpha(color: Color, alpha: f32) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let r = (r as f32 * alpha) as u8;
            let g = (g as f32 * alpha) as u8;
            let b = (b as f32 * alpha) as u8;
            Color::Rgb(r, g, b)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_clamps() {
        assert!((progress(Duration::from_millis(50), Duration::from_millis(100)) - 0.5).abs() < 1e-3);
        assert_eq!(progress(Duration::from_secs(5), Duration::from_millis(100)), 1.0);
        assert_eq!(progress(Duration::from_secs(1), Duration::ZERO), 1.0);
    }

    #[test]
    fn test_pulse_is_triangle_wave() {
        let period = Duration::from_millis(1000);
        assert_eq!(pulse_level(Duration::ZERO, period), 0.0);
        assert!((pulse_level(Duration::from_millis(250), period) - 0.5).abs() < 1e-3);
        assert!((pulse_level(Duration::from_millis(500), period) - 1.0).abs() < 1e-3);
        assert!((pulse_level(Duration::from_millis(750), period) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_mix_and_alpha() {
        let black = Color::Rgb(0, 0, 0);
        let white = Color::Rgb(255, 255, 255);
        assert_eq!(mix(black, white, 0.0), black);
        assert_eq!(mix(black, white, 1.0), white);
        assert_eq!(apply_alpha(white, 0.0), black);
        assert_eq!(apply_alpha(Color::Red, 0.5), Color::Red);
    }

    #[test]
    fn test_fade_finishes() {
        let fade = FadeState::fade_in(0);
        assert!(fade.is_done());
        assert_eq!(fade.alpha(), 1.0);
    }
}
