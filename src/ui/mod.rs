//! Shared egui styling helpers: palette, frames and text utilities.
//!
//! Everything here is stateless. Colours mirror the dashboard's slate/indigo
//! theme; score and card colours come from `vibecheck::dashboard` so the
//! library stays the single source of those decisions.

use eframe::egui;
use vibecheck::dashboard::{CardStyle, ScoreTone};

// ─── Palette ─────────────────────────────────────────────────────────────────

pub const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(2, 6, 23);
pub const PANEL: egui::Color32 = egui::Color32::from_rgba_premultiplied(8, 12, 28, 200);
pub const GLASS: egui::Color32 = egui::Color32::from_rgba_premultiplied(10, 14, 30, 150);
pub const BORDER: egui::Color32 = egui::Color32::from_rgba_premultiplied(20, 20, 20, 20);
pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(79, 70, 229);
pub const TEXT: egui::Color32 = egui::Color32::from_rgb(226, 232, 240);
pub const TEXT_MUTED: egui::Color32 = egui::Color32::from_rgb(148, 163, 184);
pub const TEXT_DIM: egui::Color32 = egui::Color32::from_rgb(100, 116, 139);
pub const EMERALD: egui::Color32 = egui::Color32::from_rgb(16, 185, 129);
/// Skeleton block fill.
pub const SKELETON: egui::Color32 = egui::Color32::from_rgba_premultiplied(26, 26, 26, 26);

// ─── Breakpoints ─────────────────────────────────────────────────────────────

const SMALL_BREAKPOINT: f32 = 640.0;
const LARGE_BREAKPOINT: f32 = 1024.0;
const XL_BREAKPOINT: f32 = 1280.0;

/// Feed panel width for a window `screen_width` logical px wide.
pub fn feed_width(screen_width: f32) -> f32 {
    if screen_width < SMALL_BREAKPOINT {
        screen_width
    } else if vibecheck::dashboard::is_narrow(screen_width) {
        380.0
    } else if screen_width < LARGE_BREAKPOINT {
        340.0
    } else if screen_width < XL_BREAKPOINT {
        380.0
    } else {
        420.0
    }
}

/// Whether the summary box has room (hidden on very small windows).
pub fn shows_summary(screen_width: f32) -> bool {
    screen_width >= SMALL_BREAKPOINT
}

// ─── Colours ─────────────────────────────────────────────────────────────────

pub fn rgb(c: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(c[0], c[1], c[2])
}

pub fn tone_color(tone: ScoreTone) -> egui::Color32 {
    rgb(tone.rgb())
}

/// `(fill, stroke, value text)` for a stat card.
pub fn card_colors(style: CardStyle) -> (egui::Color32, egui::Color32, egui::Color32) {
    match style {
        CardStyle::Plain => (GLASS, BORDER, TEXT),
        CardStyle::Warning => (
            egui::Color32::from_rgba_unmultiplied(244, 63, 94, 25),
            egui::Color32::from_rgba_unmultiplied(244, 63, 94, 90),
            rgb(ScoreTone::Negative.rgb()),
        ),
        CardStyle::Glow => (
            egui::Color32::from_rgba_unmultiplied(16, 185, 129, 25),
            egui::Color32::from_rgba_unmultiplied(16, 185, 129, 120),
            rgb(ScoreTone::Positive.rgb()),
        ),
    }
}

// ─── Frames ──────────────────────────────────────────────────────────────────

/// Translucent rounded card.
pub fn glass_frame() -> egui::Frame {
    egui::Frame::none()
        .fill(GLASS)
        .stroke(egui::Stroke::new(1.0, BORDER))
        .rounding(12.0)
        .inner_margin(egui::Margin::same(12.0))
}

/// Frame for the header and side panels.
pub fn panel_frame() -> egui::Frame {
    egui::Frame::none()
        .fill(PANEL)
        .stroke(egui::Stroke::new(1.0, BORDER))
        .inner_margin(egui::Margin::symmetric(12.0, 8.0))
}

pub fn dark_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = BACKGROUND;
    visuals.window_fill = PANEL;
    visuals.extreme_bg_color = egui::Color32::from_rgb(15, 23, 42);
    visuals.selection.bg_fill = ACCENT;
    visuals.override_text_color = Some(TEXT);
    visuals
}

/// Small uppercase caption.
pub fn caption(text: &str) -> egui::RichText {
    egui::RichText::new(text.to_uppercase())
        .size(10.0)
        .strong()
        .color(TEXT_DIM)
}

// ─── Text utilities ───────────────────────────────────────────────────────────

/// Truncate `s` to at most `max_chars` Unicode scalar values, appending `"..."` if truncated.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let t: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_chars() {
        assert_eq!(truncate_str("Pulse", 10), "Pulse");
        assert_eq!(truncate_str("Artificial Super Intelligence", 12), "Artificia...");
        assert_eq!(truncate_str("ÄÖÜäöü", 5), "ÄÖ...");
    }

    #[test]
    fn feed_width_breakpoints() {
        assert_eq!(feed_width(500.0), 500.0);
        assert_eq!(feed_width(700.0), 380.0);
        assert_eq!(feed_width(800.0), 340.0);
        assert_eq!(feed_width(1100.0), 380.0);
        assert_eq!(feed_width(1600.0), 420.0);
    }

    #[test]
    fn warning_cards_read_red() {
        let (_, _, text) = card_colors(CardStyle::Warning);
        assert!(text.r() > text.g());
        let (_, _, text) = card_colors(CardStyle::Glow);
        assert!(text.g() > text.r());
    }
}
