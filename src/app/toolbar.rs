//! Header and navigation rendering for `VibeApp`.
//!
//! Draws the logo, the topic search field and the static navigation icons
//! (a left rail on wide windows, a bottom bar with the feed toggle on narrow
//! ones).

use eframe::egui;
use vibecheck::dashboard::ScoreTone;

use crate::ui;
use super::VibeApp;

/// `(glyph, tooltip)`; the first entry is the active view.
const NAV_ITEMS: [(&str, &str); 4] = [
    ("\u{1F4CA}", "Dashboard"),
    ("\u{1F4C8}", "Trending"),
    ("\u{1F4FB}", "Radio"),
    ("\u{2139}", "Info"),
];

impl VibeApp {
    /// Render the top header strip.
    pub fn draw_toolbar(&mut self, ui: &mut egui::Ui, narrow: bool) {
        ui.horizontal(|ui| {
            // Logo
            let (logo, _) = ui.allocate_exact_size(egui::vec2(32.0, 32.0), egui::Sense::hover());
            ui.painter().rect_filled(logo, 8.0, ui::ACCENT);
            ui.painter().text(
                logo.center(),
                egui::Align2::CENTER_CENTER,
                "\u{1F310}",
                egui::FontId::proportional(16.0),
                egui::Color32::WHITE,
            );
            if !narrow {
                ui.vertical(|ui| {
                    ui.label(egui::RichText::new("VibeCheck").size(18.0).strong());
                    ui.label(
                        egui::RichText::new("PULSE OS 3.0")
                            .size(9.0)
                            .color(egui::Color32::from_rgb(129, 140, 248)),
                    );
                });
            }

            ui.add_space(16.0);

            // Search
            let right_reserve = if narrow { 48.0 } else { 140.0 };
            let response = ui.add_sized(
                [(ui.available_width() - right_reserve).max(80.0), 32.0],
                egui::TextEdit::singleline(&mut self.search_input)
                    .hint_text("\u{1F50D} Query world sentiment...")
                    .margin(egui::Margin::symmetric(12.0, 8.0)),
            );

            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                let topic = self.search_input.clone();
                if !self.shell.submit(&topic) {
                    log::debug!("Ignoring blank topic");
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                // Avatar
                let (avatar, _) =
                    ui.allocate_exact_size(egui::vec2(32.0, 32.0), egui::Sense::hover());
                ui.painter().circle_filled(
                    avatar.center(),
                    16.0,
                    egui::Color32::from_rgb(99, 102, 241),
                );
                if !narrow {
                    ui.add(egui::Button::new("\u{2699}").frame(false))
                        .on_hover_text("Settings");
                }
                if let Some(err) = self.shell.last_error() {
                    ui.label(
                        egui::RichText::new("\u{26A0}")
                            .color(ui::tone_color(ScoreTone::Negative)),
                    )
                    .on_hover_text(format!("Last analysis failed: {}", err));
                }
            });
        });
    }

    /// Vertical icon rail on wide windows.
    pub fn draw_nav_rail(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(8.0);
            for (idx, (glyph, tip)) in NAV_ITEMS.iter().enumerate() {
                nav_button(ui, glyph, tip, idx == 0);
                ui.add_space(12.0);
            }
        });
    }

    /// Bottom bar on narrow windows, with the feed toggle.
    pub fn draw_nav_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for (idx, (glyph, tip)) in NAV_ITEMS.iter().take(2).enumerate() {
                nav_button(ui, glyph, tip, idx == 0);
            }
            let feed_open = self.shell.feed_open();
            if nav_button(ui, "\u{1F4AC}", "Live feed", feed_open).clicked() {
                self.shell.toggle_feed();
            }
            let (glyph, tip) = NAV_ITEMS[3];
            nav_button(ui, glyph, tip, false);
        });
    }
}

fn nav_button(ui: &mut egui::Ui, glyph: &str, tip: &str, active: bool) -> egui::Response {
    let (fill, color) = if active {
        (ui::ACCENT, egui::Color32::WHITE)
    } else {
        (egui::Color32::TRANSPARENT, ui::TEXT_DIM)
    };
    ui.add(
        egui::Button::new(egui::RichText::new(glyph).size(18.0).color(color))
            .fill(fill)
            .rounding(12.0)
            .min_size(egui::vec2(44.0, 44.0)),
    )
    .on_hover_text(tip)
}
