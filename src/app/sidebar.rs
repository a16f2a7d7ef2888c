//! Live feed panel for `VibeApp`.

use eframe::egui;

use vibecheck::feed::{
    avatar_initial, display_handle, feed_rows, FeedRow, LIKE_COUNT_LABEL, REPLY_COUNT_LABEL,
};
use vibecheck::sentiment::Post;

use crate::ui::{self, truncate_str};
use super::VibeApp;

impl VibeApp {
    /// Render the feed: skeletons while loading, post cards otherwise.
    pub fn draw_feed(&mut self, ui: &mut egui::Ui, narrow: bool) {
        ui.horizontal(|ui| {
            ui.label(ui::caption("Live Intelligence"));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if narrow && ui.button("\u{276F}").on_hover_text("Close feed").clicked() {
                    self.shell.set_feed_open(false);
                }
                let (dot, _) = ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
                ui.painter().circle_filled(dot.center(), 4.0, ui::EMERALD);
            });
        });
        ui.add_space(8.0);

        let fresh = self.shell.revision() != self.seen_revision;
        let mut scroll = egui::ScrollArea::vertical().auto_shrink([false, false]);
        if fresh {
            scroll = scroll.vertical_scroll_offset(0.0);
        }

        let time = self.app_start.elapsed().as_secs_f32();
        let rows = feed_rows(&self.shell.record().posts, self.shell.is_loading());
        scroll.show(ui, |ui| {
            for row in rows {
                match row {
                    FeedRow::Skeleton => draw_skeleton(ui, time),
                    FeedRow::Post(post) => draw_post(ui, post),
                }
                ui.add_space(12.0);
            }
        });
    }
}

fn draw_skeleton(ui: &mut egui::Ui, time: f32) {
    // Pulse between 40% and 100% of the skeleton fill.
    let pulse = 0.7 + 0.3 * (time * 3.0).sin();
    let fill = ui::SKELETON.gamma_multiply(pulse);
    ui::glass_frame().show(ui, |ui| {
        let width = ui.available_width();
        ui.horizontal(|ui| {
            let (avatar, _) = ui.allocate_exact_size(egui::vec2(40.0, 40.0), egui::Sense::hover());
            ui.painter().circle_filled(avatar.center(), 20.0, fill);
            ui.vertical(|ui| {
                bar(ui, width / 3.0, 12.0, fill);
                bar(ui, width / 4.0, 8.0, fill);
            });
        });
        ui.add_space(8.0);
        bar(ui, width, 12.0, fill);
        bar(ui, width * 5.0 / 6.0, 12.0, fill);
    });
}

fn bar(ui: &mut egui::Ui, width: f32, height: f32, fill: egui::Color32) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, height), egui::Sense::hover());
    ui.painter().rect_filled(rect, 4.0, fill);
}

fn draw_post(ui: &mut egui::Ui, post: &Post) {
    ui::glass_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            let (avatar, _) = ui.allocate_exact_size(egui::vec2(40.0, 40.0), egui::Sense::hover());
            ui.painter().circle_filled(avatar.center(), 20.0, egui::Color32::from_rgb(124, 92, 240));
            ui.painter().text(
                avatar.center(),
                egui::Align2::CENTER_CENTER,
                avatar_initial(&post.author),
                egui::FontId::proportional(12.0),
                egui::Color32::WHITE,
            );
            ui.vertical(|ui| {
                ui.label(egui::RichText::new(truncate_str(&post.author, 32)).strong());
                ui.label(
                    egui::RichText::new(truncate_str(&display_handle(&post.handle), 32))
                        .size(11.0)
                        .color(ui::TEXT_MUTED),
                );
            });
        });
        ui.add_space(6.0);
        ui.add(egui::Label::new(egui::RichText::new(&post.content).color(ui::TEXT)).wrap());
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let small = |s: String| egui::RichText::new(s).size(10.0).color(ui::TEXT_DIM);
            ui.label(small(format!("\u{1F4AC} {}", REPLY_COUNT_LABEL)));
            ui.add_space(8.0);
            ui.label(small(format!("\u{2665} {}", LIKE_COUNT_LABEL)));
            ui.add_space(8.0);
            ui.label(small("\u{2934}".to_string()));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(small(post.timestamp.to_uppercase()));
            });
        });
    });
}
