//! Globe viewport rendering for `VibeApp`.
//!
//! Contains three methods:
//!
//! - `draw_globe`: star field, planet image and orbit dragging
//! - `draw_dashboard`: topic, score, summary and stat cards
//! - `draw_loading_overlay`: full-window cover while an analysis runs

use std::f32::consts::PI;

use eframe::egui;
use vibecheck::dashboard::{is_narrow, score_percent, stat_cards, ScoreTone};
use vibecheck::render::camera::OrbitCamera;
use vibecheck::render::RenderBackend;
use vibecheck::sentiment::Trend;

use crate::ui::{self, truncate_str};
use super::VibeApp;

/// Upper bound on globe pixels rendered per frame.
const CPU_PIXEL_BUDGET: f32 = 480.0 * 320.0;
const GPU_PIXEL_BUDGET: f32 = 1920.0 * 1200.0;
const GRID_SPACING: f32 = 40.0;
const INDIGO: egui::Color32 = egui::Color32::from_rgb(99, 102, 241);
const INDIGO_LIGHT: egui::Color32 = egui::Color32::from_rgb(129, 140, 248);

impl VibeApp {
    // ── Globe ────────────────────────────────────────────────────────────────

    /// Draw the background, stars and planet into the remaining space and
    /// return the viewport rect.
    pub fn draw_globe(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) -> egui::Rect {
        let rect = ui.max_rect();
        let response = ui.allocate_rect(rect, egui::Sense::drag());
        if response.dragged() {
            let delta = response.drag_delta();
            self.renderer.camera.drag(delta.x, delta.y, rect.height());
        }
        fit_camera(&mut self.renderer.camera, rect);
        self.renderer.advance(self.shell.record().score);

        let painter = ui.painter_at(rect);
        paint_dot_grid(&painter, rect);

        let aspect = rect.width() / rect.height().max(1.0);
        let time = self.app_start.elapsed().as_secs_f32();
        let basis = self.renderer.camera.basis();
        for star in self.stars.project(&basis, aspect, time) {
            let pos = egui::pos2(
                rect.center().x + star.ndc[0] * rect.width() * 0.5,
                rect.center().y - star.ndc[1] * rect.height() * 0.5,
            );
            let [r, g, b] = star.color;
            let alpha = (star.alpha * 255.0) as u8;
            painter.circle_filled(
                pos,
                star.radius,
                egui::Color32::from_rgba_unmultiplied(r, g, b, alpha),
            );
        }

        let (w, h) = render_size(rect.size(), ctx.pixels_per_point(), self.renderer.backend());
        if let Some(pixels) = self.renderer.render(w, h) {
            // Premultiplied: the glow layers carry zero alpha and add onto
            // the stars underneath.
            let image = egui::ColorImage::from_rgba_premultiplied([w, h], &pixels);
            match self.globe_texture.as_mut() {
                Some(tex) => tex.set(image, egui::TextureOptions::LINEAR),
                None => {
                    self.globe_texture =
                        Some(ctx.load_texture("globe", image, egui::TextureOptions::LINEAR));
                }
            }
        }
        if let Some(tex) = &self.globe_texture {
            painter.image(
                tex.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        if !self.map_loader.is_idle() {
            self.draw_sync_card(ui, rect.center());
        }

        rect
    }

    /// Small card over the globe while planet maps are still downloading.
    fn draw_sync_card(&self, ui: &mut egui::Ui, center: egui::Pos2) {
        let card = egui::Rect::from_center_size(center, egui::vec2(240.0, 150.0));
        let painter = ui.painter().clone();
        painter.rect(
            card,
            16.0,
            egui::Color32::from_rgba_unmultiplied(15, 23, 42, 205),
            egui::Stroke::new(1.0, ui::BORDER),
        );
        ui.put(
            egui::Rect::from_center_size(card.center() - egui::vec2(0.0, 28.0), egui::vec2(44.0, 44.0)),
            egui::Spinner::new().size(44.0).color(INDIGO),
        );
        painter.text(
            card.center() + egui::vec2(0.0, 22.0),
            egui::Align2::CENTER_CENTER,
            "SYNCHRONIZING",
            egui::FontId::proportional(13.0),
            egui::Color32::WHITE,
        );
        painter.text(
            card.center() + egui::vec2(0.0, 42.0),
            egui::Align2::CENTER_CENTER,
            format!("Optimizing neural mesh ({} maps left)", self.map_loader.pending_count()),
            egui::FontId::proportional(10.0),
            ui::TEXT_MUTED,
        );
    }

    // ── Dashboard ────────────────────────────────────────────────────────────

    pub fn draw_dashboard(&self, ctx: &egui::Context, viewport: egui::Rect, screen_width: f32) {
        let narrow = is_narrow(screen_width);
        let margin = if narrow { 24.0 } else { 48.0 };
        let record = self.shell.record();
        let tone = ScoreTone::from_score(record.score);

        egui::Area::new(egui::Id::new("dashboard_overlay"))
            .fixed_pos(viewport.min + egui::vec2(margin, margin))
            .interactable(false)
            .show(ctx, |ui| {
                ui.set_max_width((viewport.width() - 2.0 * margin).max(120.0));
                ui.label(
                    egui::RichText::new("NEURAL TARGET")
                        .size(11.0)
                        .strong()
                        .color(INDIGO),
                );
                ui.label(
                    egui::RichText::new(truncate_str(self.shell.topic(), if narrow { 28 } else { 40 }))
                        .size(if narrow { 24.0 } else { 44.0 })
                        .strong()
                        .color(egui::Color32::WHITE),
                );
                ui.add_space(if narrow { 16.0 } else { 40.0 });
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(score_percent(record.score).to_string())
                            .size(if narrow { 56.0 } else { 104.0 })
                            .strong()
                            .color(ui::tone_color(tone)),
                    );
                    ui.vertical(|ui| {
                        ui.label(
                            egui::RichText::new("SCORE")
                                .size(if narrow { 12.0 } else { 22.0 })
                                .strong()
                                .color(egui::Color32::from_rgb(71, 85, 105)),
                        );
                        ui.label(
                            egui::RichText::new(trend_caption(record.trend))
                                .size(if narrow { 10.0 } else { 13.0 })
                                .color(ui::tone_color(tone)),
                        );
                    });
                });
                if ui::shows_summary(screen_width) {
                    ui.add_space(12.0);
                    ui::glass_frame().show(ui, |ui| {
                        ui.set_max_width(if narrow { 280.0 } else { 380.0 });
                        ui.label(
                            egui::RichText::new("INTELLIGENCE SUMMARY")
                                .size(10.0)
                                .strong()
                                .color(INDIGO_LIGHT),
                        );
                        ui.add(
                            egui::Label::new(
                                egui::RichText::new(format!("\"{}\"", record.summary))
                                    .color(egui::Color32::from_rgb(203, 213, 225)),
                            )
                            .wrap(),
                        );
                    });
                }
            });

        // Two columns below the large breakpoint, four above.
        let cols = if screen_width >= 1024.0 { 4 } else { 2 };
        let rows = 4 / cols;
        let gap = if narrow { 12.0 } else { 24.0 };
        let card_h = 64.0;
        let card_w = ((viewport.width() - 2.0 * margin - gap * (cols - 1) as f32) / cols as f32)
            .max(60.0);
        let top = viewport.bottom() - margin - rows as f32 * card_h - (rows - 1) as f32 * gap;

        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Middle,
            egui::Id::new("stat_cards"),
        ));
        for (idx, card) in stat_cards(record.score).iter().enumerate() {
            let (col, row) = (idx % cols, idx / cols);
            let min = egui::pos2(
                viewport.left() + margin + col as f32 * (card_w + gap),
                top + row as f32 * (card_h + gap),
            );
            let rect = egui::Rect::from_min_size(min, egui::vec2(card_w, card_h));
            let (fill, stroke, text) = ui::card_colors(card.style);
            painter.rect(rect, 12.0, fill, egui::Stroke::new(1.0, stroke));
            painter.text(
                rect.left_top() + egui::vec2(14.0, 12.0),
                egui::Align2::LEFT_TOP,
                card.label.to_uppercase(),
                egui::FontId::proportional(10.0),
                ui::TEXT_DIM,
            );
            painter.text(
                rect.left_bottom() + egui::vec2(14.0, -12.0),
                egui::Align2::LEFT_BOTTOM,
                &card.value,
                egui::FontId::proportional(18.0),
                text,
            );
        }
    }

    // ── Loading overlay ──────────────────────────────────────────────────────

    pub fn draw_loading_overlay(&self, ctx: &egui::Context) {
        let screen = ctx.screen_rect();
        let time = self.app_start.elapsed().as_secs_f32();

        egui::Area::new(egui::Id::new("loading_overlay"))
            .order(egui::Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                // Swallow input while the pulse recalibrates.
                ui.allocate_rect(screen, egui::Sense::click_and_drag());
                let painter = ui.painter().clone();
                painter.rect_filled(screen, 0.0, egui::Color32::from_rgba_unmultiplied(2, 6, 23, 230));

                let center = screen.center() - egui::vec2(0.0, 40.0);
                painter.circle_stroke(
                    center,
                    56.0,
                    egui::Stroke::new(4.0, egui::Color32::from_rgba_unmultiplied(99, 102, 241, 26)),
                );
                ui.put(
                    egui::Rect::from_center_size(center, egui::vec2(112.0, 112.0)),
                    egui::Spinner::new().size(112.0).color(INDIGO),
                );
                let zap_alpha = (0.6 + 0.4 * (time * 4.0).sin()) * 255.0;
                painter.text(
                    center,
                    egui::Align2::CENTER_CENTER,
                    "\u{26A1}",
                    egui::FontId::proportional(32.0),
                    egui::Color32::from_rgba_unmultiplied(129, 140, 248, zap_alpha as u8),
                );
                painter.text(
                    center + egui::vec2(0.0, 104.0),
                    egui::Align2::CENTER_CENTER,
                    "RECALIBRATING PULSE",
                    egui::FontId::proportional(28.0),
                    egui::Color32::WHITE,
                );

                for i in 1..=3 {
                    let phase = ((time - i as f32 * 0.2) / 1.5).rem_euclid(1.0);
                    let pulse = (phase * PI).sin();
                    let pos = center + egui::vec2((i as f32 - 2.0) * 16.0, 140.0);
                    painter.circle_filled(
                        pos,
                        3.0 * (1.0 + 0.5 * pulse),
                        egui::Color32::from_rgba_unmultiplied(
                            99,
                            102,
                            241,
                            ((0.3 + 0.7 * pulse) * 255.0) as u8,
                        ),
                    );
                }
            });
    }
}

/// Size the orbit to the globe viewport, which excludes the side panels.
fn fit_camera(camera: &mut OrbitCamera, viewport: egui::Rect) {
    camera.fit_viewport(viewport.width());
}

fn trend_caption(trend: Trend) -> String {
    let arrow = match trend {
        Trend::Up => "\u{25B2}",
        Trend::Down => "\u{25BC}",
        Trend::Stable => "\u{25C6}",
    };
    format!("{} {}", arrow, trend.label().to_uppercase())
}

/// Globe image size in physical pixels for a viewport of `size` points.
fn render_size(size: egui::Vec2, pixels_per_point: f32, backend: RenderBackend) -> (usize, usize) {
    let budget = match backend {
        RenderBackend::Gpu => GPU_PIXEL_BUDGET,
        RenderBackend::Cpu => CPU_PIXEL_BUDGET,
    };
    let (w, h) = (size.x * pixels_per_point, size.y * pixels_per_point);
    if w <= 0.0 || h <= 0.0 {
        return (0, 0);
    }
    let scale = (budget / (w * h)).sqrt().min(1.0);
    ((w * scale).round() as usize, (h * scale).round() as usize)
}

fn paint_dot_grid(painter: &egui::Painter, rect: egui::Rect) {
    let color = egui::Color32::from_rgba_unmultiplied(255, 255, 255, 10);
    let mut y = rect.top() + GRID_SPACING / 2.0;
    while y < rect.bottom() {
        let mut x = rect.left() + GRID_SPACING / 2.0;
        while x < rect.right() {
            painter.circle_filled(egui::pos2(x, y), 1.0, color);
            x += GRID_SPACING;
        }
        y += GRID_SPACING;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_frames_stay_within_budget() {
        let (w, h) = render_size(egui::vec2(1280.0, 800.0), 2.0, RenderBackend::Cpu);
        assert!((w * h) as f32 <= CPU_PIXEL_BUDGET * 1.01);
        // Aspect survives the downscale.
        assert!(((w as f32 / h as f32) - 1.6).abs() < 0.02);
    }

    #[test]
    fn small_viewports_render_at_full_resolution() {
        assert_eq!(render_size(egui::vec2(200.0, 100.0), 1.0, RenderBackend::Gpu), (200, 100));
        assert_eq!(render_size(egui::vec2(0.0, 100.0), 1.0, RenderBackend::Cpu), (0, 0));
    }

    #[test]
    fn camera_follows_viewport_not_window() {
        use vibecheck::render::camera::{NARROW_DISTANCE, WIDE_DISTANCE};

        // 1100 px window minus the nav rail and the feed panel.
        let viewport = egui::Rect::from_min_size(egui::pos2(72.0, 48.0), egui::vec2(648.0, 700.0));
        let mut camera = OrbitCamera::default();
        fit_camera(&mut camera, viewport);
        assert_eq!(camera.distance, NARROW_DISTANCE);

        let wide = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1400.0, 900.0));
        fit_camera(&mut camera, wide);
        assert_eq!(camera.distance, WIDE_DISTANCE);
    }

    #[test]
    fn trend_caption_reads_direction() {
        assert_eq!(trend_caption(Trend::Up), "\u{25B2} UP");
        assert_eq!(trend_caption(Trend::Down), "\u{25BC} DOWN");
        assert!(trend_caption(Trend::Stable).ends_with("STABLE"));
    }
}
