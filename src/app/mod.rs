//! `VibeApp`: the top-level egui application state.
//!
//! This module declares the `VibeApp` struct and its frame loop. Drawing is
//! split across the sibling sub-modules:
//!
//! - `toolbar`: header, search field and navigation icons
//! - `sidebar`: live feed panel
//! - `content`: globe viewport, dashboard overlay and loading overlay

pub mod content;
pub mod sidebar;
pub mod toolbar;

use std::sync::Arc;
use std::time::Instant;

use eframe::egui;

use vibecheck::config::AppConfig;
use vibecheck::dashboard::is_narrow;
use vibecheck::net::image::MapLoader;
use vibecheck::render::planet::PlanetRenderer;
use vibecheck::render::starfield::StarField;
use vibecheck::sentiment::client::connect;
use vibecheck::shell::{Shell, Waker};

use crate::ui;

// ─── Application state ───────────────────────────────────────────────────────

pub struct VibeApp {
    pub config: AppConfig,
    pub shell: Shell,
    pub search_input: String,
    pub renderer: PlanetRenderer,
    pub map_loader: MapLoader,
    pub stars: StarField,
    pub globe_texture: Option<egui::TextureHandle>,
    /// Shell revision as of the previous frame; the feed scrolls back to
    /// the top when it moves.
    pub seen_revision: u64,
    pub minimized: bool,
    pub app_start: Instant,
}

impl VibeApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        cc.egui_ctx.set_visuals(ui::dark_visuals());

        let ctx = cc.egui_ctx.clone();
        let waker: Waker = Arc::new(move || ctx.request_repaint());
        let mut shell =
            Shell::new(connect(&config), config.default_topic.clone()).with_waker(waker);
        shell.start();

        let mut renderer = PlanetRenderer::new(config.prefer_gpu);
        renderer.mount();
        let mut map_loader = MapLoader::new();
        map_loader.request_all(&config.textures);

        Self {
            config,
            shell,
            search_input: String::new(),
            renderer,
            map_loader,
            stars: StarField::default(),
            globe_texture: None,
            seen_revision: 0,
            minimized: false,
            app_start: Instant::now(),
        }
    }

    /// Release GPU resources and maps while minimized, reacquire on restore.
    fn sync_lifecycle(&mut self, ctx: &egui::Context) {
        let minimized = ctx.input(|i| i.viewport().minimized.unwrap_or(false));
        if minimized == self.minimized {
            return;
        }
        self.minimized = minimized;
        if minimized {
            self.map_loader.cancel();
            self.renderer.release();
            self.globe_texture = None;
        } else {
            self.renderer.mount();
            self.map_loader.request_all(&self.config.textures);
        }
    }

    fn apply_maps(&mut self) {
        for (kind, map) in self.map_loader.poll() {
            log::info!("{:?} map ready ({}x{})", kind, map.width, map.height);
            self.renderer.set_texture(kind, map);
        }
    }
}

impl eframe::App for VibeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.shell.poll() {
            log::debug!("Shell revision {}", self.shell.revision());
        }
        self.sync_lifecycle(ctx);
        if self.minimized {
            return;
        }
        self.apply_maps();

        let screen_width = ctx.screen_rect().width();
        let narrow = is_narrow(screen_width);

        egui::TopBottomPanel::top("header")
            .frame(ui::panel_frame())
            .show(ctx, |ui| {
                self.draw_toolbar(ui, narrow);
            });

        if narrow {
            egui::TopBottomPanel::bottom("nav")
                .frame(ui::panel_frame())
                .show(ctx, |ui| {
                    self.draw_nav_bar(ui);
                });
        } else {
            egui::SidePanel::left("nav")
                .resizable(false)
                .exact_width(72.0)
                .frame(ui::panel_frame())
                .show(ctx, |ui| {
                    self.draw_nav_rail(ui);
                });
        }

        if !narrow || self.shell.feed_open() {
            egui::SidePanel::right("feed")
                .resizable(false)
                .exact_width(ui::feed_width(screen_width))
                .frame(ui::panel_frame())
                .show(ctx, |ui| {
                    self.draw_feed(ui, narrow);
                });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(ui::BACKGROUND))
            .show(ctx, |ui| {
                let viewport = self.draw_globe(ui, ctx);
                self.draw_dashboard(ctx, viewport, screen_width);
            });

        if self.shell.is_loading() {
            self.draw_loading_overlay(ctx);
        }

        self.seen_revision = self.shell.revision();
        // The globe animates continuously.
        ctx.request_repaint();
    }
}
