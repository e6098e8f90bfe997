use eframe::egui;

use crate::config::Config;
use crate::state::AppState;
use crate::ui::{dashboard, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SalesDashboardApp {
    pub state: AppState,
}

impl SalesDashboardApp {
    pub fn new(config: Config) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for SalesDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Re-renders only after a filter change, reload or file switch.
        let view = self.state.run();
        let mut changed = false;

        // ---- Top panel: menu bar + title ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            changed |= panels::top_bar(ui, &mut self.state, &view);
        });

        // ---- Bottom panel: footer ----
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            panels::footer(ui, &self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                changed |= panels::side_panel(ui, &mut self.state, &view);
            });

        // ---- Central panel: tiles, charts, table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard::central_panel(ui, &mut self.state, &view);
        });

        // Show the effect of this frame's input right away.
        if changed {
            ctx.request_repaint();
        }
    }
}
