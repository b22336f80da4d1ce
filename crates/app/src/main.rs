mod state;
mod ui;

use eframe::egui;
use state::AppState;

struct VoromapApp {
    state: AppState,
}

impl VoromapApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // leaf icons are loaded from disk next to the dataset
        egui_extras::install_image_loaders(&cc.egui_ctx);
        Self {
            state: AppState::new(),
        }
    }
}

impl eframe::App for VoromapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::draw(&mut self.state, ctx);
    }
}

fn main() -> eframe::Result<()> {
    voromap_core::init_tracing();
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Voromap",
        options,
        Box::new(|cc| Ok(Box::new(VoromapApp::new(cc)))),
    )
}
