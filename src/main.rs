use std::error::Error;
use std::sync::Arc;

use eframe::egui;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use persistence_diagram::loader::{synthetic_dataset, DatasetLoader, JsonFileLoader, MemoryLoader};
use persistence_diagram::{themes, DiagramOptions, PersistenceDiagram};

const SYNTHETIC_SOURCE: &str = "synthetic";
const SYNTHETIC_RECORDS: usize = 1_000;

struct Viewer {
    diagram: PersistenceDiagram,
    source: String,
    // Owns the worker threads the diagram schedules on.
    _runtime: tokio::runtime::Runtime,
}

impl eframe::App for Viewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.source.as_str());
                if ui.button("Reload").clicked() {
                    self.diagram.load_in_background(self.source.clone());
                }
                if ui.button("Clear selection").clicked() {
                    self.diagram.clear_selection();
                }
                if ui.button("Reset persistence").clicked() {
                    self.diagram.set_persistence_range(None);
                }
                ui.label(format!(
                    "{} of {} pairs",
                    self.diagram.filtered_points().len(),
                    self.diagram.state().points().len()
                ));
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.diagram.ui(ui);
        });
    }
}

fn log_level() -> LevelFilter {
    std::env::var("PERSISTENCE_DIAGRAM_LOG")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn main() -> Result<(), Box<dyn Error>> {
    SimpleLogger::new().with_level(log_level()).init()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let (loader, source): (Arc<dyn DatasetLoader>, String) = match std::env::args().nth(1) {
        Some(path) => (Arc::new(JsonFileLoader::new()), path),
        None => {
            log::info!("no dataset given, showing {SYNTHETIC_RECORDS} synthetic pairs");
            let loader =
                MemoryLoader::new().with(SYNTHETIC_SOURCE, synthetic_dataset(SYNTHETIC_RECORDS));
            (Arc::new(loader), SYNTHETIC_SOURCE.to_owned())
        }
    };

    let options = DiagramOptions::default().canvas_size(720.0, 480.0);
    let mut diagram = PersistenceDiagram::with_runtime(options, loader, runtime.handle().clone());
    diagram.load_in_background(source.clone());

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([780.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Persistence diagram",
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx
                .set_style_of(egui::Theme::Light, themes::industrial(false));
            cc.egui_ctx
                .set_style_of(egui::Theme::Dark, themes::industrial(true));
            Ok(Box::new(Viewer {
                diagram,
                source,
                _runtime: runtime,
            }))
        }),
    )?;
    Ok(())
}
