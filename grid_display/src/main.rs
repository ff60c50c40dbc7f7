// main.rs - Desktop viewer for the actor-per-cell simulation
//
// The simulation runs on its own tokio runtime in a background thread and
// publishes each completed generation through a watch channel. The UI only
// ever paints the latest published frame.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use conway_actor::{
    ActorSystem, Driver, FrameSnapshot, PATTERNS, Seeding, SnapshotPublisher,
};
use eframe::egui;
use egui::{Color32, Rect, Stroke, Vec2};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const ROWS: usize = 50;
const COLS: usize = 50;

fn main() -> Result<(), eframe::Error> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 950.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Actor Game of Life",
        options,
        Box::new(|_cc| Box::new(GridApp::default())),
    )
}

/// A running simulation: its cancellation token, frame receiver and thread.
struct Run {
    token: CancellationToken,
    frames: watch::Receiver<Option<FrameSnapshot>>,
    thread: Option<JoinHandle<()>>,
}

impl Run {
    fn start(seeding: Seeding, interval: Duration) -> Self {
        let token = CancellationToken::new();
        let (mut publisher, frames) = SnapshotPublisher::channel();
        let driver = Driver::new(interval, token.clone());

        let thread = thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!(error = %err, "cannot start runtime");
                    return;
                }
            };
            runtime.block_on(async move {
                let initial = match seeding.initial_grid(ROWS, COLS) {
                    Ok(grid) => grid,
                    Err(err) => {
                        error!(error = %err, "bad initial grid");
                        return;
                    }
                };
                let system = match ActorSystem::launch(&initial).await {
                    Ok(system) => system,
                    Err(err) => {
                        error!(error = %err, "cannot launch cells");
                        return;
                    }
                };
                match driver.run(system, &mut publisher).await {
                    Ok(report) => info!(generations = report.generations, "viewer run ended"),
                    Err(err) => error!(error = %err, "simulation failed"),
                }
            });
        });

        Self {
            token,
            frames,
            thread: Some(thread),
        }
    }

    fn stop(&mut self) {
        self.token.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("simulation thread panicked");
            }
        }
    }
}

impl Drop for Run {
    fn drop(&mut self) {
        self.stop();
    }
}

struct GridApp {
    run: Option<Run>,
    frame: Option<FrameSnapshot>,
    interval: Duration,
    selected_pattern: usize,
    live_color: Color32,
    dead_color: Color32,
}

impl Default for GridApp {
    fn default() -> Self {
        Self {
            run: None,
            frame: None,
            interval: Duration::from_millis(100),
            selected_pattern: 0,
            live_color: Color32::from_rgb(0, 200, 0),
            dead_color: Color32::from_rgb(40, 40, 40),
        }
    }
}

impl GridApp {
    fn restart(&mut self, seeding: Seeding) {
        // the old run must be fully stopped before a new one starts
        self.run = None;
        self.frame = None;
        self.run = Some(Run::start(seeding, self.interval));
    }

    fn pull_frame(&mut self) {
        if let Some(run) = self.run.as_mut() {
            if run.frames.has_changed().unwrap_or(false) {
                self.frame = run.frames.borrow_and_update().clone();
            }
        }
    }
}

impl eframe::App for GridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pull_frame();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Game of Life: one task per cell");

            ui.horizontal(|ui| {
                if ui.button("🎲 Random").clicked() {
                    self.restart(Seeding::default());
                }

                ui.separator();

                ui.label("Pattern:");
                egui::ComboBox::from_id_source("pattern_selector")
                    .selected_text(PATTERNS[self.selected_pattern].name)
                    .show_ui(ui, |ui| {
                        for (i, pattern) in PATTERNS.iter().enumerate() {
                            ui.selectable_value(&mut self.selected_pattern, i, pattern.name);
                        }
                    });

                if ui.button("Apply Pattern").clicked() {
                    let name = PATTERNS[self.selected_pattern].name.to_string();
                    self.restart(Seeding::Pattern(name));
                }

                if ui.button("⏹ Stop").clicked() {
                    self.run = None;
                }
            });

            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Speed:");
                let mut speed = 1000.0 / self.interval.as_millis().max(1) as f32;
                if ui.add(egui::Slider::new(&mut speed, 0.5..=60.0).suffix(" gen/sec")).changed() {
                    // takes effect on the next restart
                    self.interval = Duration::from_millis((1000.0 / speed) as u64);
                }

                ui.separator();

                ui.label("Live:");
                ui.color_edit_button_srgba(&mut self.live_color);
                ui.label("Dead:");
                ui.color_edit_button_srgba(&mut self.dead_color);
            });

            ui.separator();

            match &self.frame {
                Some(frame) => ui.label(format!(
                    "Generation: {}   Round: {:?}",
                    frame.generation, frame.elapsed
                )),
                None => ui.label("Press Random or Apply Pattern to start."),
            };

            ui.separator();

            let box_size = 15.0;
            let spacing = 0.5;

            let start_pos = ui.cursor().min;
            let total_size = Vec2::new(
                (box_size + spacing) * COLS as f32 - spacing,
                (box_size + spacing) * ROWS as f32 - spacing,
            );
            let (_response, painter) = ui.allocate_painter(total_size, egui::Sense::hover());

            painter.rect_filled(
                Rect::from_min_size(start_pos, total_size),
                0.0,
                Color32::BLACK,
            );

            for row in 0..ROWS {
                for col in 0..COLS {
                    let x = start_pos.x + col as f32 * (box_size + spacing);
                    let y = start_pos.y + row as f32 * (box_size + spacing);
                    let rect = Rect::from_min_size(egui::pos2(x, y), Vec2::splat(box_size));

                    let alive = self
                        .frame
                        .as_ref()
                        .is_some_and(|f| f.grid.cells()[row * COLS + col]);
                    let color = if alive { self.live_color } else { self.dead_color };

                    painter.rect_filled(rect, 1.0, color);
                    painter.rect_stroke(rect, 1.0, Stroke::new(0.2, Color32::from_gray(60)));
                }
            }

            ui.separator();

            let live_cells = self.frame.as_ref().map_or(0, |f| f.grid.live_count());
            let total = ROWS * COLS;
            ui.horizontal(|ui| {
                ui.label(format!("Live cells: {}", live_cells));
                ui.label(format!("Dead cells: {}", total - live_cells));
                ui.label(format!("Population: {:.1}%", (live_cells as f32 / total as f32) * 100.0));
            });
        });

        if self.run.is_some() {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}
