//! Desktop front end: pick a csv, tune the options, preview or export.

use crate::colors::COLORMAPS;
use crate::worker::{PlotJob, PlotWorker, WorkerEvent};
use crate::error::render_err;
use crate::{EmgResult, EmgTable, Figure, PlotOptions};
use chrono::Local;
use egui::load::SizedTexture;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// previews are rendered at screen resolution
const PREVIEW_DPI: u32 = 100;

const WELCOME: &str = "Welcome to EMG Plotter!\n\n1. Select a CSV file\n2. Configure plot options\n\
                       3. Choose output file (optional)\n4. Generate plot";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Basic,
    Overlay,
    Appearance,
    TimeAxes,
}

/// Timestamped lines shown in the status panel.
#[derive(Debug, Default, Clone)]
pub struct StatusLog {
    lines: Vec<String>,
}

impl StatusLog {
    pub fn push(&mut self, message: &str) {
        info!("{}", message);
        let timestamp = Local::now().format("%H:%M:%S");
        self.lines.push(format!("[{}] {}", timestamp, message));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

pub struct EmgPlotterApp {
    csv_file: Option<PathBuf>,
    info_text: String,
    output_file: Option<PathBuf>,
    options: PlotOptions,
    tab: Tab,
    status: StatusLog,
    worker: Option<PlotWorker>,
    preview: Option<egui::TextureHandle>,
    confirm_close: bool,
    allow_close: bool,
}

impl Default for EmgPlotterApp {
    fn default() -> Self {
        EmgPlotterApp {
            csv_file: None,
            info_text: "File info will appear here when you select a CSV file...".to_string(),
            output_file: None,
            // the GUI writes the axes file next to the figure unless told otherwise
            options: PlotOptions {
                create_axes: true,
                ..PlotOptions::default()
            },
            tab: Tab::Basic,
            status: StatusLog::default(),
            worker: None,
            preview: None,
            confirm_close: false,
            allow_close: false,
        }
    }
}

impl EmgPlotterApp {
    pub fn new() -> Self {
        Self::default()
    }

    fn busy(&self) -> bool {
        self.worker.as_ref().map_or(false, |w| w.is_running())
    }

    fn browse_file(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Select EMG CSV File")
            .add_filter("CSV Files", &["csv"])
            .add_filter("All Files", &["*"])
            .pick_file();
        if let Some(path) = picked {
            self.csv_file = Some(path);
            self.load_file_info();
        }
    }

    fn load_file_info(&mut self) {
        let Some(path) = self.csv_file.as_ref() else {
            return;
        };
        self.info_text = match EmgTable::from_csv(path, &self.options.stim_col) {
            Ok(table) => table.summary(&file_name(path)).to_string(),
            Err(e) => format!("Error reading file: {}", e),
        };
    }

    fn browse_output_file(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Save Plot As")
            .add_filter("PNG Files", &["png"])
            .add_filter("SVG Files", &["svg"])
            .add_filter("PDF Files", &["pdf"])
            .save_file();
        if picked.is_some() {
            self.output_file = picked;
        }
    }

    /// A csv that exists, or a warning dialog.
    fn validated_csv(&self) -> Option<PathBuf> {
        match validate_csv(self.csv_file.as_deref()) {
            Ok(path) => Some(path),
            Err((title, message)) => {
                rfd::MessageDialog::new()
                    .set_level(rfd::MessageLevel::Warning)
                    .set_title(title)
                    .set_description(message)
                    .set_buttons(rfd::MessageButtons::Ok)
                    .show();
                None
            }
        }
    }

    fn preview_plot(&mut self, ctx: &egui::Context) {
        let Some(csvin) = self.validated_csv() else {
            return;
        };
        self.status.push("Generating preview plot...");
        let rendered = EmgTable::from_csv(&csvin, &self.options.stim_col)
            .and_then(|table| Figure::build(&table, &self.options))
            .and_then(|figure| figure.render_rgba(&self.options, PREVIEW_DPI));
        match rendered {
            Ok((w, h, rgba)) => {
                let size = [w as usize, h as usize];
                let image = egui::ColorImage::from_rgba_unmultiplied(size, &rgba);
                let texture = ctx.load_texture("preview", image, egui::TextureOptions::LINEAR);
                self.preview = Some(texture);
                self.status.push("Preview plot displayed successfully!");
            }
            Err(e) => self.report_error("Error generating preview", &e.to_string()),
        }
    }

    fn generate_plot(&mut self, ctx: &egui::Context) {
        let Some(fout) = self.output_file.clone() else {
            // "Show only" mode draws in the window
            self.preview_plot(ctx);
            return;
        };
        let Some(csvin) = self.validated_csv() else {
            return;
        };
        self.worker = Some(PlotWorker::spawn(PlotJob {
            csvin,
            fout,
            options: self.options.clone(),
        }));
    }

    fn poll_worker(&mut self) {
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        // once the thread is over every event it sent is already queued
        let done = !worker.is_running();
        let mut events = Vec::new();
        while let Some(ev) = worker.try_recv() {
            events.push(ev);
        }
        if done {
            worker.join();
            self.worker = None;
        }
        for ev in events {
            match ev {
                WorkerEvent::Progress(msg) => self.status.push(&msg),
                WorkerEvent::Finished(report) => {
                    let files: Vec<String> =
                        report.files.iter().map(|f| f.display().to_string()).collect();
                    self.status.push(&format!("Plot saved successfully to: {}", files.join(", ")));
                    rfd::MessageDialog::new()
                        .set_level(rfd::MessageLevel::Info)
                        .set_title("Success")
                        .set_description(&format!(
                            "Plot saved successfully!\n\nOutput: {}",
                            files.join("\n")
                        ))
                        .set_buttons(rfd::MessageButtons::Ok)
                        .show();
                }
                WorkerEvent::Failed(msg) => self.report_error("Error generating plot", &msg),
            }
        }
    }

    fn report_error(&mut self, title: &str, message: &str) {
        self.status.push(&format!("Error: {}", message));
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title("Plot Error")
            .set_description(&format!("{}:\n{}", title, message))
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }

    fn file_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(egui::RichText::new("File Selection").strong());
            ui.horizontal(|ui| {
                match self.csv_file.as_ref() {
                    Some(path) => ui.label(egui::RichText::new(file_name(path)).strong()),
                    None => ui.label(egui::RichText::new("No file selected").italics().weak()),
                };
                if ui.button("Browse CSV File...").clicked() {
                    self.browse_file();
                }
            });
            egui::ScrollArea::vertical()
                .id_source("file_info")
                .max_height(100.)
                .show(ui, |ui| {
                    ui.label(egui::RichText::new(&self.info_text).monospace());
                });
        });
    }

    fn options_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(egui::RichText::new("Plot Options").strong());
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Basic, "Basic");
                let overlay = egui::SelectableLabel::new(self.tab == Tab::Overlay, "Overlay");
                if ui.add_enabled(self.options.overlay, overlay).clicked() {
                    self.tab = Tab::Overlay;
                }
                ui.selectable_value(&mut self.tab, Tab::Appearance, "Appearance");
                ui.selectable_value(&mut self.tab, Tab::TimeAxes, "Time/Axes");
            });
            if self.tab == Tab::Overlay && !self.options.overlay {
                self.tab = Tab::Basic;
            }
            ui.separator();
            let o = &mut self.options;
            egui::Grid::new("options_grid").num_columns(2).show(ui, |ui| match self.tab {
                Tab::Basic => {
                    ui.label("Recording Index:");
                    ui.add_enabled(
                        !o.overlay,
                        egui::DragValue::new(&mut o.recording_index).range(0..=9999),
                    );
                    ui.end_row();
                    ui.label("Channel Index:");
                    ui.add(egui::DragValue::new(&mut o.channel_index).range(0..=99));
                    ui.end_row();
                    ui.label("");
                    ui.checkbox(&mut o.overlay, "Overlay all recordings");
                    ui.end_row();
                    ui.label("Stimulus Column:");
                    ui.text_edit_singleline(&mut o.stim_col);
                    ui.end_row();
                }
                Tab::Overlay => {
                    ui.label("Colormap:");
                    egui::ComboBox::from_id_source("cmap")
                        .selected_text(o.cmap.as_str())
                        .show_ui(ui, |ui| {
                            for name in COLORMAPS {
                                ui.selectable_value(&mut o.cmap, name.to_string(), *name);
                            }
                        });
                    ui.end_row();
                    optional_value(ui, "Color Min:", &mut o.cmin, 0.1);
                    optional_value(ui, "Color Max:", &mut o.cmax, 0.1);
                    ui.label("");
                    ui.checkbox(&mut o.show_colorbar, "Show Colorbar");
                    ui.end_row();
                }
                Tab::Appearance => {
                    ui.label("Line Color:");
                    ui.text_edit_singleline(&mut o.color);
                    ui.end_row();
                    ui.label("Line Width:");
                    ui.add(egui::DragValue::new(&mut o.linewidth).speed(0.1).range(0.1..=10.));
                    ui.end_row();
                    ui.label("Figure Size:");
                    ui.horizontal(|ui| {
                        ui.add(egui::DragValue::new(&mut o.figsize.0).speed(0.1).range(1.0..=50.));
                        ui.label("x");
                        ui.add(egui::DragValue::new(&mut o.figsize.1).speed(0.1).range(1.0..=50.));
                    });
                    ui.end_row();
                    ui.label("DPI:");
                    ui.add(egui::DragValue::new(&mut o.dpi).range(50..=1200));
                    ui.end_row();
                    ui.label("");
                    ui.checkbox(&mut o.transparent, "Transparent Background");
                    ui.end_row();
                }
                Tab::TimeAxes => {
                    optional_value(ui, "Start Time:", &mut o.tmin, 1.);
                    optional_value(ui, "End Time:", &mut o.tmax, 1.);
                    ui.label("");
                    ui.checkbox(&mut o.hide_axes, "Hide Axes");
                    ui.end_row();
                    ui.label("");
                    ui.checkbox(&mut o.fixed_y, "Fixed Y-axis (all recordings)");
                    ui.end_row();
                    ui.label("");
                    ui.checkbox(&mut o.scale_bars, "Scale Bars");
                    ui.end_row();
                    ui.label("");
                    ui.checkbox(&mut o.create_axes, "Create Separate Axes File");
                    ui.end_row();
                }
            });
        });
    }

    fn output_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(egui::RichText::new("Output Options").strong());
            ui.horizontal(|ui| {
                match self.output_file.as_ref() {
                    Some(path) => ui.label(
                        egui::RichText::new(format!("Output: {}", file_name(path))).strong(),
                    ),
                    None => ui.label(
                        egui::RichText::new("No output file selected (will show plot)")
                            .italics()
                            .weak(),
                    ),
                };
            });
            ui.horizontal(|ui| {
                if ui.button("Choose Output File...").clicked() {
                    self.browse_output_file();
                }
                if ui.button("Show Only").clicked() {
                    self.output_file = None;
                }
            });
        });
    }

    fn close_dialog(&mut self, ctx: &egui::Context) {
        egui::Window::new("Close Application")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0., 0.])
            .show(ctx, |ui| {
                ui.label("Plot generation is in progress. Close anyway?");
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        if let Some(worker) = self.worker.as_ref() {
                            worker.cancel();
                        }
                        self.allow_close = true;
                        self.confirm_close = false;
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                    if ui.button("No").clicked() {
                        self.confirm_close = false;
                    }
                });
            });
    }
}

impl eframe::App for EmgPlotterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_worker();
        let busy = self.busy();
        if busy {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        if ctx.input(|i| i.viewport().close_requested()) && busy && !self.allow_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.confirm_close = true;
        }

        egui::SidePanel::left("controls")
            .resizable(false)
            .exact_width(400.)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.file_section(ui);
                    self.options_section(ui);
                    self.output_section(ui);
                    ui.horizontal(|ui| {
                        let button = |text: &str| {
                            egui::Button::new(egui::RichText::new(text).strong())
                                .min_size(egui::vec2(120., 35.))
                        };
                        if ui.add_enabled(!busy, button("Preview Plot")).clicked() {
                            self.preview_plot(ctx);
                        }
                        let generate =
                            button("Generate Plot").fill(egui::Color32::from_rgb(76, 175, 80));
                        if ui.add_enabled(!busy, generate).clicked() {
                            self.generate_plot(ctx);
                        }
                    });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Status");
            egui::ScrollArea::vertical()
                .id_source("status")
                .max_height(200.)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    if self.status.lines().is_empty() {
                        ui.label(WELCOME);
                    }
                    for line in self.status.lines() {
                        ui.label(egui::RichText::new(line).monospace());
                    }
                });
            if busy {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Working...");
                });
            }
            ui.separator();
            if let Some(texture) = self.preview.as_ref() {
                let image = egui::Image::from_texture(SizedTexture::from_handle(texture));
                ui.add(image.shrink_to_fit());
            }
        });

        if self.confirm_close {
            self.close_dialog(ctx);
        }
    }
}

/// Title and message of the warning for an unusable csv selection.
fn validate_csv(csv_file: Option<&Path>) -> Result<PathBuf, (&'static str, &'static str)> {
    match csv_file {
        None => Err(("Input Error", "Please select a CSV file first.")),
        Some(path) if !path.exists() => Err(("File Error", "Selected CSV file does not exist.")),
        Some(path) => Ok(path.to_path_buf()),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// checkbox + value, unchecked is "auto"
fn optional_value(ui: &mut egui::Ui, label: &str, value: &mut Option<f64>, speed: f64) {
    ui.label(label);
    ui.horizontal(|ui| {
        let mut set = value.is_some();
        if ui.checkbox(&mut set, "").changed() {
            *value = if set { Some(0.) } else { None };
        }
        match value.as_mut() {
            Some(v) => {
                ui.add(egui::DragValue::new(v).speed(speed));
            }
            None => {
                ui.label(egui::RichText::new("Auto").weak());
            }
        }
    });
    ui.end_row();
}

/// A window with one rendered figure and nothing else.
struct FigureViewer {
    image: Option<egui::ColorImage>,
    texture: Option<egui::TextureHandle>,
}

impl eframe::App for FigureViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(image) = self.image.take() {
            self.texture = Some(ctx.load_texture("figure", image, egui::TextureOptions::LINEAR));
        }
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = self.texture.as_ref() {
                let image = egui::Image::from_texture(SizedTexture::from_handle(texture));
                ui.add(image.shrink_to_fit());
            }
        });
    }
}

/// Shows the figure at screen resolution, blocks until the window is closed.
pub fn show_figure(title: &str, figure: &Figure, opts: &PlotOptions) -> EmgResult<()> {
    let (w, h, rgba) = figure.render_rgba(opts, PREVIEW_DPI)?;
    let image = egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &rgba);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title)
            .with_inner_size([w as f32 + 16., h as f32 + 16.]),
        ..Default::default()
    };
    eframe::run_native(
        title,
        options,
        Box::new(move |_cc| {
            Ok(Box::new(FigureViewer {
                image: Some(image),
                texture: None,
            }))
        }),
    )
    .map_err(render_err)
}

/// Opens the main window, blocks until it is closed.
pub fn run() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("EMG Plotter - Pretty EMG Visualization Tool")
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "EMG Plotter",
        options,
        Box::new(|_cc| Ok(Box::new(EmgPlotterApp::new()))),
    )
}
