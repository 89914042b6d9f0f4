//! CutMetrics 主应用程序入口
//! 使用 eframe 作为应用框架：打开 DXF（可选 SVG），显示图形与切割参数表

mod canvas;
mod config;

use anyhow::Result;
use eframe::egui;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cutmetrics_core::drawing::Drawing;
use cutmetrics_core::measure::MeasurementReport;
use cutmetrics_ui::{Controller, Display, MetricsTable};

use crate::canvas::Canvas;
use crate::config::AppConfig;

/// 显示层：画布、参数表和错误提示
#[derive(Default)]
struct View {
    canvas: Canvas,
    table: MetricsTable,
    error: Option<String>,
}

impl Display for View {
    fn render(&mut self, drawing: &Drawing) {
        self.canvas.set_drawing(drawing);
    }

    fn show_report(&mut self, _report: &MeasurementReport, table: &MetricsTable) {
        self.table = table.clone();
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }
}

/// 文件操作类型
#[derive(Debug, Clone)]
enum FileOperation {
    Open(std::path::PathBuf),
    SaveDxf(std::path::PathBuf),
}

/// CutMetrics 应用程序
struct CutMetricsApp {
    controller: Controller,
    view: View,
    svg_enabled: bool,

    // 文件操作状态
    pending_file_op: Option<FileOperation>,
}

impl CutMetricsApp {
    fn new(config: &AppConfig) -> Self {
        let import = config.import_options();
        Self {
            controller: Controller::new(import)
                .with_flatten_tolerance(config.measure.flatten_tolerance),
            view: View::default(),
            svg_enabled: import.svg_enabled,
            pending_file_op: None,
        }
    }

    /// 打开文件对话框
    fn show_open_dialog(&mut self) {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("DXF Files", &["dxf"])
            .set_title("Open File");
        if self.svg_enabled {
            dialog = dialog.add_filter("SVG Files", &["svg"]);
        }

        if let Some(path) = dialog.pick_file() {
            self.pending_file_op = Some(FileOperation::Open(path));
        }
    }

    /// 另存为 DXF 对话框
    fn show_save_dialog(&mut self) {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("DXF Files", &["dxf"])
            .set_title("Save as DXF");

        // 沿用当前文件名
        if let Some(stem) = self
            .controller
            .state()
            .current_file
            .as_ref()
            .and_then(|p| p.file_stem())
        {
            dialog = dialog.set_file_name(format!("{}.dxf", stem.to_string_lossy()));
        }

        if let Some(path) = dialog.save_file() {
            self.pending_file_op = Some(FileOperation::SaveDxf(path));
        }
    }

    /// 处理文件操作
    fn process_file_operations(&mut self) {
        if let Some(op) = self.pending_file_op.take() {
            match op {
                FileOperation::Open(path) => {
                    self.controller.open_file(&path, &mut self.view);
                }
                FileOperation::SaveDxf(path) => {
                    self.controller.save_as_dxf(&path, &mut self.view);
                }
            }
        }
    }

    /// 参数表
    fn show_table(&self, ui: &mut egui::Ui) {
        egui::Grid::new("metrics")
            .num_columns(2)
            .striped(true)
            .spacing([24.0, 4.0])
            .show(ui, |ui| {
                ui.strong("Parameter");
                ui.strong("Value");
                ui.end_row();
                for row in self.view.table.rows() {
                    ui.label(row.parameter);
                    ui.label(&row.value);
                    ui.end_row();
                }
            });
    }
}

impl eframe::App for CutMetricsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 处理文件操作
        self.process_file_operations();

        ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.controller.state().title()));

        // 深色主题
        ctx.set_visuals(egui::Visuals::dark());

        let has_drawing = self.controller.state().has_drawing();
        let status = self.controller.state().status_message.clone();

        // ===== 工具栏 =====
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("📂 Open File").clicked() {
                    self.show_open_dialog();
                }
                if ui
                    .add_enabled(has_drawing, egui::Button::new("💾 Save as DXF"))
                    .clicked()
                {
                    self.show_save_dialog();
                }
                ui.separator();
                if ui
                    .selectable_label(self.view.canvas.show_grid, "#")
                    .on_hover_text("Grid")
                    .clicked()
                {
                    self.view.canvas.show_grid = !self.view.canvas.show_grid;
                }
                if ui.button("⊞").on_hover_text("Zoom to fit").clicked() {
                    self.view.canvas.zoom_to_fit();
                }
            });
        });

        // ===== 参数表 =====
        egui::TopBottomPanel::top("metrics").show(ctx, |ui| {
            ui.add_space(4.0);
            self.show_table(ui);
            ui.add_space(4.0);
            if ui.button("📋 Copy All").clicked() {
                ctx.copy_text(self.view.table.to_clipboard_text());
                info!("Copied metrics table to clipboard");
            }
            ui.add_space(4.0);
        });

        // ===== 状态栏 =====
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let count = self
                        .view
                        .canvas
                        .drawing()
                        .map(Drawing::entity_count)
                        .unwrap_or(0);
                    ui.label(format!("Entities: {}", count));
                });
            });
        });

        // ===== 中央绘图区域 =====
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::from_rgb(30, 30, 46)))
            .show(ctx, |ui| {
                self.view.canvas.show(ui);
            });

        // ===== 错误提示 =====
        if let Some(message) = self.view.error.clone() {
            let mut open = true;
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label(&message);
                    if ui.button("OK").clicked() {
                        self.view.error = None;
                    }
                });
            if !open {
                self.view.error = None;
            }
        }
    }
}

/// 初始化日志：`RUST_LOG` 优先，其次配置文件中的等级
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {}", e))
}

fn main() -> Result<()> {
    let config = AppConfig::discover()?;
    init_logging(&config.logging.level)?;

    info!("Starting CutMetrics...");
    if config.import.svg_enabled {
        info!("SVG import enabled at {} dpi", config.import.svg_dpi);
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 800.0])
            .with_title("CutMetrics"),
        ..Default::default()
    };

    eframe::run_native(
        "CutMetrics",
        native_options,
        Box::new(move |_cc| Ok(Box::new(CutMetricsApp::new(&config)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))?;

    Ok(())
}
