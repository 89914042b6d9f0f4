//! 控制器
//!
//! 串联 打开文件 → 解析 → 度量 → 显示，并作为唯一的错误边界：
//! 任何 [`FileError`] 都在这里记录日志并通过 [`Display::show_error`] 呈现。

use crate::state::AppState;
use crate::table::MetricsTable;
use cutmetrics_core::drawing::Drawing;
use cutmetrics_core::measure::{measure_with, MeasureOptions, MeasurementReport};
use cutmetrics_file::{dxf_io, loader, FileError, ImportOptions};
use std::path::Path;
use tracing::{error, info};

/// 显示层接口
pub trait Display {
    /// 绘制图纸
    fn render(&mut self, drawing: &Drawing);

    /// 显示度量结果
    fn show_report(&mut self, report: &MeasurementReport, table: &MetricsTable);

    /// 显示错误消息
    fn show_error(&mut self, message: &str);
}

/// 应用控制器
#[derive(Debug, Clone, Default)]
pub struct Controller {
    state: AppState,
    import_options: ImportOptions,
    flatten_tolerance: Option<f64>,
}

impl Controller {
    pub fn new(import_options: ImportOptions) -> Self {
        Self {
            import_options,
            ..Self::default()
        }
    }

    /// 设置展平容差
    pub fn with_flatten_tolerance(mut self, tolerance: f64) -> Self {
        self.flatten_tolerance = Some(tolerance);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn import_options(&self) -> &ImportOptions {
        &self.import_options
    }

    /// 打开文件并刷新显示
    ///
    /// 成功时整体替换图纸、报告与参数表；失败时状态保持不变。
    pub fn open_file(&mut self, path: &Path, display: &mut dyn Display) -> bool {
        match self.load(path) {
            Ok(()) => {
                if let (Some(drawing), Some(report)) = (&self.state.drawing, &self.state.report) {
                    display.render(drawing);
                    display.show_report(report, &self.state.table);
                }
                true
            }
            Err(e) => {
                error!("Failed to open {}: {}", path.display(), e);
                self.state.status_message = format!("Error: {}", e);
                display.show_error(&e.to_string());
                false
            }
        }
    }

    fn load(&mut self, path: &Path) -> Result<(), FileError> {
        let loaded = loader::open(path, &self.import_options)?;

        let mut options = MeasureOptions::default().with_unit_scale(loaded.unit_scale);
        if let Some(tolerance) = self.flatten_tolerance {
            options.flatten_tolerance = tolerance;
        }
        let report = measure_with(&loaded.drawing, &options);
        let table = MetricsTable::from_report(&report);

        info!(
            "Opened {}: cut distance {:.3}, {} pierces",
            path.display(),
            report.total_cut_length,
            report.pierce_count
        );

        self.state = AppState {
            current_file: Some(path.to_path_buf()),
            format: Some(loaded.format),
            drawing: Some(loaded.drawing),
            report: Some(report),
            table,
            status_message: format!("Opened: {}", path.display()),
        };
        Ok(())
    }

    /// 将当前图纸另存为 DXF
    pub fn save_as_dxf(&mut self, path: &Path, display: &mut dyn Display) -> bool {
        let Some(drawing) = &self.state.drawing else {
            display.show_error("No drawing is open.");
            return false;
        };

        match dxf_io::export(drawing, path) {
            Ok(()) => {
                self.state.status_message = format!("Saved: {}", path.display());
                true
            }
            Err(e) => {
                error!("Failed to save {}: {}", path.display(), e);
                display.show_error(&e.to_string());
                false
            }
        }
    }

    /// "Copy All" 的剪贴板文本
    pub fn clipboard_text(&self) -> String {
        self.state.table.to_clipboard_text()
    }
}
