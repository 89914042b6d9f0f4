//! 应用状态

use crate::table::MetricsTable;
use cutmetrics_core::drawing::Drawing;
use cutmetrics_core::measure::MeasurementReport;
use cutmetrics_file::FileFormat;
use std::path::PathBuf;

/// 当前打开的文件及其度量结果
///
/// 每次成功打开文件时整体替换；失败时保持不变。
#[derive(Debug, Clone)]
pub struct AppState {
    /// 当前文件路径
    pub current_file: Option<PathBuf>,
    /// 当前文件格式
    pub format: Option<FileFormat>,
    /// 当前图纸
    pub drawing: Option<Drawing>,
    /// 度量报告
    pub report: Option<MeasurementReport>,
    /// 参数表
    pub table: MetricsTable,
    /// 状态栏消息
    pub status_message: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            current_file: None,
            format: None,
            drawing: None,
            report: None,
            table: MetricsTable::new(),
            status_message: "Ready".to_string(),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已有打开的图纸
    pub fn has_drawing(&self) -> bool {
        self.drawing.is_some()
    }

    /// 窗口标题
    pub fn title(&self) -> String {
        match self.current_file.as_ref().and_then(|p| p.file_name()) {
            Some(name) => format!("CutMetrics - {}", name.to_string_lossy()),
            None => "CutMetrics".to_string(),
        }
    }
}
