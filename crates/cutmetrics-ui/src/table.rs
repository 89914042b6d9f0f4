//! 参数表
//!
//! 固定四行：Cut Distance、Pierce Count、Part Width、Part Height。

use cutmetrics_core::measure::MeasurementReport;

/// 未打开文件时的占位值
pub const PLACEHOLDER: &str = "tbd";

/// 没有包围盒时的显示值
pub const NOT_AVAILABLE: &str = "n/a";

/// 行名，按显示顺序
pub const PARAMETERS: [&str; 4] = ["Cut Distance", "Pierce Count", "Part Width", "Part Height"];

/// 参数表的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRow {
    pub parameter: &'static str,
    pub value: String,
}

/// 参数表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsTable {
    rows: Vec<MetricRow>,
}

impl Default for MetricsTable {
    fn default() -> Self {
        Self {
            rows: PARAMETERS
                .iter()
                .map(|&parameter| MetricRow {
                    parameter,
                    value: PLACEHOLDER.to_string(),
                })
                .collect(),
        }
    }
}

impl MetricsTable {
    /// 全部为占位值的表
    pub fn new() -> Self {
        Self::default()
    }

    /// 由度量报告生成
    pub fn from_report(report: &MeasurementReport) -> Self {
        let extent = |value: Option<f64>| {
            value
                .map(format_length)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        let values = [
            format_length(report.total_cut_length),
            report.pierce_count.to_string(),
            extent(report.part_width()),
            extent(report.part_height()),
        ];

        Self {
            rows: PARAMETERS
                .iter()
                .zip(values)
                .map(|(&parameter, value)| MetricRow { parameter, value })
                .collect(),
        }
    }

    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    /// 查找某一行的值
    pub fn value(&self, parameter: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.parameter == parameter)
            .map(|r| r.value.as_str())
    }

    /// 剪贴板文本：每行 `参数\t值\n`
    pub fn to_clipboard_text(&self) -> String {
        self.rows
            .iter()
            .map(|r| format!("{}\t{}\n", r.parameter, r.value))
            .collect()
    }
}

fn format_length(value: f64) -> String {
    format!("{:.3}", value)
}
