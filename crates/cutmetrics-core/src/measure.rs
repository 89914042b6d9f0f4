//! 切割度量引擎
//!
//! 对图纸逐实体计算路径长度，并汇总为总切割长度、穿孔数和外形尺寸。
//!
//! # 规则
//!
//! - 每个实体计一次穿孔（不合并首尾相连的实体，也不识别嵌套轮廓）
//! - 未知实体长度为 0，但仍计入穿孔数
//! - 所有长度与包围盒乘以同一个单位换算系数；穿孔数不缩放

use crate::drawing::Drawing;
use crate::geometry::Entity;
use crate::math::BoundingBox2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 默认展平容差（图纸单位）
pub const DEFAULT_FLATTEN_TOLERANCE: f64 = 0.01;

/// 度量参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasureOptions {
    /// 单位换算系数，1.0 表示不换算
    pub unit_scale: f64,
    /// 多段线展平的最大偏差
    pub flatten_tolerance: f64,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            unit_scale: 1.0,
            flatten_tolerance: DEFAULT_FLATTEN_TOLERANCE,
        }
    }
}

impl MeasureOptions {
    pub fn with_unit_scale(mut self, unit_scale: f64) -> Self {
        self.unit_scale = unit_scale;
        self
    }
}

/// 单个实体的度量结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    /// 实体类型名
    pub kind: String,
    /// 路径长度（输出单位）
    pub length: f64,
    /// 闭合多段线的面积（输出单位²），仅供诊断
    pub area: Option<f64>,
}

/// 整张图纸的度量报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReport {
    pub rows: Vec<MeasurementRow>,
    /// 总切割长度
    pub total_cut_length: f64,
    /// 穿孔数
    pub pierce_count: usize,
    /// 外形包围盒，空图纸为 None
    pub bounds: Option<BoundingBox2>,
    /// 使用的单位换算系数
    pub unit_scale: f64,
}

impl MeasurementReport {
    /// 零件宽度
    pub fn part_width(&self) -> Option<f64> {
        self.bounds.map(|b| b.width())
    }

    /// 零件高度
    pub fn part_height(&self) -> Option<f64> {
        self.bounds.map(|b| b.height())
    }
}

/// 多段线的面积/周长诊断信息，开放多段线面积记为 n/a
fn polyline_diagnostic(entity: &Entity, length: f64, area: Option<f64>) -> Option<String> {
    if !matches!(entity, Entity::Polyline(_)) {
        return None;
    }
    Some(match area {
        Some(area) => format!("Area = {:.3}, Perimeter = {:.3}", area, length),
        None => format!("Area = n/a, Perimeter = {:.3}", length),
    })
}

/// 使用默认参数度量
pub fn measure(drawing: &Drawing) -> MeasurementReport {
    measure_with(drawing, &MeasureOptions::default())
}

/// 度量图纸
pub fn measure_with(drawing: &Drawing, options: &MeasureOptions) -> MeasurementReport {
    let scale = options.unit_scale;
    let tolerance = options.flatten_tolerance;

    let rows: Vec<MeasurementRow> = drawing
        .entities()
        .iter()
        .map(|entity| {
            let length = entity.length(tolerance);
            let area = entity.area(tolerance);
            if let Some(message) = polyline_diagnostic(entity, length, area) {
                debug!("{}", message);
            }
            MeasurementRow {
                kind: entity.type_name().to_string(),
                length: length * scale,
                area: area.map(|a| a * scale * scale),
            }
        })
        .collect();

    let total_cut_length = rows.iter().map(|r| r.length).sum();
    let pierce_count = rows.len();
    let bounds = drawing.bounds(tolerance).map(|b| b.scaled(scale));

    debug!(pierce_count, total_cut_length, "measured drawing");

    MeasurementReport {
        rows,
        total_cut_length,
        pierce_count,
        bounds,
        unit_scale: scale,
    }
}
