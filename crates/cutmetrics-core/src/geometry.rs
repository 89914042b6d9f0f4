//! 几何图元定义
//!
//! 支持的图元（与 DXF 实体一一对应）：
//! - 线段 (Line)
//! - 圆 (Circle)
//! - 圆弧 (Arc)
//! - 多段线 (Polyline)，顶点可带凸度
//!
//! 其他 DXF 实体保留为 [`Entity::Unknown`]，只参与穿孔计数。

use crate::math::{normalize_angle, BoundingBox2, Point2, Vector2, EPSILON};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// 圆弧展平的最大分段数
const MAX_ARC_SEGMENTS: usize = 4096;

const FULL_TURN_DEGREES: f64 = 360.0;

/// 判定整圈时允许的角度误差（度）
const ANGLE_EPSILON_DEGREES: f64 = 1e-9;

/// 实体枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Line(Line),
    Circle(Circle),
    Arc(Arc),
    Polyline(Polyline),
    /// 无法识别的实体，保留原始类型名
    Unknown(UnknownEntity),
}

impl Entity {
    /// 获取实体的类型名称
    pub fn type_name(&self) -> &str {
        match self {
            Entity::Line(_) => "LINE",
            Entity::Circle(_) => "CIRCLE",
            Entity::Arc(_) => "ARC",
            Entity::Polyline(_) => "POLYLINE",
            Entity::Unknown(u) => &u.kind,
        }
    }

    /// 切割路径长度
    ///
    /// 多段线需要展平，`tolerance` 为最大弦高误差；其余图元使用解析解。
    /// 未知实体长度为 0。
    pub fn length(&self, tolerance: f64) -> f64 {
        match self {
            Entity::Line(l) => l.length(),
            Entity::Circle(c) => c.circumference(),
            Entity::Arc(a) => a.length(),
            Entity::Polyline(pl) => pl.length(tolerance),
            Entity::Unknown(_) => 0.0,
        }
    }

    /// 真实几何范围（圆弧考虑曲率），未知实体没有范围
    pub fn bounding_box(&self, tolerance: f64) -> Option<BoundingBox2> {
        match self {
            Entity::Line(l) => Some(l.bounding_box()),
            Entity::Circle(c) => Some(c.bounding_box()),
            Entity::Arc(a) => Some(a.bounding_box()),
            Entity::Polyline(pl) => pl.bounding_box(tolerance),
            Entity::Unknown(_) => None,
        }
    }

    /// 闭合多段线的面积，其他实体返回 None
    pub fn area(&self, tolerance: f64) -> Option<f64> {
        match self {
            Entity::Polyline(pl) => pl.area(tolerance),
            _ => None,
        }
    }
}

/// 线段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

impl Line {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// 计算线段长度
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::new(self.start, self.end)
    }
}

/// 圆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// 计算周长
    pub fn circumference(&self) -> f64 {
        TAU * self.radius
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::new(
            Point2::new(self.center.x - self.radius, self.center.y - self.radius),
            Point2::new(self.center.x + self.radius, self.center.y + self.radius),
        )
    }
}

/// 圆弧
///
/// 角度以度为单位（与 DXF 一致），从起始角逆时针扫到终止角。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2,
    pub radius: f64,
    /// 起始角度（度）
    pub start_angle: f64,
    /// 终止角度（度）
    pub end_angle: f64,
}

impl Arc {
    pub fn new(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
        }
    }

    /// 起始角（弧度，归一化到 [0, 2π)）
    fn start_radians(&self) -> f64 {
        normalize_angle(self.start_angle.rem_euclid(FULL_TURN_DEGREES).to_radians())
    }

    /// 计算扫过的角度（弧度），范围 (0, 2π]
    ///
    /// 在度数上取差再归一化；起止角相差整圈（包括相等）视为整圆。
    pub fn sweep_angle(&self) -> f64 {
        let sweep = (self.end_angle - self.start_angle).rem_euclid(FULL_TURN_DEGREES);
        if sweep < ANGLE_EPSILON_DEGREES || FULL_TURN_DEGREES - sweep < ANGLE_EPSILON_DEGREES {
            TAU
        } else {
            sweep.to_radians()
        }
    }

    /// 计算弧长
    pub fn length(&self) -> f64 {
        self.radius * self.sweep_angle()
    }

    /// 获取圆弧上指定角度（弧度）的点
    pub fn point_at_angle(&self, angle: f64) -> Point2 {
        Point2::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }

    pub fn start_point(&self) -> Point2 {
        self.point_at_angle(self.start_angle.to_radians())
    }

    pub fn end_point(&self) -> Point2 {
        self.point_at_angle(self.end_angle.to_radians())
    }

    /// 检查角度（弧度）是否在弧的范围内
    fn contains_angle(&self, angle: f64) -> bool {
        let offset = normalize_angle(angle - self.start_radians());
        offset <= self.sweep_angle() + EPSILON
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        let mut bbox = BoundingBox2::new(self.start_point(), self.end_point());

        // 检查象限点
        for angle in [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2] {
            if self.contains_angle(angle) {
                bbox.expand_to_include(&self.point_at_angle(angle));
            }
        }

        bbox
    }

    /// 展平为点序列（含起点与终点）
    pub fn flatten(&self, tolerance: f64) -> Vec<Point2> {
        let start = self.start_radians();
        let sweep = self.sweep_angle();
        let segments = arc_segment_count(self.radius, sweep, tolerance);

        let mut points = Vec::with_capacity(segments + 1);
        for i in 0..=segments {
            let t = i as f64 / segments as f64;
            points.push(self.point_at_angle(start + sweep * t));
        }
        points
    }
}

/// 根据弦高误差计算圆弧分段数
fn arc_segment_count(radius: f64, sweep: f64, tolerance: f64) -> usize {
    if radius <= EPSILON || sweep.abs() <= EPSILON {
        return 1;
    }
    // 弦高 = r·(1 − cos(φ/2)) ≤ tolerance
    let x = (1.0 - tolerance / radius).clamp(-1.0, 1.0);
    let step = 2.0 * x.acos();
    if step <= EPSILON {
        return MAX_ARC_SEGMENTS;
    }
    ((sweep.abs() / step).ceil() as usize).clamp(1, MAX_ARC_SEGMENTS)
}

/// 多段线顶点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylineVertex {
    pub point: Point2,
    /// 凸度（bulge）- 到下一顶点的弧线段，0表示直线
    pub bulge: f64,
}

impl PolylineVertex {
    pub fn new(point: Point2) -> Self {
        Self { point, bulge: 0.0 }
    }

    pub fn with_bulge(point: Point2, bulge: f64) -> Self {
        Self { point, bulge }
    }
}

/// 多段线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<PolylineVertex>,
    /// 是否闭合
    pub closed: bool,
}

impl Polyline {
    pub fn new(vertices: Vec<PolylineVertex>, closed: bool) -> Self {
        Self { vertices, closed }
    }

    /// 从点列表创建（所有顶点都是直线连接）
    pub fn from_points(points: impl IntoIterator<Item = Point2>, closed: bool) -> Self {
        Self {
            vertices: points.into_iter().map(PolylineVertex::new).collect(),
            closed,
        }
    }

    /// 线段数量
    pub fn segment_count(&self) -> usize {
        if self.vertices.len() < 2 {
            return 0;
        }
        if self.closed {
            self.vertices.len()
        } else {
            self.vertices.len() - 1
        }
    }

    /// 展平为点序列
    ///
    /// 闭合多段线的结果以起点收尾，因此相邻点距离之和即为周长。
    pub fn flatten(&self, tolerance: f64) -> Vec<Point2> {
        let Some(first) = self.vertices.first() else {
            return Vec::new();
        };

        let mut points = vec![first.point];
        for i in 0..self.segment_count() {
            let v1 = &self.vertices[i];
            let v2 = &self.vertices[(i + 1) % self.vertices.len()];

            if v1.bulge.abs() < EPSILON {
                points.push(v2.point);
            } else {
                flatten_bulge(v1.point, v2.point, v1.bulge, tolerance, &mut points);
            }
        }
        points
    }

    /// 展平后的总长度
    pub fn length(&self, tolerance: f64) -> f64 {
        self.flatten(tolerance)
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum()
    }

    /// 闭合多段线的面积（鞋带公式），开放多段线返回 None
    pub fn area(&self, tolerance: f64) -> Option<f64> {
        if !self.closed {
            return None;
        }
        let points = self.flatten(tolerance);
        if points.len() < 3 {
            return Some(0.0);
        }
        let doubled: f64 = points
            .iter()
            .zip(points.iter().cycle().skip(1))
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum();
        Some(doubled.abs() / 2.0)
    }

    pub fn bounding_box(&self, tolerance: f64) -> Option<BoundingBox2> {
        BoundingBox2::from_points(self.flatten(tolerance))
    }
}

/// 展平一段凸度弧，追加除起点外的所有点（终点精确等于 `end`）
///
/// 包含角 θ = 4·atan(bulge)，正值为逆时针。
fn flatten_bulge(start: Point2, end: Point2, bulge: f64, tolerance: f64, out: &mut Vec<Point2>) {
    let chord = end - start;
    let chord_len = chord.norm();
    if chord_len < EPSILON {
        out.push(end);
        return;
    }

    let sweep = 4.0 * bulge.atan();
    // 圆心位于弦中点沿左法线偏移 c·(1 − b²)/(4b)
    let normal = Vector2::new(-chord.y, chord.x) / chord_len;
    let mid = start + chord * 0.5;
    let center = mid + normal * (chord_len * (1.0 - bulge * bulge) / (4.0 * bulge));
    let radius = (start - center).norm();
    let start_angle = (start.y - center.y).atan2(start.x - center.x);

    let segments = arc_segment_count(radius, sweep, tolerance);
    for i in 1..segments {
        let angle = start_angle + sweep * (i as f64 / segments as f64);
        out.push(Point2::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        ));
    }
    out.push(end);
}

/// 无法识别的实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownEntity {
    /// 源格式中的类型名（如 "TEXT"）
    pub kind: String,
}

impl UnknownEntity {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}
