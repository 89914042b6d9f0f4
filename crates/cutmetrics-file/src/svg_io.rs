//! SVG 路径解析
//!
//! 使用 `roxmltree` 读取 XML、`svgtypes` 解析路径数据与长度，曲线段的求值、
//! 弧的圆心参数化和长度计算交给 `lyon::geom`。得到的路径仍是 SVG 的左上角原点、
//! Y 轴向下坐标。
//!
//! 基本图形按常见路径库的方式转为路径：
//! - `<line>` / `<polyline>` / `<polygon>`：直线段
//! - `<rect>`：四条边（忽略圆角）
//! - `<circle>` / `<ellipse>`：两段半圆弧
//!
//! 不处理 `transform` 属性。

use crate::error::FileError;
use cutmetrics_core::math::{Point2, Vector2, EPSILON};
use lyon::geom::{
    point, vector, Angle, ArcFlags, CubicBezierSegment, LineSegment, QuadraticBezierSegment,
    Segment,
};
use std::f64::consts::{PI, TAU};
use std::str::FromStr;
use svgtypes::PathSegment;

type LyonPoint = lyon::geom::Point<f64>;

/// 弧长展平的相对容差（相对于控制多边形长度）
const LENGTH_TOLERANCE: f64 = 1e-7;

fn to_lyon(p: Point2) -> LyonPoint {
    point(p.x, p.y)
}

fn from_lyon(p: LyonPoint) -> Point2 {
    Point2::new(p.x, p.y)
}

/// 椭圆弧段
#[derive(Debug, Clone, PartialEq)]
pub struct SvgArc {
    pub start: Point2,
    pub end: Point2,
    /// 圆心参数化结果
    arc: lyon::geom::Arc<f64>,
}

impl SvgArc {
    /// 端点参数化转圆心参数化（SVG 1.1 附录 F.6.5，半径不足时按 F.6.6 放大）
    ///
    /// 半径为 0 或起止点重合时返回 None，调用方应视作直线。
    pub fn new(
        start: Point2,
        end: Point2,
        radius: Vector2,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
    ) -> Option<Self> {
        let svg_arc = lyon::geom::SvgArc {
            from: to_lyon(start),
            to: to_lyon(end),
            radii: vector(radius.x.abs(), radius.y.abs()),
            x_rotation: Angle::degrees(rotation),
            flags: ArcFlags { large_arc, sweep },
        };
        if svg_arc.is_straight_line() {
            return None;
        }

        let mut arc = svg_arc.to_arc();

        // to_arc 的起止角是快速 atan2 近似值，按端点重算，扫角取最接近的整圈代表
        let start_angle = arc_parameter(&arc, svg_arc.from);
        let end_angle = arc_parameter(&arc, svg_arc.to);
        let approximate = arc.sweep_angle.radians;
        let mut delta = end_angle - start_angle;
        delta += TAU * ((approximate - delta) / TAU).round();

        arc.start_angle = Angle::radians(start_angle);
        arc.sweep_angle = Angle::radians(delta);

        Some(Self { start, end, arc })
    }

    pub fn center(&self) -> Point2 {
        from_lyon(self.arc.center)
    }

    /// 修正后的半径 (rx, ry)
    pub fn radius(&self) -> Vector2 {
        Vector2::new(self.arc.radii.x, self.arc.radii.y)
    }

    /// x 轴旋转角（度）
    pub fn rotation(&self) -> f64 {
        self.arc.x_rotation.to_degrees()
    }

    /// 扫过的参数角（弧度，带符号）
    pub fn sweep(&self) -> f64 {
        self.arc.sweep_angle.radians
    }

    /// 是否为正圆弧（rx == ry）
    pub fn is_circular(&self) -> bool {
        (self.arc.radii.x - self.arc.radii.y).abs() < EPSILON
    }

    /// 是否恰好扫过半圈
    pub fn is_half_turn(&self) -> bool {
        (self.sweep().abs() - PI).abs() < 1e-9
    }

    /// 参数 t ∈ [0, 1] 处的点
    pub fn point(&self, t: f64) -> Point2 {
        from_lyon(self.arc.sample(t))
    }

    fn length(&self) -> f64 {
        let sweep = self.sweep().abs();
        if self.is_circular() {
            return self.arc.radii.x * sweep;
        }

        let hull = self.arc.radii.x.max(self.arc.radii.y) * sweep;
        if !hull.is_finite() || hull <= 0.0 {
            return hull;
        }
        let unit = lyon::geom::Arc {
            center: point(0.0, 0.0),
            radii: self.arc.radii / hull,
            ..self.arc
        };
        unit.approximate_length(LENGTH_TOLERANCE) * hull
    }
}

/// 点在椭圆上的参数角
fn arc_parameter(arc: &lyon::geom::Arc<f64>, p: LyonPoint) -> f64 {
    let (sin_phi, cos_phi) = arc.x_rotation.radians.sin_cos();
    let d = p - arc.center;
    let x = (cos_phi * d.x + sin_phi * d.y) / arc.radii.x;
    let y = (-sin_phi * d.x + cos_phi * d.y) / arc.radii.y;
    y.atan2(x)
}

/// 路径段
#[derive(Debug, Clone, PartialEq)]
pub enum SvgSegment {
    Line(LineSegment<f64>),
    Quadratic(QuadraticBezierSegment<f64>),
    Cubic(CubicBezierSegment<f64>),
    Arc(SvgArc),
}

impl SvgSegment {
    pub fn line(start: Point2, end: Point2) -> Self {
        SvgSegment::Line(LineSegment {
            from: to_lyon(start),
            to: to_lyon(end),
        })
    }

    pub fn quadratic(start: Point2, control: Point2, end: Point2) -> Self {
        SvgSegment::Quadratic(QuadraticBezierSegment {
            from: to_lyon(start),
            ctrl: to_lyon(control),
            to: to_lyon(end),
        })
    }

    pub fn cubic(start: Point2, control1: Point2, control2: Point2, end: Point2) -> Self {
        SvgSegment::Cubic(CubicBezierSegment {
            from: to_lyon(start),
            ctrl1: to_lyon(control1),
            ctrl2: to_lyon(control2),
            to: to_lyon(end),
        })
    }

    pub fn start(&self) -> Point2 {
        match self {
            SvgSegment::Line(line) => from_lyon(line.from),
            SvgSegment::Quadratic(curve) => from_lyon(curve.from),
            SvgSegment::Cubic(curve) => from_lyon(curve.from),
            SvgSegment::Arc(arc) => arc.start,
        }
    }

    pub fn end(&self) -> Point2 {
        match self {
            SvgSegment::Line(line) => from_lyon(line.to),
            SvgSegment::Quadratic(curve) => from_lyon(curve.to),
            SvgSegment::Cubic(curve) => from_lyon(curve.to),
            SvgSegment::Arc(arc) => arc.end,
        }
    }

    /// 参数 t ∈ [0, 1] 处的点
    pub fn point(&self, t: f64) -> Point2 {
        match self {
            SvgSegment::Line(line) => from_lyon(line.sample(t)),
            SvgSegment::Quadratic(curve) => from_lyon(curve.sample(t)),
            SvgSegment::Cubic(curve) => from_lyon(curve.sample(t)),
            SvgSegment::Arc(arc) => arc.point(t),
        }
    }

    /// 段长度
    ///
    /// 直线与正圆弧使用解析解，其余在缩放到单位尺寸后由 lyon 展平求和。
    /// 坐标溢出时返回非有限值。
    pub fn length(&self) -> f64 {
        match self {
            SvgSegment::Line(line) => line.length(),
            SvgSegment::Arc(arc) => arc.length(),
            SvgSegment::Quadratic(curve) => {
                let hull = polygon_length(&[curve.from, curve.ctrl, curve.to]);
                if !hull.is_finite() || hull <= 0.0 {
                    return hull;
                }
                let unit = QuadraticBezierSegment {
                    from: point(0.0, 0.0),
                    ctrl: unit_point(curve.ctrl, curve.from, hull),
                    to: unit_point(curve.to, curve.from, hull),
                };
                unit.approximate_length(LENGTH_TOLERANCE) * hull
            }
            SvgSegment::Cubic(curve) => {
                let hull = polygon_length(&[curve.from, curve.ctrl1, curve.ctrl2, curve.to]);
                if !hull.is_finite() || hull <= 0.0 {
                    return hull;
                }
                let unit = CubicBezierSegment {
                    from: point(0.0, 0.0),
                    ctrl1: unit_point(curve.ctrl1, curve.from, hull),
                    ctrl2: unit_point(curve.ctrl2, curve.from, hull),
                    to: unit_point(curve.to, curve.from, hull),
                };
                unit.approximate_length(LENGTH_TOLERANCE) * hull
            }
        }
    }
}

/// 控制多边形长度，贝塞尔曲线长度的上界
fn polygon_length(points: &[LyonPoint]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).length()).sum()
}

fn unit_point(p: LyonPoint, origin: LyonPoint, scale: f64) -> LyonPoint {
    point((p.x - origin.x) / scale, (p.y - origin.y) / scale)
}

/// 一个 SVG 元素对应的路径（可能含多个子路径）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SvgPath {
    pub segments: Vec<SvgSegment>,
}

impl SvgPath {
    pub fn new(segments: Vec<SvgSegment>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn start(&self) -> Option<Point2> {
        self.segments.first().map(SvgSegment::start)
    }

    pub fn end(&self) -> Option<Point2> {
        self.segments.last().map(SvgSegment::end)
    }

    /// 首尾相接
    pub fn is_closed(&self) -> bool {
        match (self.start(), self.end()) {
            (Some(s), Some(e)) => (e - s).norm() < EPSILON,
            _ => false,
        }
    }
}

/// 根元素上与画布尺寸相关的属性
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SvgRootAttributes {
    pub view_box: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

/// 解析后的 SVG 文档
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SvgDocument {
    pub paths: Vec<SvgPath>,
    pub attributes: SvgRootAttributes,
}

/// 解析 SVG 文本
pub fn parse_svg(content: &str) -> Result<SvgDocument, FileError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let xml = roxmltree::Document::parse_with_options(content, options)?;
    let root = xml.root_element();

    let attributes = SvgRootAttributes {
        view_box: root.attribute("viewBox").map(str::to_string),
        width: root.attribute("width").map(str::to_string),
        height: root.attribute("height").map(str::to_string),
    };

    let mut paths = Vec::new();
    for node in xml.descendants().filter(|n| n.is_element()) {
        let path = match node.tag_name().name() {
            "path" => match node.attribute("d") {
                Some(d) => parse_path_data(d)?,
                None => continue,
            },
            "line" => line_path(&node)?,
            "polyline" => points_path(&node, false),
            "polygon" => points_path(&node, true),
            "rect" => rect_path(&node)?,
            "circle" => {
                let r = number_attr(&node, "r")?;
                ellipse_path(number_attr(&node, "cx")?, number_attr(&node, "cy")?, r, r)
            }
            "ellipse" => ellipse_path(
                number_attr(&node, "cx")?,
                number_attr(&node, "cy")?,
                number_attr(&node, "rx")?,
                number_attr(&node, "ry")?,
            ),
            _ => continue,
        };
        if !path.is_empty() {
            paths.push(path);
        }
    }

    Ok(SvgDocument { paths, attributes })
}

/// 读取数值属性，缺省为 0，单位被忽略
fn number_attr(node: &roxmltree::Node, name: &str) -> Result<f64, FileError> {
    match node.attribute(name) {
        Some(value) => Ok(svgtypes::Length::from_str(value)?.number),
        None => Ok(0.0),
    }
}

fn line_path(node: &roxmltree::Node) -> Result<SvgPath, FileError> {
    let start = Point2::new(number_attr(node, "x1")?, number_attr(node, "y1")?);
    let end = Point2::new(number_attr(node, "x2")?, number_attr(node, "y2")?);
    Ok(SvgPath::new(vec![SvgSegment::line(start, end)]))
}

fn points_path(node: &roxmltree::Node, closed: bool) -> SvgPath {
    let points: Vec<Point2> = node
        .attribute("points")
        .map(|s| {
            svgtypes::PointsParser::from(s)
                .map(|(x, y)| Point2::new(x, y))
                .collect()
        })
        .unwrap_or_default();

    let mut segments: Vec<SvgSegment> = points
        .windows(2)
        .map(|w| SvgSegment::line(w[0], w[1]))
        .collect();

    if closed && points.len() > 2 {
        let (first, last) = (points[0], points[points.len() - 1]);
        if (last - first).norm() > EPSILON {
            segments.push(SvgSegment::line(last, first));
        }
    }
    SvgPath::new(segments)
}

fn rect_path(node: &roxmltree::Node) -> Result<SvgPath, FileError> {
    let x = number_attr(node, "x")?;
    let y = number_attr(node, "y")?;
    let w = number_attr(node, "width")?;
    let h = number_attr(node, "height")?;
    if w <= 0.0 || h <= 0.0 {
        return Ok(SvgPath::default());
    }

    let corners = [
        Point2::new(x, y),
        Point2::new(x + w, y),
        Point2::new(x + w, y + h),
        Point2::new(x, y + h),
    ];
    let segments = (0..4)
        .map(|i| SvgSegment::line(corners[i], corners[(i + 1) % 4]))
        .collect();
    Ok(SvgPath::new(segments))
}

/// 椭圆/圆：从最左点出发，两段逆向（sweep = 0）半圆弧
fn ellipse_path(cx: f64, cy: f64, rx: f64, ry: f64) -> SvgPath {
    let left = Point2::new(cx - rx, cy);
    let right = Point2::new(cx + rx, cy);
    let radius = Vector2::new(rx, ry);

    let halves = [(left, right), (right, left)];
    let segments = halves
        .iter()
        .filter_map(|&(from, to)| SvgArc::new(from, to, radius, 0.0, true, false))
        .map(SvgSegment::Arc)
        .collect();
    SvgPath::new(segments)
}

/// 解析路径数据（`d` 属性），支持全部命令的绝对与相对形式
pub fn parse_path_data(d: &str) -> Result<SvgPath, FileError> {
    let mut segments = Vec::new();
    let mut current = Point2::origin();
    let mut subpath_start = Point2::origin();
    // 上一条曲线的控制点，用于 S/T 反射
    let mut last_cubic_control: Option<Point2> = None;
    let mut last_quad_control: Option<Point2> = None;

    for segment in svgtypes::PathParser::from(d) {
        let segment = segment?;
        let resolve = move |abs: bool, x: f64, y: f64| {
            if abs {
                Point2::new(x, y)
            } else {
                Point2::new(current.x + x, current.y + y)
            }
        };

        let mut cubic_control = None;
        let mut quad_control = None;

        match segment {
            PathSegment::MoveTo { abs, x, y } => {
                current = resolve(abs, x, y);
                subpath_start = current;
            }
            PathSegment::LineTo { abs, x, y } => {
                let end = resolve(abs, x, y);
                segments.push(SvgSegment::line(current, end));
                current = end;
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                let end = if abs {
                    Point2::new(x, current.y)
                } else {
                    Point2::new(current.x + x, current.y)
                };
                segments.push(SvgSegment::line(current, end));
                current = end;
            }
            PathSegment::VerticalLineTo { abs, y } => {
                let end = if abs {
                    Point2::new(current.x, y)
                } else {
                    Point2::new(current.x, current.y + y)
                };
                segments.push(SvgSegment::line(current, end));
                current = end;
            }
            PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let control1 = resolve(abs, x1, y1);
                let control2 = resolve(abs, x2, y2);
                let end = resolve(abs, x, y);
                segments.push(SvgSegment::cubic(current, control1, control2, end));
                cubic_control = Some(control2);
                current = end;
            }
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                let control1 = reflect(last_cubic_control, current);
                let control2 = resolve(abs, x2, y2);
                let end = resolve(abs, x, y);
                segments.push(SvgSegment::cubic(current, control1, control2, end));
                cubic_control = Some(control2);
                current = end;
            }
            PathSegment::Quadratic { abs, x1, y1, x, y } => {
                let control = resolve(abs, x1, y1);
                let end = resolve(abs, x, y);
                segments.push(SvgSegment::quadratic(current, control, end));
                quad_control = Some(control);
                current = end;
            }
            PathSegment::SmoothQuadratic { abs, x, y } => {
                let control = reflect(last_quad_control, current);
                let end = resolve(abs, x, y);
                segments.push(SvgSegment::quadratic(current, control, end));
                quad_control = Some(control);
                current = end;
            }
            PathSegment::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let end = resolve(abs, x, y);
                if (end - current).norm() > EPSILON {
                    let arc = SvgArc::new(
                        current,
                        end,
                        Vector2::new(rx, ry),
                        x_axis_rotation,
                        large_arc,
                        sweep,
                    );
                    segments.push(match arc {
                        Some(arc) => SvgSegment::Arc(arc),
                        None => SvgSegment::line(current, end),
                    });
                }
                current = end;
            }
            PathSegment::ClosePath { .. } => {
                if (subpath_start - current).norm() > EPSILON {
                    segments.push(SvgSegment::line(current, subpath_start));
                }
                current = subpath_start;
            }
        }

        last_cubic_control = cubic_control;
        last_quad_control = quad_control;
    }

    Ok(SvgPath::new(segments))
}

/// 控制点关于当前点的反射；没有上一控制点时取当前点
fn reflect(control: Option<Point2>, current: Point2) -> Point2 {
    match control {
        Some(c) => Point2::new(2.0 * current.x - c.x, 2.0 * current.y - c.y),
        None => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point(actual: Point2, x: f64, y: f64) {
        assert!(
            (actual.x - x).abs() < 1e-9 && (actual.y - y).abs() < 1e-9,
            "expected ({x}, {y}), got ({}, {})",
            actual.x,
            actual.y
        );
    }

    #[test]
    fn test_arc_center_parameterization() {
        let arc = SvgArc::new(
            Point2::new(40.0, 50.0),
            Point2::new(60.0, 50.0),
            Vector2::new(10.0, 10.0),
            0.0,
            true,
            false,
        )
        .unwrap();
        assert_eq!(arc.center(), Point2::new(50.0, 50.0));
        assert!(arc.is_circular());
        assert!(arc.is_half_turn());
        assert!(arc.sweep() < 0.0);
        assert_point(arc.point(1.0), 60.0, 50.0);
        // sweep = 0 沿负角方向，经过 y 较大的一侧
        assert_point(arc.point(0.5), 50.0, 60.0);
    }

    #[test]
    fn test_arc_radius_correction() {
        // 半径不足以连接两端点时按比例放大
        let arc = SvgArc::new(
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Vector2::new(1.0, 1.0),
            0.0,
            false,
            true,
        )
        .unwrap();
        assert!((arc.radius().x - 5.0).abs() < 1e-9);
        assert_point(arc.center(), 5.0, 0.0);
        assert!(arc.is_half_turn());
    }

    #[test]
    fn test_zero_radius_arc_is_line() {
        let path = parse_path_data("M0,0 A0,5 0 0,1 10,0").unwrap();
        assert_eq!(path.len(), 1);
        assert!(matches!(path.segments[0], SvgSegment::Line(_)));
    }

    #[test]
    fn test_relative_and_shorthand_commands() {
        let path = parse_path_data("m10,10 h5 v5 l-5,0 z").unwrap();
        assert_eq!(path.len(), 4);
        assert!(path.is_closed());
        assert_point(path.segments[1].end(), 15.0, 15.0);
        assert_point(path.segments[3].end(), 10.0, 10.0);
    }

    #[test]
    fn test_smooth_cubic_reflects_control() {
        let path = parse_path_data("M0,0 C0,10 10,10 10,0 S20,-10 20,0").unwrap();
        match &path.segments[1] {
            SvgSegment::Cubic(curve) => assert_point(from_lyon(curve.ctrl1), 10.0, -10.0),
            other => panic!("expected cubic, got {:?}", other),
        }
    }

    #[test]
    fn test_segment_lengths() {
        let line = SvgSegment::line(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        assert!((line.length() - 5.0).abs() < 1e-12);

        // 直线形状的三次曲线长度等于弦长
        let straight = SvgSegment::cubic(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 0.0),
        );
        assert!((straight.length() - 3.0).abs() < 1e-6);

        // 大坐标下按比例缩放后仍然收敛
        let far = SvgSegment::quadratic(
            Point2::new(1e12, 0.0),
            Point2::new(1e12 + 5e11, 0.0),
            Point2::new(2e12, 0.0),
        );
        assert!((far.length() / 1e12 - 1.0).abs() < 1e-6);

        // 溢出的曲线得到非有限长度而不是挂起
        let huge = SvgSegment::cubic(
            Point2::new(0.0, 0.0),
            Point2::new(1e308, 0.0),
            Point2::new(-1e308, 0.0),
            Point2::new(1.0, 0.0),
        );
        assert!(!huge.length().is_finite());

        // 椭圆半周长在两个圆的半周长之间
        let half_ellipse = ellipse_path(0.0, 0.0, 20.0, 10.0);
        let len = half_ellipse.segments[0].length();
        assert!(len > PI * 10.0 && len < PI * 20.0);
        // 半椭圆周长（Ramanujan 近似）约 48.44
        assert!((len - 48.442).abs() < 0.01, "half ellipse length {len}");

        let half_circle = ellipse_path(0.0, 0.0, 10.0, 10.0);
        assert!((half_circle.segments[1].length() - PI * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_svg_shapes() {
        let svg = r#"<?xml version="1.0"?>
            <svg xmlns="http://www.w3.org/2000/svg" width="100mm" height="80mm" viewBox="0 0 100 80">
              <g>
                <rect x="1" y="2" width="10" height="5"/>
                <circle cx="50" cy="40" r="10"/>
                <line x1="0" y1="0" x2="5" y2="5"/>
                <polygon points="0,0 10,0 10,10"/>
                <path d="M0,0 Q5,5 10,0"/>
                <text x="0" y="0">ignored</text>
              </g>
            </svg>"#;
        let doc = parse_svg(svg).unwrap();
        assert_eq!(doc.paths.len(), 5);
        assert_eq!(doc.attributes.view_box.as_deref(), Some("0 0 100 80"));
        assert_eq!(doc.attributes.height.as_deref(), Some("80mm"));

        assert_eq!(doc.paths[0].len(), 4);
        assert!(doc.paths[0].is_closed());
        assert_eq!(doc.paths[1].len(), 2);
        assert!(doc.paths[1].is_closed());
        assert_eq!(doc.paths[3].len(), 3);
    }

    #[test]
    fn test_malformed_svg_is_error() {
        assert!(matches!(parse_svg("<svg><path d="), Err(FileError::Xml(_))));
        assert!(matches!(
            parse_svg(r#"<svg><path d="M 0 0 L 10"/></svg>"#),
            Err(FileError::PathData(_))
        ));
    }
}
