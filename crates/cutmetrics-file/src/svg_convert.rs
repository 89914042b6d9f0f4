//! SVG → DXF 实体转换
//!
//! 把 [`SvgPath`] 集合转换为 [`Drawing`]：
//!
//! 1. 由两段半圆弧组成的闭合路径识别为圆
//! 2. 直线段原样复制
//! 3. 曲线段（二次/三次贝塞尔、椭圆弧）按约 3 个单位的弦长采样展平
//!
//! SVG 坐标原点在左上角、Y 轴向下；输出坐标 `y = H - svg_y`，
//! 其中 `H` 由 [`resolve_height`] 决定。

use crate::error::FileError;
use crate::svg_io::{parse_svg, SvgArc, SvgDocument, SvgPath, SvgRootAttributes, SvgSegment};
use cutmetrics_core::drawing::{Drawing, Viewport};
use cutmetrics_core::geometry::{Circle, Entity, Line};
use cutmetrics_core::math::{Point2, EPSILON};
use std::str::FromStr;
use svgtypes::{Length, LengthUnit, ViewBox};
use tracing::{debug, info, warn};

/// 无法确定画布高度时使用的默认值
pub const FALLBACK_HEIGHT: f64 = 200.0;

/// 曲线展平的目标采样间距
pub const SAMPLE_SPACING: f64 = 3.0;

/// 单条曲线的采样点上限
pub const MAX_FLATTEN_SAMPLES: usize = 100_000;

/// 画布高度的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightSource {
    /// `viewBox` 的第四个分量
    ViewBox,
    /// 以毫米表示的 `height` 属性
    HeightAttribute,
    /// 默认值
    Fallback,
}

/// 转换结果
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub drawing: Drawing,
    /// 用于 Y 轴翻转的画布高度
    pub height: f64,
    pub height_source: HeightSource,
}

/// 按优先级确定画布高度：viewBox > 毫米 height > 默认值
///
/// 永不失败，格式错误的属性直接跳过。
pub fn resolve_height(attributes: &SvgRootAttributes) -> (f64, HeightSource) {
    if let Some(h) = attributes
        .view_box
        .as_deref()
        .and_then(|s| ViewBox::from_str(s).ok())
        .map(|vb| vb.h)
        .filter(|h| h.is_finite() && *h > 0.0)
    {
        return (h, HeightSource::ViewBox);
    }

    if let Some(h) = attributes
        .height
        .as_deref()
        .and_then(|s| Length::from_str(s.trim()).ok())
        .filter(|len| len.unit == LengthUnit::Mm)
        .map(|len| len.number)
        .filter(|h| h.is_finite() && *h > 0.0)
    {
        return (h, HeightSource::HeightAttribute);
    }

    debug!(
        height = ?attributes.height,
        "No usable viewBox or mm height, falling back to {}",
        FALLBACK_HEIGHT
    );
    (FALLBACK_HEIGHT, HeightSource::Fallback)
}

/// 将路径集合转换为图纸，`height` 为翻转用的画布高度
pub fn convert(paths: &[SvgPath], height: f64) -> Drawing {
    let mut drawing = Drawing::new().with_viewport(Viewport::square(height));

    for path in paths {
        if let Some(circle) = as_circle(path, height) {
            drawing.add_entity(Entity::Circle(circle));
            continue;
        }
        for segment in &path.segments {
            match segment {
                SvgSegment::Line(_) => {
                    drawing.add_entity(Entity::Line(Line::new(
                        flip(segment.start(), height),
                        flip(segment.end(), height),
                    )));
                }
                curve => {
                    for line in flatten_segment(curve, height) {
                        drawing.add_entity(Entity::Line(line));
                    }
                }
            }
        }
    }

    drawing
}

/// 解析根属性确定高度后转换
pub fn convert_document(document: &SvgDocument) -> Conversion {
    let (height, height_source) = resolve_height(&document.attributes);
    debug!(height, ?height_source, "Resolved SVG canvas height");

    let drawing = convert(&document.paths, height);
    info!(
        "Converted {} SVG paths into {} entities",
        document.paths.len(),
        drawing.entity_count()
    );

    Conversion {
        drawing,
        height,
        height_source,
    }
}

/// 解析 SVG 文本并转换，解析错误原样返回
pub fn convert_str(content: &str) -> Result<Conversion, FileError> {
    let document = parse_svg(content)?;
    Ok(convert_document(&document))
}

/// 识别两段同向半圆弧组成的圆
fn as_circle(path: &SvgPath, height: f64) -> Option<Circle> {
    let [SvgSegment::Arc(first), SvgSegment::Arc(second)] = path.segments.as_slice() else {
        return None;
    };
    if !path.is_closed() {
        return None;
    }

    let is_half_circle =
        |arc: &SvgArc| arc.is_circular() && arc.rotation().abs() < EPSILON && arc.is_half_turn();
    if !is_half_circle(first) || !is_half_circle(second) {
        return None;
    }
    if first.sweep().signum() != second.sweep().signum() {
        return None;
    }

    Some(Circle::new(flip(first.center(), height), first.radius().x))
}

/// 曲线的采样点数 `floor(len / 3) + 1`，不超过 [`MAX_FLATTEN_SAMPLES`]
///
/// 长度不是有限值时返回 None。
fn sample_count(length: f64) -> Option<usize> {
    if !length.is_finite() || length < 0.0 {
        return None;
    }
    let spans = (length / SAMPLE_SPACING).floor();
    if spans >= MAX_FLATTEN_SAMPLES as f64 {
        return Some(MAX_FLATTEN_SAMPLES);
    }
    Some((spans as usize).saturating_add(1).min(MAX_FLATTEN_SAMPLES))
}

/// 展平曲线段为翻转后的直线
///
/// 在 `t = n / nump`（`n ∈ [0, nump)`）处采样，相邻采样点连线，
/// 最后一条线连到段的精确终点。长度溢出时退化为起点到终点的一条直线。
fn flatten_segment(segment: &SvgSegment, height: f64) -> Vec<Line> {
    let length = segment.length();
    let Some(nump) = sample_count(length) else {
        warn!(length, "Curve length is not finite, replacing it with its chord");
        return vec![Line::new(
            flip(segment.start(), height),
            flip(segment.end(), height),
        )];
    };

    let samples: Vec<Point2> = (0..nump)
        .map(|n| match n {
            0 => flip(segment.start(), height),
            _ => flip(segment.point(n as f64 / nump as f64), height),
        })
        .collect();

    let mut lines: Vec<Line> = samples
        .windows(2)
        .map(|pair| Line::new(pair[0], pair[1]))
        .collect();

    if let Some(&last) = samples.last() {
        lines.push(Line::new(last, flip(segment.end(), height)));
    }

    lines
}

fn flip(p: Point2, height: f64) -> Point2 {
    Point2::new(p.x, height - p.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg_io::parse_path_data;
    use cutmetrics_core::measure::measure;

    fn attrs(view_box: Option<&str>, height: Option<&str>) -> SvgRootAttributes {
        SvgRootAttributes {
            view_box: view_box.map(str::to_string),
            width: None,
            height: height.map(str::to_string),
        }
    }

    #[test]
    fn test_two_half_arcs_become_exact_circle() {
        let path = parse_path_data("M 40 50 A 10 10 0 1 0 60 50 A 10 10 0 1 0 40 50").unwrap();
        let drawing = convert(&[path], 100.0);

        assert_eq!(drawing.entity_count(), 1);
        match &drawing.entities()[0] {
            Entity::Circle(circle) => {
                assert_eq!(circle.center, Point2::new(50.0, 50.0));
                assert_eq!(circle.radius, 10.0);
            }
            other => panic!("expected circle, got {:?}", other),
        }
    }

    #[test]
    fn test_circle_element_is_detected() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 80">
            <circle cx="30" cy="20" r="5"/>
        </svg>"#;
        let conversion = convert_str(svg).unwrap();
        assert_eq!(conversion.height_source, HeightSource::ViewBox);

        match &conversion.drawing.entities()[0] {
            Entity::Circle(circle) => {
                assert!((circle.center.x - 30.0).abs() < 1e-9);
                assert!((circle.center.y - 60.0).abs() < 1e-9);
                assert!((circle.radius - 5.0).abs() < 1e-9);
            }
            other => panic!("expected circle, got {:?}", other),
        }
    }

    #[test]
    fn test_ellipse_is_not_a_circle() {
        let path = parse_path_data("M 40 50 A 10 5 0 1 0 60 50 A 10 5 0 1 0 40 50").unwrap();
        let drawing = convert(&[path], 100.0);
        assert!(drawing.entity_count() > 2);
        assert!(drawing
            .entities()
            .iter()
            .all(|e| matches!(e, Entity::Line(_))));
    }

    #[test]
    fn test_opposite_sweeps_are_not_a_circle() {
        // 第二段反向扫回原处，首尾相接但不是圆
        let path = parse_path_data("M 40 50 A 10 10 0 1 0 60 50 A 10 10 0 1 1 40 50").unwrap();
        let drawing = convert(&[path], 100.0);
        assert!(drawing
            .entities()
            .iter()
            .all(|e| matches!(e, Entity::Line(_))));
    }

    #[test]
    fn test_lines_are_flipped() {
        let path = parse_path_data("M 0 0 L 10 20").unwrap();
        let drawing = convert(&[path], 100.0);

        assert_eq!(drawing.entity_count(), 1);
        assert_eq!(
            drawing.entities()[0],
            Entity::Line(Line::new(Point2::new(0.0, 100.0), Point2::new(10.0, 80.0)))
        );
    }

    #[test]
    fn test_cubic_flattening_ends_exactly_at_endpoint() {
        let path = parse_path_data("M 0 0 C 10 40 50 40 60 0").unwrap();
        let segment = &path.segments[0];
        let nump = sample_count(segment.length()).unwrap();

        let drawing = convert(&[path.clone()], 100.0);
        assert_eq!(drawing.entity_count(), nump);

        let first = match &drawing.entities()[0] {
            Entity::Line(line) => line.start,
            other => panic!("expected line, got {:?}", other),
        };
        let last = match drawing.entities().last() {
            Some(Entity::Line(line)) => line.end,
            other => panic!("expected line, got {:?}", other),
        };
        assert_eq!(first, Point2::new(0.0, 100.0));
        assert_eq!(last, Point2::new(60.0, 100.0));

        // 相邻直线首尾相连
        for pair in drawing.entities().windows(2) {
            if let [Entity::Line(a), Entity::Line(b)] = pair {
                assert_eq!(a.end, b.start);
            }
        }
    }

    #[test]
    fn test_short_curve_becomes_single_line() {
        let path = parse_path_data("M 0 0 Q 1 1 2 0").unwrap();
        let drawing = convert(&[path], 10.0);
        assert_eq!(drawing.entity_count(), 1);
        assert_eq!(
            drawing.entities()[0],
            Entity::Line(Line::new(Point2::new(0.0, 10.0), Point2::new(2.0, 10.0)))
        );
    }

    #[test]
    fn test_overflowing_curve_becomes_chord() {
        let path = parse_path_data("M 0 0 C 1e308 0 -1e308 0 1 0").unwrap();
        let drawing = convert(&[path], 10.0);
        assert_eq!(drawing.entity_count(), 1);
        assert_eq!(
            drawing.entities()[0],
            Entity::Line(Line::new(Point2::new(0.0, 10.0), Point2::new(1.0, 10.0)))
        );
    }

    #[test]
    fn test_sample_count_is_capped() {
        assert_eq!(sample_count(0.0), Some(1));
        assert_eq!(sample_count(9.5), Some(4));
        assert_eq!(sample_count(1e300), Some(MAX_FLATTEN_SAMPLES));
        assert_eq!(sample_count(f64::INFINITY), None);
        assert_eq!(sample_count(f64::NAN), None);
    }

    #[test]
    fn test_flattened_length_tracks_curve_length() {
        let path = parse_path_data("M 0 0 C 0 100 100 100 100 0").unwrap();
        let curve_length = path.segments[0].length();
        let report = measure(&convert(&[path], 200.0));
        // 弦长总是略短于曲线长度
        assert!(report.total_cut_length <= curve_length + 1e-9);
        assert!(curve_length - report.total_cut_length < 0.01 * curve_length);
    }

    #[test]
    fn test_height_priority() {
        assert_eq!(
            resolve_height(&attrs(Some("0 0 300 150"), Some("90mm"))),
            (150.0, HeightSource::ViewBox)
        );
        assert_eq!(
            resolve_height(&attrs(None, Some("90mm"))),
            (90.0, HeightSource::HeightAttribute)
        );
        assert_eq!(
            resolve_height(&attrs(Some("broken"), Some("90mm"))),
            (90.0, HeightSource::HeightAttribute)
        );
        assert_eq!(
            resolve_height(&attrs(None, Some("90px"))),
            (FALLBACK_HEIGHT, HeightSource::Fallback)
        );
        assert_eq!(
            resolve_height(&attrs(None, Some("90"))),
            (FALLBACK_HEIGHT, HeightSource::Fallback)
        );
        assert_eq!(
            resolve_height(&attrs(None, None)),
            (FALLBACK_HEIGHT, HeightSource::Fallback)
        );
    }

    #[test]
    fn test_viewport_follows_height() {
        let conversion =
            convert_str(r#"<svg xmlns="http://www.w3.org/2000/svg" height="40mm"/>"#).unwrap();
        assert_eq!(conversion.height, 40.0);
        assert_eq!(conversion.height_source, HeightSource::HeightAttribute);
        assert!(conversion.drawing.is_empty());

        let viewport = conversion.drawing.viewport().unwrap();
        assert!(viewport.grid_on);
        assert_eq!(viewport.aspect_ratio, 1.0);
        assert_eq!(viewport.center, Point2::new(20.0, 20.0));
    }

    #[test]
    fn test_malformed_svg_propagates() {
        assert!(matches!(convert_str("<svg"), Err(FileError::Xml(_))));
        assert!(matches!(
            convert_str(r#"<svg><path d="M 0 0 L x"/></svg>"#),
            Err(FileError::PathData(_))
        ));
    }
}
