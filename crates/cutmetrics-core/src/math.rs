//! 基础数学类型
//!
//! 基于 nalgebra 的二维点/向量别名，以及轴对齐包围盒。

use serde::{Deserialize, Serialize};

/// 二维点
pub type Point2 = nalgebra::Point2<f64>;

/// 二维向量
pub type Vector2 = nalgebra::Vector2<f64>;

/// 几何比较容差
pub const EPSILON: f64 = 1e-10;

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    /// 由两个角点创建（自动整理 min/max）
    pub fn new(a: Point2, b: Point2) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// 由点集创建，点集为空时返回 None
    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first, first);
        for p in iter {
            bbox.expand_to_include(&p);
        }
        Some(bbox)
    }

    /// 扩展以包含指定点
    pub fn expand_to_include(&mut self, point: &Point2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// 合并两个包围盒
    pub fn union(&self, other: &BoundingBox2) -> BoundingBox2 {
        BoundingBox2 {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// 检查点是否在包围盒内
    pub fn contains(&self, point: &Point2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// 以原点为基准整体缩放（单位换算）
    pub fn scaled(&self, factor: f64) -> BoundingBox2 {
        BoundingBox2::new(
            Point2::new(self.min.x * factor, self.min.y * factor),
            Point2::new(self.max.x * factor, self.max.y * factor),
        )
    }
}

/// 将角度（弧度）归一化到 [0, 2π)
pub fn normalize_angle(angle: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let a = angle.rem_euclid(tau);
    // rem_euclid 在极小负数上可能返回 tau 本身
    if a >= tau {
        0.0
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_points() {
        let bbox = BoundingBox2::from_points([
            Point2::new(3.0, -1.0),
            Point2::new(-2.0, 4.0),
            Point2::new(1.0, 1.0),
        ])
        .unwrap();
        assert_eq!(bbox.min, Point2::new(-2.0, -1.0));
        assert_eq!(bbox.max, Point2::new(3.0, 4.0));
        assert!((bbox.width() - 5.0).abs() < EPSILON);
        assert!((bbox.height() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_bbox_empty_points() {
        assert!(BoundingBox2::from_points(Vec::<Point2>::new()).is_none());
    }

    #[test]
    fn test_bbox_union_and_scale() {
        let a = BoundingBox2::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let b = BoundingBox2::new(Point2::new(2.0, -1.0), Point2::new(3.0, 0.5));
        let u = a.union(&b).scaled(2.0);
        assert_eq!(u.min, Point2::new(0.0, -2.0));
        assert_eq!(u.max, Point2::new(6.0, 2.0));
        assert!(u.contains(&Point2::new(1.0, 1.0)));
    }

    #[test]
    fn test_normalize_angle() {
        let pi = std::f64::consts::PI;
        assert!((normalize_angle(-pi / 2.0) - 1.5 * pi).abs() < EPSILON);
        assert!((normalize_angle(5.0 * pi) - pi).abs() < 1e-9);
        assert!(normalize_angle(2.0 * pi).abs() < EPSILON);
    }
}
