//! CutMetrics 核心几何引擎
//!
//! 提供2D几何图元、展平算法和切割度量功能。
//!
//! # 示例
//!
//! ```rust
//! use cutmetrics_core::prelude::*;
//!
//! let drawing = Drawing::from_entities(vec![
//!     Entity::Line(Line::new(Point2::origin(), Point2::new(3.0, 4.0))),
//!     Entity::Circle(Circle::new(Point2::new(5.0, 5.0), 2.0)),
//! ]);
//!
//! let report = measure(&drawing);
//! assert_eq!(report.pierce_count, 2);
//! ```

pub mod drawing;
pub mod geometry;
pub mod math;
pub mod measure;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::drawing::{Drawing, Viewport};
    pub use crate::geometry::{Arc, Circle, Entity, Line, Polyline, PolylineVertex, UnknownEntity};
    pub use crate::math::{BoundingBox2, Point2, Vector2};
    pub use crate::measure::{measure, measure_with, MeasureOptions, MeasurementReport, MeasurementRow};
}
