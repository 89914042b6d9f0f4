//! 图纸
//!
//! 一次打开文件生成一个 [`Drawing`]，之后只读。

use crate::geometry::Entity;
use crate::math::{BoundingBox2, Point2};
use serde::{Deserialize, Serialize};

/// 默认视口设置（仅用于显示）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// 是否显示网格
    pub grid_on: bool,
    /// 宽高比
    pub aspect_ratio: f64,
    /// 视图高度（模型空间）
    pub height: f64,
    /// 视图中心（模型空间）
    pub center: Point2,
}

impl Viewport {
    /// 以给定画布高度构造正方形视口：网格开启、1:1 比例、中心位于 (h/2, h/2)
    pub fn square(height: f64) -> Self {
        Self {
            grid_on: true,
            aspect_ratio: 1.0,
            height,
            center: Point2::new(height / 2.0, height / 2.0),
        }
    }
}

/// 有序实体集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    entities: Vec<Entity>,
    viewport: Option<Viewport>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            viewport: None,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// 所有实体的真实几何范围；没有可测量几何时返回 None
    pub fn bounds(&self, tolerance: f64) -> Option<BoundingBox2> {
        self.entities
            .iter()
            .filter_map(|e| e.bounding_box(tolerance))
            .reduce(|acc, b| acc.union(&b))
    }
}
