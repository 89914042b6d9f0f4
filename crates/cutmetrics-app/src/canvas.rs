//! 图纸绘制
//!
//! 把 [`Drawing`] 画到 egui 画布上。世界坐标 Y 轴向上，屏幕坐标 Y 轴向下。

use cutmetrics_core::drawing::Drawing;
use cutmetrics_core::geometry::Entity;
use cutmetrics_core::math::{BoundingBox2, Point2};

/// 屏幕上弧线/多段线的展平精度（像素）
const SCREEN_TOLERANCE: f64 = 0.5;

/// 缩放到全部时四周保留的像素
const FIT_MARGIN: f64 = 50.0;

/// 画布：当前图纸与视图状态
pub struct Canvas {
    drawing: Option<Drawing>,
    camera_center: Point2,
    camera_zoom: f64,
    viewport_size: (f32, f32),
    pub show_grid: bool,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            drawing: None,
            camera_center: Point2::origin(),
            camera_zoom: 1.0,
            viewport_size: (800.0, 600.0),
            show_grid: true,
        }
    }
}

impl Canvas {
    /// 替换当前图纸并缩放到全部
    pub fn set_drawing(&mut self, drawing: &Drawing) {
        if let Some(viewport) = drawing.viewport() {
            self.show_grid = viewport.grid_on;
        }
        self.drawing = Some(drawing.clone());
        self.zoom_to_fit();
    }

    pub fn drawing(&self) -> Option<&Drawing> {
        self.drawing.as_ref()
    }

    /// 世界坐标转屏幕坐标
    pub fn world_to_screen(&self, point: Point2, rect: &egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        let x = center.x + ((point.x - self.camera_center.x) * self.camera_zoom) as f32;
        let y = center.y - ((point.y - self.camera_center.y) * self.camera_zoom) as f32; // Y轴翻转
        egui::Pos2::new(x, y)
    }

    /// 屏幕坐标转世界坐标
    pub fn screen_to_world(&self, pos: egui::Pos2, rect: &egui::Rect) -> Point2 {
        let center = rect.center();
        let x = self.camera_center.x + ((pos.x - center.x) as f64 / self.camera_zoom);
        let y = self.camera_center.y - ((pos.y - center.y) as f64 / self.camera_zoom); // Y轴翻转
        Point2::new(x, y)
    }

    /// 缩放到适合视图
    ///
    /// 优先使用实体包围盒；空图纸退回到图纸自带的视口。
    pub fn zoom_to_fit(&mut self) {
        let Some(drawing) = &self.drawing else {
            return;
        };

        let bounds = drawing.bounds(SCREEN_TOLERANCE).or_else(|| {
            drawing.viewport().map(|vp| {
                let half = vp.height / 2.0;
                BoundingBox2::new(
                    Point2::new(vp.center.x - half * vp.aspect_ratio, vp.center.y - half),
                    Point2::new(vp.center.x + half * vp.aspect_ratio, vp.center.y + half),
                )
            })
        });

        if let Some(bounds) = bounds {
            self.camera_center = bounds.center();

            let zoom_x = (self.viewport_size.0 as f64 - 2.0 * FIT_MARGIN) / bounds.width().max(1.0);
            let zoom_y = (self.viewport_size.1 as f64 - 2.0 * FIT_MARGIN) / bounds.height().max(1.0);

            self.camera_zoom = zoom_x.min(zoom_y).clamp(0.01, 100.0);
        }
    }

    /// 鼠标滚轮缩放，保持光标下的世界坐标不动
    pub fn zoom_at(&mut self, factor: f64, pos: egui::Pos2, rect: &egui::Rect) {
        let anchor = self.screen_to_world(pos, rect);
        self.camera_zoom = (self.camera_zoom * factor).clamp(0.01, 100.0);
        let moved = self.screen_to_world(pos, rect);
        self.camera_center += anchor - moved;
    }

    /// 按屏幕位移平移
    pub fn pan(&mut self, delta: egui::Vec2) {
        self.camera_center.x -= delta.x as f64 / self.camera_zoom;
        self.camera_center.y += delta.y as f64 / self.camera_zoom;
    }

    /// 绘制画布内容
    pub fn show(&mut self, ui: &mut egui::Ui) {
        let available_rect = ui.available_rect_before_wrap();
        self.viewport_size = (available_rect.width(), available_rect.height());

        let (response, painter) =
            ui.allocate_painter(available_rect.size(), egui::Sense::click_and_drag());
        let rect = response.rect;

        if response.dragged() {
            self.pan(response.drag_delta());
        }
        if let Some(hover_pos) = response.hover_pos() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.zoom_at((1.0 + scroll as f64 * 0.002).max(0.1), hover_pos, &rect);
            }
        }
        if response.double_clicked() {
            self.zoom_to_fit();
        }

        self.draw_grid(&painter, &rect);

        if let Some(drawing) = &self.drawing {
            let stroke = egui::Stroke::new(1.5, egui::Color32::from_rgb(220, 220, 220));
            for entity in drawing.entities() {
                self.draw_entity(&painter, &rect, entity, stroke);
            }
        }
    }

    /// 绘制网格
    fn draw_grid(&self, painter: &egui::Painter, rect: &egui::Rect) {
        if !self.show_grid {
            return;
        }

        // 根据缩放级别调整网格间距
        let mut spacing = 10.0;
        while spacing * self.camera_zoom < 20.0 {
            spacing *= 5.0;
        }
        while spacing * self.camera_zoom > 200.0 {
            spacing /= 5.0;
        }

        let top_left = self.screen_to_world(rect.left_top(), rect);
        let bottom_right = self.screen_to_world(rect.right_bottom(), rect);

        let grid_color = egui::Color32::from_rgb(50, 50, 60);
        let axis_color = egui::Color32::from_rgb(80, 80, 100);

        let mut x = (top_left.x / spacing).floor() * spacing;
        while x <= bottom_right.x {
            let screen_x = self.world_to_screen(Point2::new(x, 0.0), rect).x;
            let color = if x.abs() < 0.001 { axis_color } else { grid_color };
            painter.line_segment(
                [egui::Pos2::new(screen_x, rect.top()), egui::Pos2::new(screen_x, rect.bottom())],
                egui::Stroke::new(1.0, color),
            );
            x += spacing;
        }

        let mut y = (bottom_right.y / spacing).floor() * spacing;
        while y <= top_left.y {
            let screen_y = self.world_to_screen(Point2::new(0.0, y), rect).y;
            let color = if y.abs() < 0.001 { axis_color } else { grid_color };
            painter.line_segment(
                [egui::Pos2::new(rect.left(), screen_y), egui::Pos2::new(rect.right(), screen_y)],
                egui::Stroke::new(1.0, color),
            );
            y += spacing;
        }
    }

    /// 绘制单个实体
    fn draw_entity(
        &self,
        painter: &egui::Painter,
        rect: &egui::Rect,
        entity: &Entity,
        stroke: egui::Stroke,
    ) {
        // 展平精度换算到世界坐标
        let tolerance = SCREEN_TOLERANCE / self.camera_zoom;

        match entity {
            Entity::Line(line) => {
                let start = self.world_to_screen(line.start, rect);
                let end = self.world_to_screen(line.end, rect);
                painter.line_segment([start, end], stroke);
            }
            Entity::Circle(circle) => {
                let center = self.world_to_screen(circle.center, rect);
                let radius = (circle.radius * self.camera_zoom) as f32;
                painter.circle_stroke(center, radius, stroke);
            }
            Entity::Arc(arc) => {
                self.draw_points(painter, rect, &arc.flatten(tolerance), stroke);
            }
            Entity::Polyline(polyline) => {
                self.draw_points(painter, rect, &polyline.flatten(tolerance), stroke);
            }
            Entity::Unknown(_) => {}
        }
    }

    fn draw_points(
        &self,
        painter: &egui::Painter,
        rect: &egui::Rect,
        points: &[Point2],
        stroke: egui::Stroke,
    ) {
        if points.len() < 2 {
            return;
        }
        let screen: Vec<egui::Pos2> = points
            .iter()
            .map(|p| self.world_to_screen(*p, rect))
            .collect();
        painter.add(egui::Shape::line(screen, stroke));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutmetrics_core::drawing::Viewport;
    use cutmetrics_core::geometry::{Circle, Line};

    fn rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0))
    }

    #[test]
    fn test_screen_world_round_trip() {
        let mut canvas = Canvas::default();
        canvas.camera_center = Point2::new(10.0, -5.0);
        canvas.camera_zoom = 2.5;

        let p = Point2::new(42.0, 17.0);
        let back = canvas.screen_to_world(canvas.world_to_screen(p, &rect()), &rect());
        assert!((back - p).norm() < 1e-3);

        // Y 轴向上
        let up = canvas.world_to_screen(Point2::new(10.0, 0.0), &rect());
        let down = canvas.world_to_screen(Point2::new(10.0, -10.0), &rect());
        assert!(up.y < down.y);
    }

    #[test]
    fn test_set_drawing_fits_bounds() {
        let mut canvas = Canvas::default();
        let drawing = Drawing::from_entities(vec![
            Entity::Line(Line::new(Point2::new(0.0, 0.0), Point2::new(100.0, 0.0))),
            Entity::Circle(Circle::new(Point2::new(50.0, 0.0), 25.0)),
        ]);
        canvas.set_drawing(&drawing);

        assert_eq!(canvas.camera_center, Point2::new(50.0, 0.0));
        // (800 - 100) / 100 = 7，(600 - 100) / 50 = 10
        assert!((canvas.camera_zoom - 7.0).abs() < 1e-9);
        assert_eq!(canvas.drawing().map(Drawing::entity_count), Some(2));
    }

    #[test]
    fn test_empty_drawing_uses_viewport() {
        let mut canvas = Canvas::default();
        let drawing = Drawing::new().with_viewport(Viewport::square(200.0));
        canvas.set_drawing(&drawing);

        assert_eq!(canvas.camera_center, Point2::new(100.0, 100.0));
        assert!(canvas.show_grid);
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut canvas = Canvas::default();
        let pos = egui::Pos2::new(600.0, 100.0);
        let before = canvas.screen_to_world(pos, &rect());
        canvas.zoom_at(2.0, pos, &rect());
        let after = canvas.screen_to_world(pos, &rect());
        assert!((after - before).norm() < 1e-3);
        assert_eq!(canvas.camera_zoom, 2.0);
    }
}
