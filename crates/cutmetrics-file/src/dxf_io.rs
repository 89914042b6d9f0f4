//! DXF文件导入/导出
//!
//! 借助 `dxf` 库读写 AutoCAD DXF 格式，在其实体模型与 [`Drawing`] 之间转换。

use crate::error::FileError;
use cutmetrics_core::drawing::Drawing;
use cutmetrics_core::geometry::{Arc, Circle, Entity, Line, Polyline, PolylineVertex, UnknownEntity};
use cutmetrics_core::math::Point2;
use dxf::entities::EntityType;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// 从DXF文件导入
pub fn import(path: &Path) -> Result<Drawing, FileError> {
    let dxf_drawing = dxf::Drawing::load_file(path)?;
    let drawing = from_dxf(&dxf_drawing);
    info!(
        "Imported {} entities from {}",
        drawing.entity_count(),
        path.display()
    );
    Ok(drawing)
}

/// 从内存中的文件内容导入
pub fn import_bytes(bytes: &[u8]) -> Result<Drawing, FileError> {
    let mut reader = Cursor::new(bytes);
    let dxf_drawing = dxf::Drawing::load(&mut reader)?;
    Ok(from_dxf(&dxf_drawing))
}

/// 将 DXF 模型空间实体转换为图纸
pub fn from_dxf(dxf_drawing: &dxf::Drawing) -> Drawing {
    let mut drawing = Drawing::new();
    for entity in dxf_drawing.entities() {
        if entity.common.is_in_paper_space {
            debug!(
                "Skipping paper space {} entity",
                entity_type_name(&entity.specific)
            );
            continue;
        }
        drawing.add_entity(convert_dxf_entity(&entity.specific));
    }
    drawing
}

/// 将DXF实体转换为图纸实体
fn convert_dxf_entity(specific: &EntityType) -> Entity {
    match specific {
        EntityType::Line(line) => {
            let start = Point2::new(line.p1.x, line.p1.y);
            let end = Point2::new(line.p2.x, line.p2.y);
            Entity::Line(Line::new(start, end))
        }

        EntityType::Circle(circle) => {
            let center = Point2::new(circle.center.x, circle.center.y);
            Entity::Circle(Circle::new(center, circle.radius))
        }

        EntityType::Arc(arc) => {
            let center = Point2::new(arc.center.x, arc.center.y);
            Entity::Arc(Arc::new(center, arc.radius, arc.start_angle, arc.end_angle))
        }

        EntityType::LwPolyline(lwpoly) => {
            let vertices: Vec<PolylineVertex> = lwpoly
                .vertices
                .iter()
                .map(|v| PolylineVertex::with_bulge(Point2::new(v.x, v.y), v.bulge))
                .collect();

            Entity::Polyline(Polyline::new(vertices, lwpoly.is_closed()))
        }

        EntityType::Polyline(poly) => {
            let vertices: Vec<PolylineVertex> = poly
                .vertices()
                .map(|v| {
                    PolylineVertex::with_bulge(Point2::new(v.location.x, v.location.y), v.bulge)
                })
                .collect();

            Entity::Polyline(Polyline::new(vertices, poly.is_closed()))
        }

        other => {
            let kind = entity_type_name(other);
            debug!("Keeping unsupported DXF entity {} as zero-length", kind);
            Entity::Unknown(UnknownEntity::new(kind))
        }
    }
}

/// DXF 实体类型名（组码 0 的值）
fn entity_type_name(specific: &EntityType) -> &'static str {
    match specific {
        EntityType::Line(_) => "LINE",
        EntityType::Circle(_) => "CIRCLE",
        EntityType::Arc(_) => "ARC",
        EntityType::LwPolyline(_) => "LWPOLYLINE",
        EntityType::Polyline(_) => "POLYLINE",
        EntityType::Vertex(_) => "VERTEX",
        EntityType::Seqend(_) => "SEQEND",
        EntityType::Text(_) => "TEXT",
        EntityType::MText(_) => "MTEXT",
        EntityType::RText(_) => "RTEXT",
        EntityType::ArcAlignedText(_) => "ARCALIGNEDTEXT",
        EntityType::Attribute(_) => "ATTRIB",
        EntityType::AttributeDefinition(_) => "ATTDEF",
        EntityType::ModelPoint(_) => "POINT",
        EntityType::Insert(_) => "INSERT",
        EntityType::Ellipse(_) => "ELLIPSE",
        EntityType::Spline(_) => "SPLINE",
        EntityType::Helix(_) => "HELIX",
        EntityType::Ray(_) => "RAY",
        EntityType::XLine(_) => "XLINE",
        EntityType::MLine(_) => "MLINE",
        EntityType::Solid(_) => "SOLID",
        EntityType::Trace(_) => "TRACE",
        EntityType::Face3D(_) => "3DFACE",
        EntityType::Solid3D(_) => "3DSOLID",
        EntityType::Body(_) => "BODY",
        EntityType::Region(_) => "REGION",
        EntityType::Leader(_) => "LEADER",
        EntityType::Tolerance(_) => "TOLERANCE",
        EntityType::Shape(_) => "SHAPE",
        EntityType::Image(_) => "IMAGE",
        EntityType::Wipeout(_) => "WIPEOUT",
        EntityType::RotatedDimension(_)
        | EntityType::RadialDimension(_)
        | EntityType::DiameterDimension(_)
        | EntityType::AngularThreePointDimension(_)
        | EntityType::OrdinateDimension(_) => "DIMENSION",
        _ => "UNKNOWN",
    }
}

/// 导出到DXF文件
pub fn export(drawing: &Drawing, path: &Path) -> Result<(), FileError> {
    let dxf_drawing = to_dxf(drawing);
    dxf_drawing.save_file(path)?;
    info!(
        "Exported {} entities to {}",
        dxf_drawing.entities().count(),
        path.display()
    );
    Ok(())
}

/// 将图纸转换为 DXF 文档（R2010），未知实体被跳过
pub fn to_dxf(drawing: &Drawing) -> dxf::Drawing {
    let mut dxf_drawing = dxf::Drawing::new();
    dxf_drawing.header.version = dxf::enums::AcadVersion::R2010;

    for entity in drawing.entities() {
        match convert_to_dxf_entity(entity) {
            Some(specific) => {
                dxf_drawing.add_entity(dxf::entities::Entity::new(specific));
            }
            None => warn!("Skipping {} entity on export", entity.type_name()),
        }
    }

    dxf_drawing
}

/// 将图纸实体转换为DXF实体
fn convert_to_dxf_entity(entity: &Entity) -> Option<EntityType> {
    let specific = match entity {
        Entity::Line(line) => {
            let mut dxf_line = dxf::entities::Line::default();
            dxf_line.p1 = dxf::Point::new(line.start.x, line.start.y, 0.0);
            dxf_line.p2 = dxf::Point::new(line.end.x, line.end.y, 0.0);
            EntityType::Line(dxf_line)
        }

        Entity::Circle(circle) => {
            let mut dxf_circle = dxf::entities::Circle::default();
            dxf_circle.center = dxf::Point::new(circle.center.x, circle.center.y, 0.0);
            dxf_circle.radius = circle.radius;
            EntityType::Circle(dxf_circle)
        }

        Entity::Arc(arc) => {
            let mut dxf_arc = dxf::entities::Arc::default();
            dxf_arc.center = dxf::Point::new(arc.center.x, arc.center.y, 0.0);
            dxf_arc.radius = arc.radius;
            dxf_arc.start_angle = arc.start_angle;
            dxf_arc.end_angle = arc.end_angle;
            EntityType::Arc(dxf_arc)
        }

        Entity::Polyline(polyline) => {
            let mut lwpoly = dxf::entities::LwPolyline::default();
            lwpoly.set_is_closed(polyline.closed);
            lwpoly.vertices = polyline
                .vertices
                .iter()
                .map(|v| dxf::LwPolylineVertex {
                    x: v.point.x,
                    y: v.point.y,
                    bulge: v.bulge,
                    ..Default::default()
                })
                .collect();
            EntityType::LwPolyline(lwpoly)
        }

        Entity::Unknown(_) => return None,
    };

    Some(specific)
}
