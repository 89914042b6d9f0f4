//! 文件加载
//!
//! 按扩展名分派到 DXF 导入或 SVG 转换，并给出度量时使用的单位换算系数。

use crate::dxf_io;
use crate::error::FileError;
use crate::svg_convert;
use cutmetrics_core::drawing::Drawing;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// 每英寸毫米数
const MM_PER_INCH: f64 = 25.4;

/// 默认 SVG 分辨率
pub const DEFAULT_SVG_DPI: f64 = 96.0;

/// 文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Dxf,
    Svg,
}

impl FileFormat {
    /// 根据扩展名判断格式（不区分大小写），非 `.svg` 一律按 DXF 处理
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => FileFormat::Svg,
            _ => FileFormat::Dxf,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::Dxf => "DXF",
            FileFormat::Svg => "SVG",
        }
    }
}

/// 导入选项
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportOptions {
    /// 是否允许导入 SVG
    pub svg_enabled: bool,
    /// SVG 用户单位对应的分辨率
    pub svg_dpi: f64,
}

impl ImportOptions {
    /// SVG 用户单位到毫米的换算系数，无效 DPI 按默认值计算
    pub fn svg_unit_scale(&self) -> f64 {
        let dpi = if self.svg_dpi.is_finite() && self.svg_dpi > 0.0 {
            self.svg_dpi
        } else {
            warn!(
                "Invalid SVG dpi {}, using {}",
                self.svg_dpi, DEFAULT_SVG_DPI
            );
            DEFAULT_SVG_DPI
        };
        MM_PER_INCH / dpi
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            svg_enabled: false,
            svg_dpi: DEFAULT_SVG_DPI,
        }
    }
}

/// 加载结果
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDrawing {
    pub drawing: Drawing,
    pub format: FileFormat,
    /// 图纸单位到毫米的换算系数
    pub unit_scale: f64,
}

/// 打开并解析图纸文件
///
/// 依次检查：文件可读、格式是否启用，然后才解析内容。
pub fn open(path: &Path, options: &ImportOptions) -> Result<LoadedDrawing, FileError> {
    info!("File selected: {}", path.display());

    let unreadable = |source| FileError::Unreadable {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(unreadable)?;

    let format = FileFormat::from_path(path);
    if format == FileFormat::Svg && !options.svg_enabled {
        return Err(FileError::UnsupportedFormat(
            "we do not support svg files".to_string(),
        ));
    }

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(unreadable)?;

    let loaded = match format {
        FileFormat::Dxf => LoadedDrawing {
            drawing: dxf_io::import_bytes(&bytes)?,
            format,
            unit_scale: 1.0,
        },
        FileFormat::Svg => {
            let content = String::from_utf8(bytes)
                .map_err(|e| FileError::InvalidFormat(format!("SVG is not UTF-8: {}", e)))?;
            LoadedDrawing {
                drawing: svg_convert::convert_str(&content)?.drawing,
                format,
                unit_scale: options.svg_unit_scale(),
            }
        }
    };

    info!(
        "Loaded {} file with {} entities",
        loaded.format.name(),
        loaded.drawing.entity_count()
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutmetrics_core::geometry::{Entity, Line};
    use cutmetrics_core::math::Point2;
    use std::io::Write;

    const SQUARE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <rect x="10" y="10" width="20" height="20"/>
    </svg>"#;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.svg")), FileFormat::Svg);
        assert_eq!(FileFormat::from_path(Path::new("a.SVG")), FileFormat::Svg);
        assert_eq!(FileFormat::from_path(Path::new("a.dxf")), FileFormat::Dxf);
        assert_eq!(FileFormat::from_path(Path::new("a.txt")), FileFormat::Dxf);
        assert_eq!(FileFormat::from_path(Path::new("noext")), FileFormat::Dxf);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.dxf");
        let err = open(&path, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, FileError::Unreadable { .. }));
        assert!(err.to_string().starts_with("Cannot read file"));
    }

    #[test]
    fn test_svg_rejected_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        // 内容无效也不会被解析
        let path = write_file(&dir, "part.svg", b"<not svg");
        let err = open(&path, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, FileError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_svg_enabled_uses_dpi_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "part.Svg", SQUARE_SVG.as_bytes());
        let options = ImportOptions {
            svg_enabled: true,
            svg_dpi: 72.0,
        };

        let loaded = open(&path, &options).unwrap();
        assert_eq!(loaded.format, FileFormat::Svg);
        assert_eq!(loaded.unit_scale, 25.4 / 72.0);
        assert_eq!(loaded.drawing.entity_count(), 4);
        assert_eq!(
            loaded.drawing.entities()[0],
            Entity::Line(Line::new(Point2::new(10.0, 90.0), Point2::new(30.0, 90.0)))
        );
    }

    #[test]
    fn test_invalid_dpi_uses_default_scale() {
        for dpi in [0.0, -72.0, f64::NAN] {
            let options = ImportOptions {
                svg_enabled: true,
                svg_dpi: dpi,
            };
            assert_eq!(options.svg_unit_scale(), 25.4 / DEFAULT_SVG_DPI);
        }

        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "part.svg", SQUARE_SVG.as_bytes());
        let options = ImportOptions {
            svg_enabled: true,
            svg_dpi: 0.0,
        };
        let loaded = open(&path, &options).unwrap();
        assert!(loaded.unit_scale.is_finite());
        assert_eq!(loaded.unit_scale, 25.4 / 96.0);
    }

    #[test]
    fn test_dxf_round_trip_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.DXF");
        let drawing = Drawing::from_entities(vec![Entity::Line(Line::new(
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 4.0),
        ))]);
        dxf_io::export(&drawing, &path).unwrap();

        let loaded = open(&path, &ImportOptions::default()).unwrap();
        assert_eq!(loaded.format, FileFormat::Dxf);
        assert_eq!(loaded.unit_scale, 1.0);
        assert_eq!(loaded.drawing.entities(), drawing.entities());
    }

    #[test]
    fn test_other_extension_goes_to_dxf_parser() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.txt", b"hello");
        let err = open(&path, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, FileError::Dxf(_)));
    }
}
