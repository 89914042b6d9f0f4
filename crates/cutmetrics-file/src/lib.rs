//! CutMetrics 文件格式处理
//!
//! 支持：
//! - `.dxf` 导入/导出
//! - `.svg` 解析并转换为 DXF 实体（默认关闭，见 [`ImportOptions`]）

pub mod dxf_io;
pub mod error;
pub mod loader;
pub mod svg_convert;
pub mod svg_io;

pub use error::FileError;
pub use loader::{open, FileFormat, ImportOptions, LoadedDrawing};
pub use svg_convert::{convert, convert_document, convert_str, resolve_height, Conversion, HeightSource};
pub use svg_io::{parse_svg, SvgDocument, SvgPath, SvgSegment};
