//! 文件操作错误定义

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read file {}. Check if the file exists and you have read permissions.", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("DXF error: {0}")]
    Dxf(String),

    #[error("SVG XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("SVG path data error: {0}")]
    PathData(#[from] svgtypes::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}

impl From<dxf::DxfError> for FileError {
    fn from(e: dxf::DxfError) -> Self {
        FileError::Dxf(e.to_string())
    }
}
