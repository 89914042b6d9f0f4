//! CutMetrics 应用逻辑
//!
//! 与具体 GUI 框架无关：控制器持有状态，通过 [`Display`] 接口驱动显示层。

pub mod controller;
pub mod state;
pub mod table;

pub use controller::{Controller, Display};
pub use state::AppState;
pub use table::{MetricRow, MetricsTable};
