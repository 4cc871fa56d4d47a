// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 跟踪器配置参数
pub mod detection; // 匹配跟踪系统
pub mod error; // 错误类型
pub mod pipeline; // 检测 → 跟踪 线程交接

pub use crate::config::TrackerConfig;
pub use crate::detection::{
    BBox, DetectedObject, DisplayFilter, StereoParams, TrackId, TrackedObject, Tracker,
    TrackingByMatching,
};
pub use crate::error::TrackingError;

pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
