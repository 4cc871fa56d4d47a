// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 跟踪系统 (Tracking System)
///
/// 基于匹配的多目标跟踪, 检测结果来自外部检测器
/// - Matcher:   加权多准则匹配
/// - Lifecycle: 轨迹创建/晋升/老化/去重
/// - Engine:    单帧更新流程
pub mod display;
pub mod distance;
pub mod engine;
pub mod lifecycle;
pub mod matcher;
pub mod store;
pub mod tracker;
pub mod types;

pub use display::DisplayFilter;
pub use distance::StereoParams;
pub use engine::{FrameStats, TrackingByMatching};
pub use lifecycle::{IdAllocator, LifecycleConfig, LifecycleManager};
pub use matcher::{MatchScore, MatchThresholds, MatchWeights, Matchable, Matcher};
pub use store::TrackStore;
pub use tracker::{id_to_color, TrackId, TrackedObject, Tracker};
pub use types::{BBox, DetectedObject, Point2};
