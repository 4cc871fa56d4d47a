// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 跟踪流水线 (Tracking Pipeline)
///
/// 检测与跟踪分线程运行时的帧交接:
/// - 检测线程: 每帧发送一份完整的检测列表
/// - 跟踪线程: 按帧序处理, 同一时刻只有一次 track() 在执行
pub mod tracking;

pub use tracking::{spawn_tracking, tracking_thread, TrackingHandle};

use crate::detection::{DetectedObject, TrackedObject};

// ========== 消息类型定义 ==========

/// 一帧的检测结果 (检测线程 → 跟踪线程)
#[derive(Clone, Debug)]
pub struct FrameDetections {
    pub frame_id: u64, // 帧序号
    pub detections: Vec<DetectedObject>,
}

/// 跟踪结果 (跟踪线程 → 渲染/测距/导航)
#[derive(Clone, Debug)]
pub struct TrackedFrame {
    pub frame_id: u64, // 对应的帧序号
    pub tracks: Vec<TrackedObject>,
    pub tracking_ms: f64,
}
