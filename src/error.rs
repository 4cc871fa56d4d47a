// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 跟踪器错误类型
//! Tracking errors

use thiserror::Error;

/// 跟踪器错误 (只在输入边界与配置校验时产生)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    #[error("invalid bounding box ({x}, {y}, {width}x{height})")]
    InvalidBox {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },

    #[error("invalid confidence {0}")]
    InvalidConfidence(f32),

    #[error("invalid tracker config: {0}")]
    InvalidConfig(String),
}
