// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 跟踪器配置 - 通过JSON文件调整参数

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::detection::distance::StereoParams;
use crate::detection::lifecycle::LifecycleConfig;
use crate::detection::matcher::{MatchThresholds, MatchWeights};
use crate::error::TrackingError;

/// 跟踪器参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    // === 匹配参数 ===
    pub weights: MatchWeights,
    pub thresholds: MatchThresholds,

    // === 生命周期参数 ===
    pub lifecycle: LifecycleConfig,

    // === 显示参数 ===
    pub display_max_missed: u32, // 丢失帧数达到该值不再显示

    // === 双目测距参数 ===
    pub stereo: StereoParams,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            weights: MatchWeights::default(),
            thresholds: MatchThresholds::default(),
            lifecycle: LifecycleConfig::default(),
            display_max_missed: 7,
            stereo: StereoParams::default(),
        }
    }
}

impl TrackerConfig {
    /// 从JSON文件加载配置
    ///
    /// 文件不存在时写出默认配置; 解析失败时使用默认值
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    info!("✅ 配置已从 {} 加载", path.display());
                    config
                }
                Err(e) => {
                    warn!("⚠️  配置文件解析失败: {}, 使用默认值", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("📝 配置文件不存在,创建默认配置...");
                let config = Self::default();
                if let Err(e) = config.save(path) {
                    warn!("❌ 保存配置失败: {:#}", e);
                }
                config
            }
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    /// 参数合法性检查
    pub fn validate(&self) -> Result<(), TrackingError> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-3 {
            return Err(TrackingError::InvalidConfig(format!(
                "match weights must sum to 1.0, got {sum:.3}"
            )));
        }

        let t = &self.thresholds;
        let positive = [
            ("min_area_ratio", t.min_area_ratio),
            ("min_iou", t.min_iou),
            ("max_center_distance", t.max_center_distance),
            ("min_confidence_ratio", t.min_confidence_ratio),
            ("decision", t.decision),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| !(*v > 0.0 && v.is_finite())) {
            return Err(TrackingError::InvalidConfig(format!(
                "{name} must be positive, got {value}"
            )));
        }

        if self.stereo.focal_length_px <= 0.0 || self.stereo.baseline_m <= 0.0 {
            return Err(TrackingError::InvalidConfig(
                "stereo baseline and focal length must be positive".into(),
            ));
        }
        Ok(())
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        info!("🎛️  当前跟踪器配置:");
        info!(
            "  权重: 面积{:.2} 覆盖{:.2} 距离{:.2} 类别{:.2} 置信度{:.2}",
            self.weights.area,
            self.weights.coverage,
            self.weights.center,
            self.weights.class_id,
            self.weights.confidence
        );
        info!("  判定阈值: {:.2}", self.thresholds.decision);
        info!(
            "  晋升次数: >{} | 最大丢失帧: >{}",
            self.lifecycle.min_tracked, self.lifecycle.max_missed
        );
        info!("  显示丢失帧上限: {}", self.display_max_missed);
    }
}
