// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 双目测距结果的记录与平滑
//! Stereo distance bookkeeping on tracked objects
//!
//! 特征匹配与视差计算在外部完成, 这里只负责:
//! - 选出需要测距的轨迹
//! - 视差 → 距离
//! - 写回 `distance` 并做指数平滑

use serde::{Deserialize, Serialize};

use super::tracker::TrackedObject;

/// 平滑系数: 旧值权重
pub const DISTANCE_DECAY: f32 = 0.9;

/// 双目参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StereoParams {
    /// 基线 (米)
    pub baseline_m: f32,
    /// 焦距 (像素)
    pub focal_length_px: f32,
    /// 视差低于该值的测量视为无效
    pub min_disparity_px: f32,
    /// 丢失帧数不超过该值的已确认轨迹才测距
    pub max_missed_for_measurement: u32,
}

impl Default for StereoParams {
    fn default() -> Self {
        Self {
            baseline_m: 0.06,
            focal_length_px: 700.0,
            min_disparity_px: 18.0,
            max_missed_for_measurement: 7,
        }
    }
}

impl StereoParams {
    /// Z = f * B / d, 视差为0时无结果
    pub fn distance_from_disparity(&self, disparity: f32) -> Option<f32> {
        if disparity == 0.0 || !disparity.is_finite() {
            return None;
        }
        Some(self.focal_length_px * self.baseline_m / disparity)
    }
}

impl TrackedObject {
    /// 写入本帧测距结果; `None` 表示本帧无有效测量 (平滑值保留)
    pub fn record_distance(&mut self, sample: Option<f32>) {
        self.distance = sample;
        if let Some(d) = sample {
            self.smoothed_distance = Some(match self.smoothed_distance {
                Some(prev) => DISTANCE_DECAY * prev + (1.0 - DISTANCE_DECAY) * d,
                None => d,
            });
        }
    }
}

/// 需要测距的轨迹: 已确认且最近仍被检测到
pub fn measurement_candidates<'a>(
    tracks: impl IntoIterator<Item = &'a TrackedObject>,
    params: &StereoParams,
) -> impl Iterator<Item = &'a TrackedObject> {
    let max_missed = params.max_missed_for_measurement;
    tracks
        .into_iter()
        .filter(move |t| t.is_promoted() && t.missed_count() <= max_missed)
}

/// 用平均视差更新一条轨迹, 视差过小则记为无效测量
pub fn apply_disparity(track: &mut TrackedObject, mean_disparity: f32, params: &StereoParams) {
    let sample = if mean_disparity > params.min_disparity_px {
        params.distance_from_disparity(mean_disparity)
    } else {
        None
    };
    track.record_distance(sample);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::tracker::TrackId;
    use crate::detection::types::{BBox, DetectedObject};

    fn track() -> TrackedObject {
        let det = DetectedObject::new(0, "person", 0.8, BBox::new(0.0, 0.0, 20.0, 40.0));
        TrackedObject::from_detection(TrackId(0), &det)
    }

    #[test]
    fn test_first_sample_seeds_smoothing() {
        let mut t = track();
        assert_eq!(t.distance(), None);
        assert_eq!(t.smoothed_distance(), None);

        t.record_distance(Some(10.0));
        assert_eq!(t.distance(), Some(10.0));
        assert_eq!(t.smoothed_distance(), Some(10.0));
    }

    #[test]
    fn test_exponential_smoothing() {
        let mut t = track();
        t.record_distance(Some(10.0));
        t.record_distance(Some(20.0));
        let smoothed = t.smoothed_distance().unwrap();
        assert!((smoothed - 11.0).abs() < 1e-4);
    }

    #[test]
    fn test_invalid_sample_keeps_smoothed_value() {
        let mut t = track();
        t.record_distance(Some(10.0));
        t.record_distance(None);
        assert_eq!(t.distance(), None);
        assert_eq!(t.smoothed_distance(), Some(10.0));
    }

    #[test]
    fn test_distance_from_disparity() {
        let params = StereoParams {
            baseline_m: 0.1,
            focal_length_px: 500.0,
            ..Default::default()
        };
        assert_eq!(params.distance_from_disparity(0.0), None);
        let d = params.distance_from_disparity(25.0).unwrap();
        assert!((d - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_small_disparity_is_invalid() {
        let params = StereoParams::default();
        let mut t = track();
        apply_disparity(&mut t, 30.0, &params);
        assert!(t.distance().is_some());

        apply_disparity(&mut t, 18.0, &params);
        assert_eq!(t.distance(), None);
        assert!(t.smoothed_distance().is_some());
    }

    #[test]
    fn test_candidates_require_promotion_and_recent_match() {
        let params = StereoParams::default();
        let mut fresh = track();
        fresh.promote(0);
        let mut stale = track();
        stale.promote(1);
        stale.missed_count = 8;
        let unconfirmed = track();

        let tracks = vec![fresh, stale, unconfirmed];
        let ids: Vec<_> = measurement_candidates(&tracks, &params)
            .map(|t| t.external_id())
            .collect();
        assert_eq!(ids, vec![Some(0)]);
    }
}
