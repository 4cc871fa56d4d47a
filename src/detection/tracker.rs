// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 多目标跟踪公共组件
//! Common components for multi-object tracking

use serde::Serialize;
use std::fmt;

use super::types::{BBox, DetectedObject, Point2};
use crate::error::TrackingError;

// ========== 公共数据结构 ==========

/// 内部跟踪ID (按分配顺序, 不对外暴露, 不复用)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 跟踪对象
#[derive(Debug, Clone, Serialize)]
pub struct TrackedObject {
    /// 内部ID
    pub(crate) internal_id: TrackId,

    /// 外部ID (晋升前为 None)
    pub(crate) external_id: Option<u32>,

    pub(crate) class_id: i32,
    pub(crate) class_name: String,
    pub(crate) confidence: f32,

    /// 当前边界框
    pub(crate) bbox: BBox,

    /// 边界框中心 (每次更新重新计算)
    pub(crate) center: Point2,

    /// 双目测距结果 (由外部测距模块写入)
    pub(crate) distance: Option<f32>,
    pub(crate) smoothed_distance: Option<f32>,

    /// 连续丢失帧数
    pub(crate) missed_count: u32,

    /// 累计匹配次数
    pub(crate) tracked_count: u32,

    /// 历史轨迹 (中心点, 只追加)
    pub(crate) path: Vec<Point2>,
}

impl TrackedObject {
    /// 新建跟踪对象并用检测结果初始化
    pub(crate) fn from_detection(internal_id: TrackId, detection: &DetectedObject) -> Self {
        let mut tracked = Self {
            internal_id,
            external_id: None,
            class_id: detection.class_id,
            class_name: detection.class_name.clone(),
            confidence: detection.confidence,
            bbox: detection.bbox,
            center: detection.bbox.center(),
            distance: None,
            smoothed_distance: None,
            missed_count: 0,
            tracked_count: 0,
            path: Vec::new(),
        };
        tracked.apply_detection(detection);
        tracked
    }

    /// 匹配成功: 刷新检测字段, 计数, 轨迹
    pub(crate) fn apply_detection(&mut self, detection: &DetectedObject) {
        self.class_id = detection.class_id;
        self.class_name.clone_from(&detection.class_name);
        self.confidence = detection.confidence;
        self.refresh_box(detection.bbox);
        self.missed_count = 0;
        self.tracked_count += 1;
    }

    /// 合并重复轨迹: 吸收另一条轨迹更新鲜的检测数据, 视同本帧匹配成功
    pub(crate) fn absorb(&mut self, other: &TrackedObject) {
        self.confidence = other.confidence;
        self.refresh_box(other.bbox);
        self.missed_count = 0;
        self.tracked_count += 1;
    }

    /// 本帧未匹配
    pub(crate) fn mark_missed(&mut self) {
        self.missed_count += 1;
    }

    pub(crate) fn promote(&mut self, external_id: u32) {
        self.external_id = Some(external_id);
    }

    fn refresh_box(&mut self, bbox: BBox) {
        self.bbox = bbox;
        self.center = bbox.center();
        self.path.push(self.center);
    }

    pub fn internal_id(&self) -> TrackId {
        self.internal_id
    }

    pub fn external_id(&self) -> Option<u32> {
        self.external_id
    }

    pub fn is_promoted(&self) -> bool {
        self.external_id.is_some()
    }

    pub fn class_id(&self) -> i32 {
        self.class_id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    pub fn center(&self) -> Point2 {
        self.center
    }

    pub fn distance(&self) -> Option<f32> {
        self.distance
    }

    pub fn smoothed_distance(&self) -> Option<f32> {
        self.smoothed_distance
    }

    pub fn missed_count(&self) -> u32 {
        self.missed_count
    }

    pub fn tracked_count(&self) -> u32 {
        self.tracked_count
    }

    pub fn path(&self) -> &[Point2] {
        &self.path
    }

    /// 显示颜色 (按外部ID, 未晋升为灰色)
    pub fn color(&self) -> (u8, u8, u8) {
        match self.external_id {
            Some(id) => id_to_color(id),
            None => (128, 128, 128),
        }
    }
}

// ========== 跟踪器统一接口 ==========

/// 多目标跟踪器 Trait
pub trait Tracker {
    /// 更新跟踪器
    ///
    /// # 参数
    /// - `detections`: 当前帧的完整检测结果
    ///
    /// # 返回
    /// 当前所有存活的跟踪对象 (已排序)
    fn update(&mut self, detections: &[DetectedObject])
        -> Result<Vec<TrackedObject>, TrackingError>;

    /// 重置跟踪器 (清除所有跟踪, ID从头分配)
    fn reset(&mut self);

    /// 获取当前跟踪数量
    fn track_count(&self) -> usize;
}

// ========== 工具函数 ==========

/// 外部ID → 显示颜色 (黄金角度取色相, 相邻ID颜色差异大)
pub fn id_to_color(id: u32) -> (u8, u8, u8) {
    const GOLDEN_ANGLE: f32 = 137.508;
    let hue = (id as f32 * GOLDEN_ANGLE).rem_euclid(360.0);
    hsv_to_rgb(hue, 0.8, 0.9)
}

fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> (u8, u8, u8) {
    let chroma = value * saturation;
    let sector = hue / 60.0;
    let second = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let offset = value - chroma;

    let (r, g, b) = match sector as u32 {
        0 => (chroma, second, 0.0),
        1 => (second, chroma, 0.0),
        2 => (0.0, chroma, second),
        3 => (0.0, second, chroma),
        4 => (second, 0.0, chroma),
        _ => (chroma, 0.0, second),
    };

    let to_byte = |c: f32| ((c + offset) * 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(x: f32) -> DetectedObject {
        DetectedObject::new(3, "car", 0.9, BBox::new(x, 10.0, 50.0, 50.0))
    }

    #[test]
    fn test_new_track_counts_first_detection() {
        let t = TrackedObject::from_detection(TrackId(0), &detection(10.0));
        assert_eq!(t.external_id(), None);
        assert_eq!(t.tracked_count(), 1);
        assert_eq!(t.missed_count(), 0);
        assert_eq!(t.path().len(), 1);
        assert_eq!(t.center(), Point2::new(35.0, 35.0));
    }

    #[test]
    fn test_apply_detection_resets_missed() {
        let mut t = TrackedObject::from_detection(TrackId(0), &detection(10.0));
        t.mark_missed();
        t.mark_missed();
        assert_eq!(t.missed_count(), 2);

        t.apply_detection(&detection(20.0));
        assert_eq!(t.missed_count(), 0);
        assert_eq!(t.tracked_count(), 2);
        assert_eq!(t.path().len(), 2);
        assert_eq!(t.center(), Point2::new(45.0, 35.0));
    }

    #[test]
    fn test_absorb_counts_as_match() {
        let mut kept = TrackedObject::from_detection(TrackId(0), &detection(10.0));
        kept.missed_count = 4;
        let mut other = TrackedObject::from_detection(TrackId(1), &detection(14.0));
        other.missed_count = 1;
        other.confidence = 0.5;

        kept.absorb(&other);
        assert_eq!(kept.missed_count(), 0);
        assert_eq!(kept.confidence(), 0.5);
        assert_eq!(kept.bbox().x, 14.0);
        assert_eq!(kept.tracked_count(), 2);
    }

    #[test]
    fn test_color_is_stable_per_external_id() {
        let mut t = TrackedObject::from_detection(TrackId(0), &detection(10.0));
        assert_eq!(t.color(), (128, 128, 128));
        t.promote(4);
        assert_eq!(t.color(), id_to_color(4));
        assert_ne!(id_to_color(4), id_to_color(5));
    }

    #[test]
    fn test_id_to_color_hue_sectors() {
        // ID 0 → 色相0 (红)
        assert_eq!(id_to_color(0), (229, 45, 45));
        for id in 0..64 {
            let (r, g, b) = id_to_color(id);
            assert!(r.max(g).max(b) >= 229);
            assert!(r.min(g).min(b) <= 46);
        }
    }
}
