// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 检测/跟踪系统数据结构定义
/// Data structures for the detection and tracking system
use serde::{Deserialize, Serialize};

use crate::error::TrackingError;

// ========== 数据结构 ==========

/// 二维点 (中心点 / 轨迹点)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 欧氏距离
    pub fn distance(&self, other: &Point2) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// 检测框 (左上角 + 宽高, 像素坐标)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn xmax(&self) -> f32 {
        self.x + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center(&self) -> Point2 {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// 宽高非负且所有分量有限
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// 碰撞检测 (边缘接触也算相交)
    pub fn intersects(&self, another: &BBox) -> bool {
        !(another.x > self.xmax()
            || another.y > self.ymax()
            || self.x > another.xmax()
            || self.y > another.ymax())
    }

    pub fn intersection_area(&self, another: &BBox) -> f32 {
        let l = self.x.max(another.x);
        let r = self.xmax().min(another.xmax());
        let t = self.y.max(another.y);
        let b = self.ymax().min(another.ymax());
        (r - l).max(0.0) * (b - t).max(0.0)
    }

    pub fn union(&self, another: &BBox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    /// IOU, 并集为0时返回0
    pub fn iou(&self, another: &BBox) -> f32 {
        let union = self.union(another);
        if union <= 0.0 {
            return 0.0;
        }
        self.intersection_area(another) / union
    }
}

/// 检测结果 (来自外部检测器, 每帧一组)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub class_id: i32,
    pub class_name: String,
    /// 置信度, 名义上在 [0,1], 上游偶尔会超过1
    pub confidence: f32,
    pub bbox: BBox,
}

impl DetectedObject {
    pub fn new(class_id: i32, class_name: impl Into<String>, confidence: f32, bbox: BBox) -> Self {
        Self {
            class_id,
            class_name: class_name.into(),
            confidence,
            bbox,
        }
    }

    /// 输入边界校验: 负宽高或非有限值直接拒绝
    pub fn validate(&self) -> Result<(), TrackingError> {
        if !self.bbox.is_valid() {
            return Err(TrackingError::InvalidBox {
                x: self.bbox.x,
                y: self.bbox.y,
                width: self.bbox.width,
                height: self.bbox.height,
            });
        }
        if !self.confidence.is_finite() || self.confidence < 0.0 {
            return Err(TrackingError::InvalidConfidence(self.confidence));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_overlapping_boxes() {
        let a = BBox::new(10.0, 10.0, 50.0, 50.0);
        let b = BBox::new(12.0, 11.0, 50.0, 50.0);
        // 48 * 49 = 2352, union = 5000 - 2352
        let expected = 2352.0 / 2648.0;
        assert!((a.iou(&b) - expected).abs() < 1e-5);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_disjoint_boxes() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(20.0, 20.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert_eq!(a.intersection_area(&b), 0.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_touching_edges_intersect() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(10.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_zero_area_iou() {
        let a = BBox::new(5.0, 5.0, 0.0, 0.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_center() {
        let b = BBox::new(10.0, 10.0, 50.0, 50.0);
        assert_eq!(b.center(), Point2::new(35.0, 35.0));
    }

    #[test]
    fn test_validate_rejects_negative_size() {
        let det = DetectedObject::new(1, "car", 0.5, BBox::new(0.0, 0.0, -3.0, 4.0));
        assert!(matches!(
            det.validate(),
            Err(TrackingError::InvalidBox { .. })
        ));
    }

    #[test]
    fn test_validate_tolerates_confidence_above_one() {
        let det = DetectedObject::new(1, "car", 1.2, BBox::new(0.0, 0.0, 3.0, 4.0));
        assert!(det.validate().is_ok());

        let det = DetectedObject::new(1, "car", f32::NAN, BBox::new(0.0, 0.0, 3.0, 4.0));
        assert!(matches!(
            det.validate(),
            Err(TrackingError::InvalidConfidence(_))
        ));
    }
}
