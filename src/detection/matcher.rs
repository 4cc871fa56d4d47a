// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 多准则加权匹配
//! Weighted multi-criteria matching
//!
//! 五项独立检查, 每项通过贡献固定权重, 权重和为1:
//! 1. 面积相似 (min/max 面积比)
//! 2. 覆盖率 (相交且 IOU 超过阈值)
//! 3. 中心距离 (欧氏距离, 像素)
//! 4. 类别一致
//! 5. 置信度比例
//!
//! 加权和严格大于判定阈值即视为同一目标. 类别权重最大, 但单独不足以通过.

use serde::{Deserialize, Serialize};

use super::tracker::TrackedObject;
use super::types::{BBox, DetectedObject, Point2};

/// 可参与匹配的对象 (检测结果或跟踪对象)
pub trait Matchable {
    fn bbox(&self) -> &BBox;
    fn center(&self) -> Point2;
    fn class_id(&self) -> i32;
    fn confidence(&self) -> f32;
}

impl Matchable for DetectedObject {
    fn bbox(&self) -> &BBox {
        &self.bbox
    }

    fn center(&self) -> Point2 {
        self.bbox.center()
    }

    fn class_id(&self) -> i32 {
        self.class_id
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }
}

impl Matchable for TrackedObject {
    fn bbox(&self) -> &BBox {
        &self.bbox
    }

    fn center(&self) -> Point2 {
        self.center
    }

    fn class_id(&self) -> i32 {
        self.class_id
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// 加权和比较容差: 权重为百分位小数, f32 累加误差远小于 0.01
const SCORE_EPSILON: f32 = 1e-4;

/// 各项检查的权重
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub area: f32,
    pub coverage: f32,
    pub center: f32,
    pub class_id: f32,
    pub confidence: f32,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            area: 0.25,
            coverage: 0.20,
            center: 0.10,
            class_id: 0.40,
            confidence: 0.05,
        }
    }
}

impl MatchWeights {
    pub fn sum(&self) -> f32 {
        self.area + self.coverage + self.center + self.class_id + self.confidence
    }
}

/// 各项检查的阈值
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchThresholds {
    pub min_area_ratio: f32,       // 面积比下限
    pub min_iou: f32,              // IOU下限
    pub max_center_distance: f32,  // 中心距离上限 (像素)
    pub min_confidence_ratio: f32, // 置信度比下限
    pub decision: f32,             // 加权和判定阈值
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            min_area_ratio: 0.7,
            min_iou: 0.6,
            max_center_distance: 100.0,
            min_confidence_ratio: 0.95,
            decision: 0.7,
        }
    }
}

/// 单次打分明细
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MatchScore {
    pub area: bool,
    pub coverage: bool,
    pub center: bool,
    pub class_id: bool,
    pub confidence: bool,
    pub total: f32,
}

/// 匹配器
#[derive(Clone, Debug, Default)]
pub struct Matcher {
    weights: MatchWeights,
    thresholds: MatchThresholds,
}

impl Matcher {
    pub fn new(weights: MatchWeights, thresholds: MatchThresholds) -> Self {
        Self {
            weights,
            thresholds,
        }
    }

    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    pub fn thresholds(&self) -> &MatchThresholds {
        &self.thresholds
    }

    /// 计算两对象的加权得分
    pub fn score<A, B>(&self, a: &A, b: &B) -> MatchScore
    where
        A: Matchable + ?Sized,
        B: Matchable + ?Sized,
    {
        let t = &self.thresholds;
        let (box_a, box_b) = (a.bbox(), b.bbox());

        let area = ratio(box_a.area(), box_b.area()).is_some_and(|r| r > t.min_area_ratio);
        let coverage = box_a.intersects(box_b) && box_a.iou(box_b) > t.min_iou;
        let center = a.center().distance(&b.center()) < t.max_center_distance;
        let class_id = a.class_id() == b.class_id();
        let confidence = ratio(a.confidence(), b.confidence())
            .is_some_and(|r| r > t.min_confidence_ratio);

        let w = &self.weights;
        let total = [
            (area, w.area),
            (coverage, w.coverage),
            (center, w.center),
            (class_id, w.class_id),
            (confidence, w.confidence),
        ]
        .iter()
        .filter(|(passed, _)| *passed)
        .map(|(_, weight)| weight)
        .sum();

        MatchScore {
            area,
            coverage,
            center,
            class_id,
            confidence,
            total,
        }
    }

    /// 加权和严格大于阈值 (恰好等于阈值的组合一律不匹配)
    pub fn is_match<A, B>(&self, a: &A, b: &B) -> bool
    where
        A: Matchable + ?Sized,
        B: Matchable + ?Sized,
    {
        self.exceeds_decision(self.score(a, b).total)
    }

    fn exceeds_decision(&self, total: f32) -> bool {
        total > self.thresholds.decision + SCORE_EPSILON
    }

    /// 首个匹配 (first-fit, 按给定顺序扫描, 不比较多个候选)
    pub fn first_fit<'a, D, T, I>(&self, detection: &D, candidates: I) -> Option<&'a T>
    where
        D: Matchable + ?Sized,
        T: Matchable + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        candidates
            .into_iter()
            .find(|candidate| self.is_match(detection, *candidate))
    }
}

/// min/max 比例, 分母为0或非有限时视为检查失败
fn ratio(a: f32, b: f32) -> Option<f32> {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    if hi <= 0.0 || !hi.is_finite() || !lo.is_finite() {
        return None;
    }
    Some(lo / hi)
}
