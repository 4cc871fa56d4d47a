// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 基于匹配的跟踪器
//! Tracking-by-matching engine
//!
//! 每帧一次 `track()`:
//! 1. 存储为空时, 每个检测直接建轨迹 (本帧不再匹配)
//! 2. 所有轨迹丢失计数先 +1
//! 3. 每个检测按存储顺序首个匹配; 匹配则更新 (丢失计数清零), 否则新建
//! 4. 去重
//! 5. 删除丢失太久的轨迹
//! 6. 晋升 + 排序
//! 7. 返回快照

use tracing::{debug, trace};

use super::lifecycle::{IdAllocator, LifecycleManager};
use super::matcher::Matcher;
use super::store::TrackStore;
use super::tracker::{TrackId, TrackedObject, Tracker};
use super::types::DetectedObject;
use crate::config::TrackerConfig;
use crate::error::TrackingError;

/// 单帧统计
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub matched: usize,
    pub created: usize,
    pub duplicates: usize,
    pub evicted: usize,
    pub promoted: usize,
}

pub struct TrackingByMatching {
    matcher: Matcher,
    lifecycle: LifecycleManager,
    store: TrackStore,
    frame_count: u64,
    last_stats: FrameStats,
}

impl TrackingByMatching {
    pub fn new(config: &TrackerConfig) -> Self {
        Self::with_allocator(config, IdAllocator::new())
    }

    /// 指定ID分配器 (便于测试复现ID序列)
    pub fn with_allocator(config: &TrackerConfig, ids: IdAllocator) -> Self {
        Self {
            matcher: Matcher::new(config.weights.clone(), config.thresholds.clone()),
            lifecycle: LifecycleManager::with_allocator(config.lifecycle.clone(), ids),
            store: TrackStore::new(),
            frame_count: 0,
            last_stats: FrameStats::default(),
        }
    }

    /// 处理一帧检测结果, 返回排序后的全部轨迹
    pub fn track(
        &mut self,
        detections: &[DetectedObject],
    ) -> Result<Vec<TrackedObject>, TrackingError> {
        for detection in detections {
            detection.validate()?;
        }

        self.frame_count += 1;
        let mut stats = FrameStats::default();

        if self.store.is_empty() {
            for detection in detections {
                self.lifecycle.create(&mut self.store, detection);
            }
            stats.created = detections.len();
        } else {
            for track in self.store.iter_mut() {
                track.mark_missed();
            }

            for detection in detections {
                let matched = self
                    .matcher
                    .first_fit(detection, self.store.iter())
                    .map(|t| t.internal_id());

                match matched {
                    Some(id) => {
                        if let Some(track) = self.store.get_mut(id) {
                            trace!("🔗 检测 class={} → 轨迹 {}", detection.class_id, id);
                            track.apply_detection(detection);
                            stats.matched += 1;
                        }
                    }
                    None => {
                        self.lifecycle.create(&mut self.store, detection);
                        stats.created += 1;
                    }
                }
            }
        }

        stats.duplicates = self.lifecycle.deduplicate(&mut self.store, &self.matcher).len();
        stats.evicted = self.lifecycle.evict_stale(&mut self.store).len();
        stats.promoted = self.lifecycle.promote_and_sort(&mut self.store).len();

        debug!(
            "📊 [帧{}] 检测{} | 匹配{} 新建{} 去重{} 删除{} 晋升{} | 轨迹{}",
            self.frame_count,
            detections.len(),
            stats.matched,
            stats.created,
            stats.duplicates,
            stats.evicted,
            stats.promoted,
            self.store.len()
        );
        self.last_stats = stats;

        Ok(self.store.snapshot())
    }

    /// 当前轨迹 (已排序)
    pub fn tracked_objects(&self) -> impl Iterator<Item = &TrackedObject> {
        self.store.iter()
    }

    pub fn get(&self, id: TrackId) -> Option<&TrackedObject> {
        self.store.get(id)
    }

    /// 供外部测距模块写入距离
    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut TrackedObject> {
        self.store.get_mut(id)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn last_stats(&self) -> &FrameStats {
        &self.last_stats
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// 获取跟踪统计信息
    pub fn stats(&self) -> String {
        let promoted = self.store.iter().filter(|t| t.is_promoted()).count();
        format!(
            "跟踪: {} 个 (已确认 {}) | 总ID: {} | 帧: {}",
            self.store.len(),
            promoted,
            self.lifecycle.ids().internal_issued(),
            self.frame_count
        )
    }

    pub fn reset(&mut self) {
        self.store.clear();
        self.lifecycle.reset();
        self.frame_count = 0;
        self.last_stats = FrameStats::default();
    }
}

impl Default for TrackingByMatching {
    fn default() -> Self {
        Self::new(&TrackerConfig::default())
    }
}

impl Tracker for TrackingByMatching {
    fn update(
        &mut self,
        detections: &[DetectedObject],
    ) -> Result<Vec<TrackedObject>, TrackingError> {
        self.track(detections)
    }

    fn reset(&mut self) {
        TrackingByMatching::reset(self);
    }

    fn track_count(&self) -> usize {
        self.store.len()
    }
}
