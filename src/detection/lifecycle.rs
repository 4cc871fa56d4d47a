// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 跟踪生命周期管理
//! Track lifecycle: creation, promotion, aging, de-duplication
//!
//! - 创建: 未匹配的检测 → 新轨迹 (新内部ID)
//! - 晋升: 累计匹配次数超过 `min_tracked` 的轨迹分配外部ID
//! - 老化: 连续丢失超过 `max_missed` 帧的轨迹删除
//! - 去重: 两条存活轨迹被判定为同一目标时删除其中一条

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::matcher::Matcher;
use super::store::TrackStore;
use super::tracker::{TrackId, TrackedObject};
use super::types::DetectedObject;

/// 生命周期阈值
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// 累计匹配次数超过该值才晋升
    pub min_tracked: u32,
    /// 连续丢失帧数超过该值即删除
    pub max_missed: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            min_tracked: 20,
            max_missed: 100,
        }
    }
}

// ========== ID分配 ==========

/// 内部/外部ID分配器 (均单调递增, 不复用)
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    next_internal: u64,
    next_external: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定起始值 (测试用)
    pub fn seeded(next_internal: u64, next_external: u32) -> Self {
        Self {
            next_internal,
            next_external,
        }
    }

    pub fn next_internal(&mut self) -> TrackId {
        let id = TrackId(self.next_internal);
        self.next_internal += 1;
        id
    }

    pub fn next_external(&mut self) -> u32 {
        let id = self.next_external;
        self.next_external += 1;
        id
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 已分配的内部ID总数
    pub fn internal_issued(&self) -> u64 {
        self.next_internal
    }

    /// 已分配的外部ID总数
    pub fn external_issued(&self) -> u32 {
        self.next_external
    }
}

// ========== 生命周期管理 ==========

pub struct LifecycleManager {
    config: LifecycleConfig,
    ids: IdAllocator,
}

impl LifecycleManager {
    pub fn new(config: LifecycleConfig) -> Self {
        Self::with_allocator(config, IdAllocator::new())
    }

    pub fn with_allocator(config: LifecycleConfig, ids: IdAllocator) -> Self {
        Self { config, ids }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn reset(&mut self) {
        self.ids.reset();
    }

    /// 未匹配的检测 → 新轨迹, 追加到存储末尾
    pub fn create(&mut self, store: &mut TrackStore, detection: &DetectedObject) -> TrackId {
        let id = self.ids.next_internal();
        store.insert(TrackedObject::from_detection(id, detection));
        debug!(
            "🆕 新轨迹 {} class={} ({})",
            id, detection.class_id, detection.class_name
        );
        id
    }

    /// 晋升满足条件的轨迹, 然后按外部ID排序
    ///
    /// 返回本帧新晋升的 (内部ID, 外部ID)
    pub fn promote_and_sort(&mut self, store: &mut TrackStore) -> Vec<(TrackId, u32)> {
        let mut promoted = Vec::new();

        for id in store.ids() {
            let Some(track) = store.get_mut(id) else {
                continue;
            };
            if track.external_id().is_none() && track.tracked_count() > self.config.min_tracked
            {
                let ext = self.ids.next_external();
                track.promote(ext);
                debug!("⭐ 轨迹 {} 晋升, 外部ID={}", id, ext);
                promoted.push((id, ext));
            }
        }

        store.sort_by_external_id();
        promoted
    }

    /// 删除丢失太久的轨迹, 返回被删除的内部ID
    pub fn evict_stale(&self, store: &mut TrackStore) -> Vec<TrackId> {
        let stale: Vec<TrackId> = store
            .iter()
            .filter(|t| t.missed_count() > self.config.max_missed)
            .map(|t| t.internal_id())
            .collect();

        for &id in &stale {
            if store.remove(id).is_some() {
                debug!("🗑️  轨迹 {} 丢失超过 {} 帧, 删除", id, self.config.max_missed);
            }
        }
        stale
    }

    /// 重复轨迹检测
    ///
    /// 从已晋升的轨迹出发扫描其余轨迹, 二者都未被标记且得分超过阈值时:
    /// - 对方已晋升且外部ID更小: 删除扫描方; 若扫描方丢失帧数更少, 先把它的检测数据并入对方
    /// - 其他情况: 删除对方 (不合并)
    ///
    /// 标记的ID在全部扫描完成后统一删除. 返回被删除的内部ID.
    pub fn deduplicate(&self, store: &mut TrackStore, matcher: &Matcher) -> Vec<TrackId> {
        let order = store.ids();
        let mut flagged: Vec<TrackId> = Vec::new();
        let mut flagged_set: HashSet<TrackId> = HashSet::new();

        for &src_id in &order {
            if flagged_set.contains(&src_id) {
                continue;
            }
            let Some(src_ext) = store.get(src_id).and_then(|t| t.external_id()) else {
                continue;
            };

            for &ver_id in &order {
                if ver_id == src_id || flagged_set.contains(&ver_id) {
                    continue;
                }
                let (Some(src), Some(ver)) = (store.get(src_id), store.get(ver_id)) else {
                    continue;
                };
                if !matcher.is_match(src, ver) {
                    continue;
                }

                match ver.external_id() {
                    Some(ver_ext) if src_ext > ver_ext => {
                        if src.missed_count() < ver.missed_count() {
                            let fresher = src.clone();
                            if let Some(ver) = store.get_mut(ver_id) {
                                ver.absorb(&fresher);
                            }
                            debug!("🔀 轨迹 {} 数据并入 {}", src_id, ver_id);
                        }
                        debug!("♻️  重复轨迹 {} (保留 {})", src_id, ver_id);
                        flagged_set.insert(src_id);
                        flagged.push(src_id);
                        break;
                    }
                    _ => {
                        debug!("♻️  重复轨迹 {} (保留 {})", ver_id, src_id);
                        flagged_set.insert(ver_id);
                        flagged.push(ver_id);
                    }
                }
            }
        }

        for &id in &flagged {
            store.remove(id);
        }
        flagged
    }
}
