// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 跟踪对象存储
//! Track store: id → record, plus an explicit scan order

use std::collections::HashMap;

use super::tracker::{TrackId, TrackedObject};

/// 跟踪对象集合
///
/// 记录按内部ID存放, `order` 决定首个匹配的扫描顺序和对外输出顺序.
/// 删除只能通过 [`TrackStore::remove`] 显式进行.
#[derive(Debug, Default, Clone)]
pub struct TrackStore {
    tracks: HashMap<TrackId, TrackedObject>,
    order: Vec<TrackId>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加到末尾; 内部ID已存在时替换记录, 顺序不变
    pub fn insert(&mut self, track: TrackedObject) {
        let id = track.internal_id();
        if self.tracks.insert(id, track).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: TrackId) -> Option<&TrackedObject> {
        self.tracks.get(&id)
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut TrackedObject> {
        self.tracks.get_mut(&id)
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    pub fn remove(&mut self, id: TrackId) -> Option<TrackedObject> {
        let removed = self.tracks.remove(&id)?;
        self.order.retain(|&other| other != id);
        Some(removed)
    }

    /// 当前顺序下的ID列表 (拷贝, 可在遍历时修改存储)
    pub fn ids(&self) -> Vec<TrackId> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.order.iter().filter_map(|id| self.tracks.get(id))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackedObject> {
        self.tracks.values_mut()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.order.clear();
    }

    /// 稳定排序: 已晋升的在前 (外部ID升序), 未晋升的保持原相对顺序
    pub fn sort_by_external_id(&mut self) {
        let tracks = &self.tracks;
        self.order.sort_by_key(|id| match tracks[id].external_id() {
            Some(ext) => (0u8, ext),
            None => (1u8, 0),
        });
    }

    /// 按当前顺序拷贝出全部记录
    pub fn snapshot(&self) -> Vec<TrackedObject> {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::{BBox, DetectedObject};

    fn track(id: u64) -> TrackedObject {
        let det = DetectedObject::new(1, "person", 0.8, BBox::new(id as f32, 0.0, 10.0, 10.0));
        TrackedObject::from_detection(TrackId(id), &det)
    }

    fn order(store: &TrackStore) -> Vec<u64> {
        store.iter().map(|t| t.internal_id().0).collect()
    }

    #[test]
    fn test_insert_keeps_arrival_order() {
        let mut store = TrackStore::new();
        for id in [3, 1, 2] {
            store.insert(track(id));
        }
        assert_eq!(order(&store), vec![3, 1, 2]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_remove_is_explicit() {
        let mut store = TrackStore::new();
        store.insert(track(0));
        store.insert(track(1));

        assert!(store.remove(TrackId(0)).is_some());
        assert!(store.remove(TrackId(0)).is_none());
        assert_eq!(order(&store), vec![1]);
        assert!(!store.contains(TrackId(0)));
    }

    #[test]
    fn test_sort_promoted_first_and_stable() {
        let mut store = TrackStore::new();
        for id in 0..5 {
            store.insert(track(id));
        }
        store.get_mut(TrackId(1)).unwrap().promote(7);
        store.get_mut(TrackId(3)).unwrap().promote(2);

        store.sort_by_external_id();
        assert_eq!(order(&store), vec![3, 1, 0, 2, 4]);

        let ext: Vec<_> = store.iter().map(|t| t.external_id()).collect();
        assert_eq!(ext, vec![Some(2), Some(7), None, None, None]);
    }

    #[test]
    fn test_snapshot_follows_order() {
        let mut store = TrackStore::new();
        store.insert(track(5));
        store.insert(track(4));
        let snap = store.snapshot();
        assert_eq!(snap[0].internal_id(), TrackId(5));
        assert_eq!(snap[1].internal_id(), TrackId(4));
    }
}
