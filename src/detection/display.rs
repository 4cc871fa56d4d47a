// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 显示/导航目标筛选
//! Which tracks a renderer or navigator should show

use serde::{Deserialize, Serialize};

use super::tracker::TrackedObject;

/// 可见: 已确认且丢失帧数小于 `max_missed`
pub fn is_visible(track: &TrackedObject, max_missed: u32) -> bool {
    track.is_promoted() && track.missed_count() < max_missed
}

/// 显示过滤条件
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayFilter {
    /// 只显示这些类别 (为空时不过滤)
    pub desired_classes: Vec<i32>,
    /// 导航类别: 只显示该类别的第一个可见目标
    pub navigation_class: Option<i32>,
    /// 丢失帧数达到该值即不再显示
    pub max_missed: u32,
}

impl DisplayFilter {
    pub fn new(max_missed: u32) -> Self {
        Self {
            max_missed,
            ..Default::default()
        }
    }

    pub fn with_desired_classes(mut self, classes: impl IntoIterator<Item = i32>) -> Self {
        self.desired_classes.extend(classes);
        self
    }

    pub fn with_navigation_class(mut self, class_id: i32) -> Self {
        self.navigation_class = Some(class_id);
        self
    }

    /// 按优先级筛选: 指定类别 > 导航目标 > 全部可见目标
    pub fn select<'a>(&self, tracks: &'a [TrackedObject]) -> Vec<&'a TrackedObject> {
        let visible = tracks.iter().filter(|t| is_visible(t, self.max_missed));

        if !self.desired_classes.is_empty() {
            return visible
                .filter(|t| self.desired_classes.contains(&t.class_id()))
                .collect();
        }

        match self.navigation_class {
            Some(_) => self.navigation_target(tracks).into_iter().collect(),
            None => visible.collect(),
        }
    }

    /// 导航目标: 导航类别中第一个可见目标
    pub fn navigation_target<'a>(&self, tracks: &'a [TrackedObject]) -> Option<&'a TrackedObject> {
        let class_id = self.navigation_class?;
        tracks
            .iter()
            .find(|t| is_visible(t, self.max_missed) && t.class_id() == class_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::tracker::TrackId;
    use crate::detection::types::{BBox, DetectedObject};

    fn track(id: u64, class_id: i32, external: Option<u32>, missed: u32) -> TrackedObject {
        let det = DetectedObject::new(class_id, "obj", 0.8, BBox::new(0.0, 0.0, 10.0, 10.0));
        let mut t = TrackedObject::from_detection(TrackId(id), &det);
        if let Some(ext) = external {
            t.promote(ext);
        }
        t.missed_count = missed;
        t
    }

    fn ids(selected: &[&TrackedObject]) -> Vec<u64> {
        selected.iter().map(|t| t.internal_id().0).collect()
    }

    fn sample() -> Vec<TrackedObject> {
        vec![
            track(0, 1, Some(0), 0),
            track(1, 2, Some(1), 3),
            track(2, 1, Some(2), 7),
            track(3, 2, Some(3), 0),
            track(4, 1, None, 0),
        ]
    }

    #[test]
    fn test_all_visible_by_default() {
        let tracks = sample();
        let filter = DisplayFilter::new(7);
        assert_eq!(ids(&filter.select(&tracks)), vec![0, 1, 3]);
    }

    #[test]
    fn test_desired_classes_take_priority() {
        let tracks = sample();
        let filter = DisplayFilter::new(7)
            .with_desired_classes([2])
            .with_navigation_class(1);
        assert_eq!(ids(&filter.select(&tracks)), vec![1, 3]);
    }

    #[test]
    fn test_navigation_selects_first_visible_of_class() {
        let tracks = sample();
        let filter = DisplayFilter::new(7).with_navigation_class(2);
        assert_eq!(ids(&filter.select(&tracks)), vec![1]);
        assert_eq!(
            filter.navigation_target(&tracks).map(|t| t.internal_id()),
            Some(TrackId(1))
        );
    }

    #[test]
    fn test_navigation_without_match_is_empty() {
        let tracks = sample();
        let filter = DisplayFilter::new(7).with_navigation_class(9);
        assert!(filter.select(&tracks).is_empty());
        assert!(filter.navigation_target(&tracks).is_none());
    }
}
