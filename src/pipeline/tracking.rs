// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 跟踪线程模块
/// Tracking thread module
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{error, info, warn};

use super::{FrameDetections, TrackedFrame};
use crate::config::TrackerConfig;
use crate::detection::TrackingByMatching;

/// 跟踪线程: 接收检测结果 → 跟踪 → 发送跟踪结果
///
/// 输入通道关闭后退出, 返回处理的帧数
pub fn tracking_thread(
    rx_detections: Receiver<FrameDetections>,
    tx_tracks: Sender<TrackedFrame>,
    config: TrackerConfig,
) -> u64 {
    info!("✅ Tracking thread started");

    let mut tracker = TrackingByMatching::new(&config);
    let mut processed = 0u64;
    let mut last_frame_id: Option<u64> = None;

    while let Ok(frame) = rx_detections.recv() {
        if let Some(prev) = last_frame_id {
            if frame.frame_id <= prev {
                warn!("⚠️  帧序号乱序: {} 在 {} 之后, 丢弃", frame.frame_id, prev);
                continue;
            }
        }
        last_frame_id = Some(frame.frame_id);

        let start = Instant::now();
        let tracks = match tracker.track(&frame.detections) {
            Ok(tracks) => tracks,
            Err(e) => {
                error!("❌ [帧{}] 检测结果无效: {}", frame.frame_id, e);
                continue;
            }
        };
        let tracking_ms = start.elapsed().as_secs_f64() * 1000.0;
        processed += 1;

        let result = TrackedFrame {
            frame_id: frame.frame_id,
            tracks,
            tracking_ms,
        };
        if tx_tracks.send(result).is_err() {
            warn!("⚠️  跟踪结果接收端已关闭");
            break;
        }
    }

    info!("✅ Tracking thread exited ({} 帧, {})", processed, tracker.stats());
    processed
}

/// 跟踪线程句柄
pub struct TrackingHandle {
    pub detections: Sender<FrameDetections>,
    pub tracks: Receiver<TrackedFrame>,
    pub join: JoinHandle<u64>,
}

/// 启动跟踪线程
pub fn spawn_tracking(config: TrackerConfig, capacity: usize) -> std::io::Result<TrackingHandle> {
    let (tx_detections, rx_detections) = bounded(capacity);
    let (tx_tracks, rx_tracks) = bounded(capacity);

    let join = thread::Builder::new()
        .name("tracking".into())
        .spawn(move || tracking_thread(rx_detections, tx_tracks, config))?;

    Ok(TrackingHandle {
        detections: tx_detections,
        tracks: rx_tracks,
        join,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BBox, DetectedObject};

    fn frame(frame_id: u64, x: f32) -> FrameDetections {
        FrameDetections {
            frame_id,
            detections: vec![DetectedObject::new(
                0,
                "person",
                0.9,
                BBox::new(x, 10.0, 40.0, 80.0),
            )],
        }
    }

    #[test]
    fn test_frames_processed_in_order() {
        let handle = spawn_tracking(TrackerConfig::default(), 4).unwrap();

        for id in 1..=3 {
            handle.detections.send(frame(id, 10.0 + id as f32)).unwrap();
            let out = handle.tracks.recv().unwrap();
            assert_eq!(out.frame_id, id);
            assert_eq!(out.tracks.len(), 1);
            assert_eq!(out.tracks[0].tracked_count(), id as u32);
        }

        drop(handle.detections);
        assert_eq!(handle.join.join().unwrap(), 3);
    }

    #[test]
    fn test_stale_and_invalid_frames_skipped() {
        let handle = spawn_tracking(TrackerConfig::default(), 8).unwrap();

        handle.detections.send(frame(5, 10.0)).unwrap();
        handle.detections.send(frame(4, 10.0)).unwrap();
        let mut bad = frame(6, 10.0);
        bad.detections[0].bbox.height = -1.0;
        handle.detections.send(bad).unwrap();
        handle.detections.send(frame(7, 11.0)).unwrap();
        drop(handle.detections);

        let ids: Vec<u64> = handle.tracks.iter().map(|f| f.frame_id).collect();
        assert_eq!(ids, vec![5, 7]);
        assert_eq!(handle.join.join().unwrap(), 2);
    }
}
