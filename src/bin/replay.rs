// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 检测结果回放 (Detection Replay)
///
/// 读取离线保存的逐帧检测结果, 逐帧跟踪并输出轨迹:
/// 1. 加载跟踪器配置 (JSON)
/// 2. 逐帧 track()
/// 3. 可选: 按帧内视差写回距离
/// 4. 按显示过滤条件输出可见目标
use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use matching_tracker::detection::distance::{apply_disparity, measurement_candidates};
use matching_tracker::{
    gen_time_string, DetectedObject, DisplayFilter, TrackId, TrackedObject, TrackerConfig,
    TrackingByMatching,
};

/// 回放参数
#[derive(Parser, Debug)]
#[command(author, version, about = "离线回放检测结果并跟踪", long_about = None)]
struct Args {
    /// 逐帧检测结果 (JSON数组, 每帧 {detections, disparities})
    #[arg(short, long)]
    input: PathBuf,

    /// 跟踪器配置文件
    #[arg(short, long, default_value = "tracker.json")]
    config: PathBuf,

    /// 输出可见轨迹 (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 未指定 --output 时按时间戳生成输出文件
    #[arg(long, default_value_t = false)]
    save: bool,

    /// 只显示这些类别 (逗号分隔)
    #[arg(long, value_delimiter = ',')]
    classes: Vec<i32>,

    /// 导航类别
    #[arg(long)]
    navigate: Option<i32>,
}

/// 一帧输入
#[derive(Deserialize, Debug)]
struct ReplayFrame {
    #[serde(default)]
    detections: Vec<DetectedObject>,

    /// 外部ID → 平均视差 (像素)
    #[serde(default)]
    disparities: HashMap<u32, f32>,
}

/// 可见轨迹及其显示颜色
#[derive(Serialize)]
struct VisibleTrack<'a> {
    #[serde(flatten)]
    track: &'a TrackedObject,
    color: (u8, u8, u8),
}

/// 一帧输出
#[derive(Serialize)]
struct ReplayOutput<'a> {
    frame: usize,
    visible: Vec<VisibleTrack<'a>>,
    navigation: Option<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("🚀 回放启动");
    info!("📹 输入: {}", args.input.display());

    let config = TrackerConfig::load(&args.config);
    config.validate()?;
    config.print_summary();

    let json = fs::read_to_string(&args.input)
        .with_context(|| format!("读取检测结果失败: {}", args.input.display()))?;
    let frames: Vec<ReplayFrame> =
        serde_json::from_str(&json).context("检测结果格式错误")?;
    info!("📦 共 {} 帧", frames.len());

    let mut filter = DisplayFilter::new(config.display_max_missed)
        .with_desired_classes(args.classes.iter().copied());
    if let Some(class_id) = args.navigate {
        filter = filter.with_navigation_class(class_id);
    }

    let mut tracker = TrackingByMatching::new(&config);
    let mut history: Vec<(usize, Vec<TrackedObject>, Option<u32>)> = Vec::new();

    for (index, frame) in frames.iter().enumerate() {
        tracker
            .track(&frame.detections)
            .with_context(|| format!("第 {} 帧跟踪失败", index))?;

        // 测距: 只处理已确认且最近被检测到的目标
        let measured: Vec<(TrackId, f32)> =
            measurement_candidates(tracker.tracked_objects(), &config.stereo)
                .filter_map(|t| {
                    let ext = t.external_id()?;
                    frame.disparities.get(&ext).map(|&d| (t.internal_id(), d))
                })
                .collect();
        for (id, disparity) in measured {
            if let Some(track) = tracker.get_mut(id) {
                apply_disparity(track, disparity, &config.stereo);
            }
        }

        let tracks: Vec<TrackedObject> = tracker.tracked_objects().cloned().collect();
        let visible = filter.select(&tracks);
        for t in &visible {
            let (r, g, b) = t.color();
            debug!(
                "   🎯 ID{} {} conf={:.2} 位置=({:.0}, {:.0}) 距离={} 颜色=#{:02x}{:02x}{:02x}",
                t.external_id().unwrap_or_default(),
                t.class_name(),
                t.confidence(),
                t.center().x,
                t.center().y,
                t.smoothed_distance()
                    .map(|d| format!("{:.2}m", d))
                    .unwrap_or_else(|| "-".into()),
                r,
                g,
                b
            );
        }
        let navigation = filter
            .navigation_target(&tracks)
            .and_then(|t| t.external_id());
        let visible_ids: Vec<TrackId> = visible.iter().map(|t| t.internal_id()).collect();

        if index % 30 == 0 {
            info!("📊 [帧{}] 可见 {} | {}", index, visible_ids.len(), tracker.stats());
        }

        let kept = tracks
            .into_iter()
            .filter(|t| visible_ids.contains(&t.internal_id()))
            .collect();
        history.push((index, kept, navigation));
    }

    info!("✅ 回放完成: {}", tracker.stats());

    let output = match (&args.output, args.save) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(PathBuf::from(format!("tracks_{}.json", gen_time_string("")))),
        (None, false) => None,
    };
    if let Some(path) = output {
        let records: Vec<ReplayOutput> = history
            .iter()
            .map(|(frame, tracks, navigation)| ReplayOutput {
                frame: *frame,
                visible: tracks
                    .iter()
                    .map(|track| VisibleTrack {
                        track,
                        color: track.color(),
                    })
                    .collect(),
                navigation: *navigation,
            })
            .collect();
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(&path, json)
            .with_context(|| format!("写入输出失败: {}", path.display()))?;
        info!("💾 轨迹已保存到 {}", path.display());
    }

    Ok(())
}
