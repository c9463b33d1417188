use lazy_static::lazy_static;
use std::collections::HashSet;
use tracing::debug;

use crate::common::models::{FormatRecord, SelectedFormat};

/// 合并计划配置：只影响合成记录的元数据，永远不会失败
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// 调用方指定的输出容器偏好，形如 "mp4" 或 "mp4/mkv"
    pub output_format: Option<String>,
    pub prefer_free_formats: bool,
}

lazy_static! {
    // 容器与编码的兼容表；不在表里的组合走扩展名家族或 mkv 兜底
    static ref MP4_CODECS: HashSet<&'static str> = HashSet::from([
        "av1", "hevc", "avc1", "mp4a", "ac-4", // fourcc（m3u8 / mpd）
        "h264", "aacl", "ec-3", // ISM 清单里的写法
    ]);
    static ref WEBM_CODECS: HashSet<&'static str> =
        HashSet::from(["av1", "vp9", "vp8", "opus", "vrbs", "vp9x", "vp8x"]);
    static ref MP4_FAMILY: HashSet<&'static str> = HashSet::from([
        "mp3", "mp4", "m4a", "m4p", "m4b", "m4r", "m4v", "ismv", "isma", "mov",
    ]);
    static ref WEBM_FAMILY: HashSet<&'static str> = HashSet::from(["webm", "weba"]);
}

/// 合并两个选择结果，合成一条组合记录
pub fn merge_pair(
    left: &SelectedFormat,
    right: &SelectedFormat,
    options: &MergeOptions,
) -> SelectedFormat {
    let mut components: Vec<FormatRecord> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    for record in left.components().iter().chain(right.components()) {
        if record.is_storyboard() {
            continue;
        }
        if seen_ids.insert(record.format_id.clone()) {
            components.push(record.clone());
        }
    }

    if components.len() == 1 {
        return SelectedFormat::single(components.pop().unwrap());
    }

    let video_fmts: Vec<&FormatRecord> = components.iter().filter(|f| f.has_video()).collect();
    let audio_fmts: Vec<&FormatRecord> = components.iter().filter(|f| f.has_audio()).collect();

    let format_id = components
        .iter()
        .map(|f| f.format_id.as_str())
        .collect::<Vec<_>>()
        .join("+");
    let ext = compatible_ext(&video_fmts, &audio_fmts, options);
    debug!("合成组合格式 {} -> 容器 {}", format_id, ext);

    let protocols: Vec<&str> = components.iter().filter_map(|f| f.protocol.as_deref()).collect();
    let mut languages: Vec<&str> = Vec::new();
    for lang in components.iter().filter_map(|f| f.language.as_deref()) {
        if !languages.contains(&lang) {
            languages.push(lang);
        }
    }

    // 总码率按各来源的首个可用码率累加，大小同理（缺失的来源不计入）
    let tbr = sum_present(components.iter().map(|f| f.tbr.or(f.vbr).or(f.abr)));
    let filesize_approx = sum_present(
        components
            .iter()
            .map(|f| f.filesize.or(f.filesize_approx).map(|v| v as f64)),
    )
    .map(|v| v as u64);

    let mut record = FormatRecord {
        format_id,
        ext: Some(ext),
        tbr,
        filesize_approx,
        protocol: if protocols.is_empty() {
            None
        } else {
            Some(protocols.join("+"))
        },
        language: if languages.is_empty() {
            None
        } else {
            Some(languages.join("+"))
        },
        ..Default::default()
    };

    // 只有唯一的视频/音频来源时，组合记录继承它的流参数
    if let [only_video] = video_fmts.as_slice() {
        record.width = only_video.width;
        record.height = only_video.height;
        record.fps = only_video.fps;
        record.vcodec = only_video.vcodec.clone();
        record.vbr = only_video.vbr;
    }
    if let [only_audio] = audio_fmts.as_slice() {
        record.acodec = only_audio.acodec.clone();
        record.abr = only_audio.abr;
        record.asr = only_audio.asr;
        record.audio_channels = only_audio.audio_channels;
    }

    SelectedFormat {
        record,
        requested_formats: components,
    }
}

/// N 路合并：把一组选择按给定顺序折叠成一个组合
pub fn merge_all(selections: Vec<SelectedFormat>, options: &MergeOptions) -> Option<SelectedFormat> {
    let mut iter = selections.into_iter();
    let mut merged = iter.next()?;
    for next in iter {
        merged = merge_pair(&merged, &next, options);
    }
    Some(merged)
}

fn sum_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum())
    }
}

// 取首个编码并归一化：截掉点号后缀、去零、转小写（"vp09" 与 "vp9" 等同）
fn sanitize_codec(fmts: &[&FormatRecord], video: bool) -> Option<String> {
    let first = fmts.first()?;
    let codec = if video {
        first.vcodec.as_deref()?
    } else {
        first.acodec.as_deref()?
    };
    let head = codec.split('.').next().unwrap_or(codec);
    Some(head.replace('0', "").to_ascii_lowercase())
}

/// 为组合结果挑选容器扩展名
fn compatible_ext(
    video_fmts: &[&FormatRecord],
    audio_fmts: &[&FormatRecord],
    options: &MergeOptions,
) -> String {
    let preferences: Vec<String> = match &options.output_format {
        Some(wanted) => wanted.split('/').map(|s| s.trim().to_ascii_lowercase()).collect(),
        None if options.prefer_free_formats => vec!["webm".to_string(), "mkv".to_string()],
        None => Vec::new(),
    };
    let allow_mkv = preferences.is_empty() || preferences.iter().any(|p| p == "mkv");

    // 多路视频或多路音频只有 mkv 能装
    if allow_mkv && (video_fmts.len() > 1 || audio_fmts.len() > 1) {
        return "mkv".to_string();
    }

    let vcodec = sanitize_codec(video_fmts, true);
    let acodec = sanitize_codec(audio_fmts, false);

    let codec_candidates: Vec<String> = if preferences.is_empty() {
        vec!["mp4".to_string(), "webm".to_string()]
    } else {
        preferences.clone()
    };
    if let (Some(vc), Some(ac)) = (&vcodec, &acodec) {
        for ext in &codec_candidates {
            if ext == "mkv" {
                return ext.clone();
            }
            let table: Option<&HashSet<&str>> = match ext.as_str() {
                "mp4" => Some(&*MP4_CODECS),
                "webm" => Some(&*WEBM_CODECS),
                _ => None,
            };
            if let Some(table) = table {
                if table.contains(vc.as_str()) && table.contains(ac.as_str()) {
                    return ext.clone();
                }
            }
        }
    }

    // 编码表不认识就看扩展名是否同属一个容器家族
    let vexts: Vec<&str> = video_fmts.iter().map(|f| f.ext.as_deref().unwrap_or("")).collect();
    let aexts: Vec<&str> = audio_fmts.iter().map(|f| f.ext.as_deref().unwrap_or("")).collect();
    let ext_candidates: Vec<String> = if preferences.is_empty() {
        vexts.iter().map(|e| e.to_string()).collect()
    } else {
        preferences.clone()
    };
    for ext in &ext_candidates {
        if ext == "mkv" {
            return ext.clone();
        }
        let mut current: HashSet<&str> = HashSet::new();
        current.insert(ext.as_str());
        current.extend(vexts.iter().copied());
        current.extend(aexts.iter().copied());
        let single = current.len() == 1;
        if single || current.is_subset(&MP4_FAMILY) || current.is_subset(&WEBM_FAMILY) {
            return ext.clone();
        }
    }

    if allow_mkv {
        "mkv".to_string()
    } else {
        preferences.last().cloned().unwrap_or_else(|| "mkv".to_string())
    }
}
