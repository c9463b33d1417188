use lazy_static::lazy_static;
use regex::Regex;

use crate::common::models::{CODEC_NONE, FormatRecord};

/// 编码家族排序策略表的版本号，调整排序时同步更新
pub const CODEC_ORDER_VERSION: &str = "2025.1";

// 家族排名表：排在前面的家族得分高。
// 冷门编码的精确排序不做保证，只保证家族间的相对顺序。
const VIDEO_CODEC_ORDER: &[&str] = &[
    "av0?1",
    r"vp0?9\.0?2",
    "vp0?9",
    "[hx]265|he?vc?",
    "[hx]264|avc",
    "vp0?8",
    "mp4v|h263",
    "theora",
];

const AUDIO_CODEC_ORDER: &[&str] = &[
    "[af]lac",
    "wav|aiff",
    "opus",
    "vorbis|ogg",
    "aac",
    "mp?4a?",
    "mp3",
    "ac-?4",
    "e-?a?c-?3",
    "ac-?3",
    "dts",
];

// 家族表之外的三档：能识别但不在表里 > 完全未知 > 明确没有该流
const RANK_OTHER: i64 = 3;
const RANK_UNKNOWN: i64 = 2;
const RANK_NONE: i64 = 1;

/// 家族排名之下、用于同家族内细分的档次值；缺失时取该值
pub const PROFILE_UNKNOWN: f64 = -1.0;

lazy_static! {
    static ref VIDEO_FAMILY_RES: Vec<Regex> = compile_order(VIDEO_CODEC_ORDER);
    static ref AUDIO_FAMILY_RES: Vec<Regex> = compile_order(AUDIO_CODEC_ORDER);
    static ref PROFILE_RE: Regex = Regex::new(r"\.0*(\d+)").unwrap();
}

fn compile_order(order: &[&str]) -> Vec<Regex> {
    order
        .iter()
        .map(|pat| Regex::new(&format!("^(?:{})", pat)).unwrap())
        .collect()
}

fn rank_in(res: &[Regex], codec: Option<&str>) -> (i64, f64) {
    let raw = match codec {
        None => return (RANK_UNKNOWN, PROFILE_UNKNOWN),
        Some(c) => c.trim().to_ascii_lowercase(),
    };
    if raw == CODEC_NONE {
        return (RANK_NONE, PROFILE_UNKNOWN);
    }
    for (i, re) in res.iter().enumerate() {
        if let Some(m) = re.find(&raw) {
            // 家族内再按后缀档次细分；家族排名始终优先
            let profile = PROFILE_RE
                .captures(&raw[m.end()..])
                .and_then(|c| c.get(1))
                .and_then(|g| g.as_str().parse::<f64>().ok())
                .unwrap_or(PROFILE_UNKNOWN);
            let rank = RANK_OTHER + (res.len() - i) as i64;
            return (rank, profile);
        }
    }
    (RANK_OTHER, PROFILE_UNKNOWN)
}

/// 视频编码 -> (家族排名, 档次)，数值越大越好
pub fn video_codec_rank(vcodec: Option<&str>) -> (i64, f64) {
    rank_in(&VIDEO_FAMILY_RES, vcodec)
}

/// 音频编码 -> (家族排名, 档次)，数值越大越好
pub fn audio_codec_rank(acodec: Option<&str>) -> (i64, f64) {
    rank_in(&AUDIO_FAMILY_RES, acodec)
}

// -----------------------------------------------------------------------------------------------

/// `vcodec:vp9.2` 这类排序参数解析后的查询条件
#[derive(Debug, Clone)]
pub struct CodecQuery {
    raw: String,
    family: i64,
    is_video: bool,
}

impl CodecQuery {
    pub fn video(raw: &str) -> Self {
        let (family, _) = video_codec_rank(Some(raw));
        Self {
            raw: raw.to_ascii_lowercase(),
            family,
            is_video: true,
        }
    }

    pub fn audio(raw: &str) -> Self {
        let (family, _) = audio_codec_rank(Some(raw));
        Self {
            raw: raw.to_ascii_lowercase(),
            family,
            is_video: false,
        }
    }

    /// 从记录里取出对应的编码字段做匹配
    pub fn matches_record(&self, record: &FormatRecord) -> bool {
        if self.is_video {
            self.matches(record.vcodec.as_deref())
        } else {
            self.matches(record.acodec.as_deref())
        }
    }

    /// 记录的编码是否命中本查询：家族可识别时按家族比较，否则退化为前缀匹配
    pub fn matches(&self, codec: Option<&str>) -> bool {
        let Some(actual) = codec else {
            return false;
        };
        if self.family > RANK_OTHER {
            let (family, _) = if self.is_video {
                video_codec_rank(Some(actual))
            } else {
                audio_codec_rank(Some(actual))
            };
            family == self.family
        } else {
            actual.to_ascii_lowercase().starts_with(&self.raw)
        }
    }
}
