use serde::Serialize;
use serde_derive::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// 编码流缺失时使用的哨兵值，区别于"未知"（None）
pub const CODEC_NONE: &str = "none";

// -----------------------------------------------------------------------------------------------

/// 一个可下载的媒体变体，由站点解析器发现并交给选择器
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FormatRecord {
    pub format_id: String, // 目录内唯一；合成结果形如 "137+140"
    pub ext: Option<String>,
    pub vcodec: Option<String>, // "none" 表示没有视频流
    pub acodec: Option<String>, // "none" 表示没有音频流

    // 数值字段：缺失不等于零
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub tbr: Option<f64>, // 总码率 kbps
    pub vbr: Option<f64>,
    pub abr: Option<f64>,
    pub asr: Option<u32>, // 音频采样率
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
    pub audio_channels: Option<u32>,

    // 排序提示：越大越好；缺失比任何已知值都差
    pub quality: Option<f64>,
    pub preference: Option<i32>,
    pub language: Option<String>,
    pub language_preference: Option<i32>,
    pub source_preference: Option<i32>,

    // 传输信息，不参与排序决策
    pub protocol: Option<String>,
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
}

impl FormatRecord {
    /// 是否携带视频流（编码未知时按携带处理）
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some(CODEC_NONE)
    }

    /// 是否携带音频流（编码未知时按携带处理）
    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref() != Some(CODEC_NONE)
    }

    pub fn is_video_only(&self) -> bool {
        self.has_video() && !self.has_audio()
    }

    pub fn is_audio_only(&self) -> bool {
        self.has_audio() && !self.has_video()
    }

    /// 同时携带音视频流的完整格式
    pub fn is_combined(&self) -> bool {
        self.has_video() && self.has_audio()
    }

    /// 两个流都不存在（比如故事板），不允许被 best/worst 返回
    pub fn is_storyboard(&self) -> bool {
        !self.has_video() && !self.has_audio()
    }

    /// 视频流的容器扩展名；没有视频流时返回 "none"
    pub fn video_ext(&self) -> &str {
        if self.has_video() {
            self.ext.as_deref().unwrap_or("")
        } else {
            CODEC_NONE
        }
    }

    /// 音频流的容器扩展名；ext 归属视频流，只有纯音频格式才继承它
    pub fn audio_ext(&self) -> &str {
        if !self.has_video() && self.has_audio() {
            self.ext.as_deref().unwrap_or("")
        } else {
            CODEC_NONE
        }
    }
}

impl fmt::Display for FormatRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_id)?;
        if let Some(ext) = &self.ext {
            write!(f, " ({})", ext)?;
        }
        match (self.width, self.height) {
            (Some(w), Some(h)) => write!(f, " {}x{}", w, h)?,
            (_, Some(h)) => write!(f, " {}p", h)?,
            _ => {}
        }
        if let Some(tbr) = self.tbr {
            write!(f, " @{:.0}k", tbr)?;
        }
        let vc = self.vcodec.as_deref().unwrap_or("?");
        let ac = self.acodec.as_deref().unwrap_or("?");
        write!(f, " [{}+{}]", vc, ac)
    }
}

// -----------------------------------------------------------------------------------------------

/// 选择结果：单个格式，或由多个来源格式合成的组合
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedFormat {
    pub record: FormatRecord,
    /// 组合结果的各个来源格式；单个格式时为空
    #[serde(default)]
    pub requested_formats: Vec<FormatRecord>,
}

impl SelectedFormat {
    pub fn single(record: FormatRecord) -> Self {
        Self {
            record,
            requested_formats: Vec::new(),
        }
    }

    pub fn is_composite(&self) -> bool {
        !self.requested_formats.is_empty()
    }

    /// 实际需要下载的来源格式列表
    pub fn components(&self) -> &[FormatRecord] {
        if self.requested_formats.is_empty() {
            std::slice::from_ref(&self.record)
        } else {
            &self.requested_formats
        }
    }
}

impl fmt::Display for SelectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.record.fmt(f)
    }
}
