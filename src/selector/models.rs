use super::filter::FilterClause;

// 可以作为选择原子使用的媒体扩展名
pub const VIDEO_EXT_ATOMS: &[&str] = &["avi", "flv", "mkv", "mov", "mp4", "webm", "3gp"];
pub const AUDIO_EXT_ATOMS: &[&str] = &[
    "aiff", "alac", "flac", "m4a", "mka", "mp3", "ogg", "opus", "wav", "aac", "oga", "vorbis",
    "weba",
];

pub fn is_video_ext(name: &str) -> bool {
    VIDEO_EXT_ATOMS.contains(&name)
}

pub fn is_audio_ext(name: &str) -> bool {
    AUDIO_EXT_ATOMS.contains(&name)
}

// -----------------------------------------------------------------------------------------------

/// 选择原子的种类，求值时穷尽匹配
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorKind {
    /// 显式 format_id
    FormatId(String),
    /// 已知媒体扩展名（如 mp4 / m4a），选该容器下最优的记录
    Extension(String),
    Best,
    Worst,
    BestVideo,
    WorstVideo,
    BestAudio,
    WorstAudio,
    All,
    MergeAll,
}

impl SelectorKind {
    /// 原子 token 分类：保留字 > 已知扩展名 > 显式 id
    pub fn from_atom(name: &str) -> Self {
        match name {
            "best" | "b" => Self::Best,
            "worst" | "w" => Self::Worst,
            "bestvideo" | "bv" => Self::BestVideo,
            "worstvideo" | "wv" => Self::WorstVideo,
            "bestaudio" | "ba" => Self::BestAudio,
            "worstaudio" | "wa" => Self::WorstAudio,
            "all" => Self::All,
            "mergeall" => Self::MergeAll,
            _ if is_video_ext(name) || is_audio_ext(name) => Self::Extension(name.to_string()),
            _ => Self::FormatId(name.to_string()),
        }
    }
}

/// 解析后的选择表达式；每次调用构建一次，之后只读
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Single {
        kind: SelectorKind,
        filters: Vec<FilterClause>,
    },
    /// "+"：两侧在同一个原始池上各自求值，然后合并
    Merge(Box<Selector>, Box<Selector>),
    /// "/"：从左到右取第一个非空结果
    PickFirst(Vec<Selector>),
    /// ","：仅限顶层，各项独立求值后拼接
    Group(Vec<Selector>),
    /// 挂在括号子表达式上的过滤器，先收窄池再求值内部
    Filtered {
        inner: Box<Selector>,
        filters: Vec<FilterClause>,
    },
}
